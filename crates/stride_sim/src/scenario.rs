//! Scenario presets
//!
//! Each scenario pairs a navigation preset with the obstacle layout it was
//! tuned against. The agent walks from `start` toward `goal`; obstacles move
//! according to their scripted movers.

use serde::{Deserialize, Serialize};

use stride_math::Vec2;
use stride_nav::config::NavConfig;
use stride_nav::obstacle::{ObstacleClass, ObstacleSpec};

use crate::camera::PinholeCamera;
use crate::error::{Result, SimError};
use crate::mover::{Axis, Mover};

/// Default tick limit of a run
pub const DEFAULT_MAX_TICKS: u64 = 3000;

/// Agent height used by every preset
const AGENT_HEIGHT: f32 = 1.27;

/// Names accepted by [`Scenario::by_name`]
pub const SCENARIOS: &[&str] = &[
    "crossing_pass",
    "head_on_perpendicular",
    "head_on_strong",
    "overtake",
    "velocity_dodge",
    "wait",
    "hybrid",
    "dual_flow",
    "dual_flow_biased",
    "crossing_focus",
    "vision_sidestep",
];

/// Where an obstacle starts and how it moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSetup {
    pub name: String,
    pub position: Vec2,
    pub mover: Mover,
}

impl ObstacleSetup {
    pub fn new(name: impl Into<String>, position: Vec2, mover: Mover) -> Self {
        Self {
            name: name.into(),
            position,
            mover,
        }
    }
}

/// A complete simulated episode
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub nav: NavConfig,
    pub start: Vec2,
    pub z: f32,
    pub initial_yaw: f32,
    pub goal: Vec2,
    pub obstacles: Vec<ObstacleSetup>,
    pub camera: Option<PinholeCamera>,
    pub max_ticks: u64,
}

impl Scenario {
    fn new(name: &str, description: &str, nav: NavConfig, goal: Vec2) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            nav,
            start: Vec2::ZERO,
            z: AGENT_HEIGHT,
            initial_yaw: 0.0,
            goal,
            obstacles: Vec::new(),
            camera: None,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }

    fn with(mut self, name: &str, position: Vec2, mover: Mover) -> Self {
        self.obstacles.push(ObstacleSetup::new(name, position, mover));
        self
    }

    /// Look up a preset by name
    pub fn by_name(name: &str) -> Result<Self> {
        let scenario = match name {
            "crossing_pass" => Self::crossing_pass(),
            "head_on_perpendicular" => Self::head_on_perpendicular(),
            "head_on_strong" => Self::head_on_strong(),
            "overtake" => Self::overtake(),
            "velocity_dodge" => Self::velocity_dodge(),
            "wait" => Self::wait(),
            "hybrid" => Self::hybrid(),
            "dual_flow" => Self::dual_flow(),
            "dual_flow_biased" => Self::dual_flow_biased(),
            "crossing_focus" => Self::crossing_focus(),
            "vision_sidestep" => Self::vision_sidestep(),
            _ => return Err(SimError::UnknownScenario(name.to_string())),
        };
        Ok(scenario)
    }

    /// One walker crossing the path from above at twice the agent's speed
    pub fn crossing_pass() -> Self {
        let nav = NavConfig::default().with_obstacle(ObstacleSpec::new("Ped1", ObstacleClass::Crossing));
        Self::new(
            "crossing_pass",
            "Walker crosses from (0, 1) to (0, -1) while the agent heads for (-2, 0)",
            nav,
            Vec2::new(-2.0, 0.0),
        )
        .with("Ped1", Vec2::new(0.0, 1.0), Mover::move_to(Axis::Y, -1.0, 0.04))
    }

    pub fn head_on_perpendicular() -> Self {
        Self::new(
            "head_on_perpendicular",
            "Side-step a walker crossing two meters to the left",
            NavConfig::head_on_perpendicular(),
            Vec2::new(-2.0, 0.0),
        )
        .with("Ped1", Vec2::new(-1.0, -0.5), Mover::move_to(Axis::Y, 1.5, 0.01))
    }

    pub fn head_on_strong() -> Self {
        Self::new(
            "head_on_strong",
            "Strong perpendicular dodge against a walker coming straight at the agent",
            NavConfig::head_on_strong(),
            Vec2::new(-2.0, 0.0),
        )
        .with("Ped1", Vec2::new(-3.0, 0.05), Mover::move_to(Axis::X, 1.0, 0.015))
    }

    pub fn overtake() -> Self {
        Self::new(
            "overtake",
            "Pass a slower walker heading the same way",
            NavConfig::overtake(),
            Vec2::new(-2.0, 0.0),
        )
        .with(
            "Ped1",
            Vec2::new(-0.4, 0.0),
            Mover::Constant {
                velocity: Vec2::new(-0.01, 0.0),
            },
        )
    }

    fn diagonal_walker(name: &str, description: &str, nav: NavConfig) -> Self {
        Self::new(name, description, nav, Vec2::new(-4.0, 0.0)).with(
            "Ped1",
            Vec2::new(-0.5, -1.0),
            Mover::Constant {
                velocity: Vec2::new(-0.015, 0.015),
            },
        )
    }

    pub fn velocity_dodge() -> Self {
        Self::diagonal_walker(
            "velocity_dodge",
            "Dodge against the velocity of a diagonal walker",
            NavConfig::velocity_dodge(),
        )
    }

    pub fn wait() -> Self {
        Self::diagonal_walker(
            "wait",
            "Stand still while a diagonal walker is close",
            NavConfig::wait(),
        )
    }

    pub fn hybrid() -> Self {
        Self::diagonal_walker(
            "hybrid",
            "Pause for fast walkers, dodge slow ones",
            NavConfig::hybrid(),
        )
    }

    fn two_lanes(name: &str, description: &str, nav: NavConfig) -> Self {
        Self::new(name, description, nav, Vec2::new(-2.0, 0.0))
            .with("Ped1", Vec2::new(-0.6, -2.0), Mover::bounce(Axis::Y, -2.0, 2.0, 0.03, 1.0))
            .with("Ped2", Vec2::new(-1.2, 2.0), Mover::bounce(Axis::Y, -2.0, 2.0, 0.03, -1.0))
            .with("Ped3", Vec2::new(-1.0, 0.25), Mover::Stationary)
    }

    pub fn dual_flow() -> Self {
        Self::two_lanes(
            "dual_flow",
            "Two opposite crossing lanes and a standing pedestrian",
            NavConfig::dual_flow(),
        )
    }

    pub fn dual_flow_biased() -> Self {
        Self::two_lanes(
            "dual_flow_biased",
            "Two crossing lanes with the flow dodge rotated by 30 degrees",
            NavConfig::dual_flow_biased(30.0),
        )
    }

    pub fn crossing_focus() -> Self {
        Self::new(
            "crossing_focus",
            "Head-on, crossing and overtaking walkers at once",
            NavConfig::crossing_focus(),
            Vec2::new(-2.0, 0.0),
        )
        .with(
            "Ped1",
            Vec2::new(-3.5, 0.1),
            Mover::Loop {
                axis: Axis::X,
                min: -4.0,
                max: 2.0,
                velocity: 0.015,
            },
        )
        .with("Ped2", Vec2::new(-0.8, -1.5), Mover::bounce(Axis::Y, -1.5, 1.5, 0.025, 1.0))
        .with(
            "Ped3",
            Vec2::new(-0.3, -0.05),
            Mover::Loop {
                axis: Axis::X,
                min: -4.0,
                max: 0.0,
                velocity: -0.01,
            },
        )
    }

    /// Camera-driven sidestep around a standing pedestrian
    pub fn vision_sidestep() -> Self {
        let mut scenario = Self::new(
            "vision_sidestep",
            "Turn toward a far goal and sidestep a pedestrian seen by the camera",
            NavConfig::vision_sidestep(),
            Vec2::new(2.0, -10.0),
        )
        .with("Ped1", Vec2::new(2.9, -6.0), Mover::Stationary);
        scenario.camera = Some(PinholeCamera::default());
        scenario
    }
}
