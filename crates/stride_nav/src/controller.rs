//! Per-agent navigation controller
//!
//! One [`NavController`] drives one agent. Each call to
//! [`NavController::tick`] consumes the world snapshot for that tick and
//! returns the steering command for it; the caller hands the command to a
//! [`MotionActuator`].

use serde::Serialize;
use std::collections::HashSet;

use stride_math::Vec2;

use crate::blender::{SteeringBlender, Steer};
use crate::config::NavConfig;
use crate::error::Result;
use crate::goal::{Goal, NavStatus};
use crate::mode::{Mode, ModeChange, ModeKind, ModeMachine};
use crate::obstacle::{ObstacleId, ObstacleRegistry, ObstacleSample, ObstacleView, Roster};
use crate::policy::{AvoidancePolicy, AvoidanceRule, PolicyContext};
use crate::tracker::ObstacleTracker;
use crate::vision::VisionDetection;

/// Everything the world reports for one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Agent position on the plane
    pub position: Vec2,
    /// Agent height, if the world has one
    pub z: Option<f32>,
    pub obstacles: Vec<ObstacleSample>,
    pub detections: Vec<VisionDetection>,
    /// Set on the first tick of an episode; clears tracking and mode state
    pub first_tick: bool,
}

impl Snapshot {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_obstacle(mut self, id: ObstacleId, position: Vec2) -> Self {
        self.obstacles.push(ObstacleSample::new(id, position));
        self
    }

    pub fn with_detection(mut self, detection: VisionDetection) -> Self {
        self.detections.push(detection);
        self
    }

    pub fn first_tick(mut self) -> Self {
        self.first_tick = true;
        self
    }
}

/// Controller output for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SteeringCommand {
    /// Unit direction or zero
    pub direction: Vec2,
    /// Heading after this tick
    pub yaw: f32,
    pub status: NavStatus,
    /// Mode active when the command was produced
    pub mode: ModeKind,
    /// Avoidance rule applied, if any
    pub rule: Option<AvoidanceRule>,
    /// `direction * speed`
    pub displacement: Vec2,
    /// Mode change that happened this tick
    pub transition: Option<ModeChange>,
}

impl SteeringCommand {
    pub fn is_arrived(&self) -> bool {
        self.status == NavStatus::Arrived
    }
}

/// Applies steering commands to the world
pub trait MotionActuator {
    fn apply(&mut self, command: &SteeringCommand);
}

/// Persistent state of the controlled agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentState {
    /// Position reported by the last snapshot
    pub position: Vec2,
    pub z: Option<f32>,
    /// Heading in `(-PI, PI]`
    pub yaw: f32,
    pub mode: Mode,
    pub status: NavStatus,
    /// Ticks processed so far
    pub ticks: u64,
}

impl AgentState {
    fn new(yaw: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            z: None,
            yaw: stride_math::wrap_angle(yaw),
            mode: Mode::Seeking,
            status: NavStatus::Moving,
            ticks: 0,
        }
    }
}

/// Reactive navigation controller for one agent
#[derive(Debug)]
pub struct NavController {
    config: NavConfig,
    goal: Goal,
    roster: Roster,
    tracker: ObstacleTracker,
    modes: ModeMachine,
    policy: AvoidancePolicy,
    blender: SteeringBlender,
    state: AgentState,
    /// Unknown ids already reported
    unknown: HashSet<ObstacleId>,
}

impl NavController {
    /// Validate `config` and resolve its obstacles against `registry`
    pub fn new<R>(config: NavConfig, target: Vec2, registry: &R) -> Result<Self>
    where
        R: ObstacleRegistry + ?Sized,
    {
        config.validate()?;
        let roster = Roster::resolve(&config.obstacles, config.avoid_radius, registry)?;
        Self::with_roster(config, target, roster)
    }

    /// Build with an already resolved roster
    pub fn with_roster(config: NavConfig, target: Vec2, roster: Roster) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "Navigating to ({:.3}, {:.3}) with {} tracked obstacles",
            target.x,
            target.y,
            roster.len()
        );
        Ok(Self {
            goal: Goal::new(target, config.goal_eps),
            modes: ModeMachine::new(&config),
            policy: AvoidancePolicy::new(&config),
            blender: SteeringBlender::from_config(&config),
            tracker: ObstacleTracker::new(),
            state: AgentState::new(0.0),
            unknown: HashSet::new(),
            roster,
            config,
        })
    }

    /// Start from a heading other than zero
    pub fn with_initial_yaw(mut self, yaw: f32) -> Self {
        self.state.yaw = stride_math::wrap_angle(yaw);
        self
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn tracker(&self) -> &ObstacleTracker {
        &self.tracker
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Process one snapshot
    pub fn tick(&mut self, snapshot: &Snapshot) -> SteeringCommand {
        if snapshot.first_tick {
            self.tracker.reset();
            self.modes.reset();
        }

        let position = snapshot.position;
        self.state.position = position;
        self.state.z = snapshot.z;
        self.state.ticks += 1;

        for sample in &snapshot.obstacles {
            if self.roster.get(sample.id).is_some() {
                self.tracker.update(sample.id, sample.position);
            } else if self.unknown.insert(sample.id) {
                log::warn!("Ignoring samples of unregistered obstacle {}", sample.id);
            }
        }

        if self.goal.is_reached(position) {
            if self.state.status != NavStatus::Arrived {
                log::info!(
                    "Destination reached at ({:.3}, {:.3}) after {} ticks",
                    position.x,
                    position.y,
                    self.state.ticks
                );
            }
            self.state.status = NavStatus::Arrived;
            return SteeringCommand {
                direction: Vec2::ZERO,
                yaw: self.state.yaw,
                status: NavStatus::Arrived,
                mode: self.modes.kind(),
                rule: None,
                displacement: Vec2::ZERO,
                transition: None,
            };
        }
        self.state.status = NavStatus::Moving;

        let heading = self.goal.toward(position);
        let views = self.views(position);

        let facts = self.modes.facts(position, &views, &self.tracker);
        let transition = self.modes.evaluate(&facts);

        let steer = match self.modes.mode() {
            Mode::Seeking => {
                let ctx = PolicyContext {
                    agent: position,
                    yaw: self.state.yaw,
                    goal_direction: heading.direction,
                    obstacles: &views,
                    detections: &snapshot.detections,
                };
                self.policy.select(&ctx).map_or(Steer::Goal, Steer::Avoid)
            }
            Mode::FocusCross(focus) => Steer::Direct(focus.dodge),
            Mode::Flee { .. } => Steer::Direct(
                facts
                    .focus_position
                    .map_or(Vec2::ZERO, |obstacle| position - obstacle),
            ),
            Mode::Paused { .. } => {
                self.modes.consume_pause_tick();
                Steer::Hold
            }
        };

        let rule = match &steer {
            Steer::Avoid(avoidance) => {
                log::debug!(
                    "Tick {}: {} against {:?}",
                    self.state.ticks,
                    avoidance.rule,
                    avoidance.obstacle
                );
                Some(avoidance.rule)
            }
            _ => None,
        };

        let blend = self.blender.blend(&steer, heading.direction, self.state.yaw);
        self.state.yaw = blend.yaw;
        self.state.mode = self.modes.mode();

        SteeringCommand {
            direction: blend.direction,
            yaw: blend.yaw,
            status: NavStatus::Moving,
            mode: self.modes.kind(),
            rule,
            displacement: blend.direction * self.config.speed,
            transition,
        }
    }

    /// Roster obstacles with a known position, seen from `agent`
    fn views(&self, agent: Vec2) -> Vec<ObstacleView> {
        self.roster
            .iter()
            .filter_map(|entry| {
                let position = self.tracker.position(entry.id)?;
                Some(ObstacleView {
                    id: entry.id,
                    class: entry.class,
                    position,
                    velocity: self.tracker.velocity(entry.id),
                    distance: agent.distance(position),
                    avoid_radius: entry.avoid_radius,
                })
            })
            .collect()
    }
}
