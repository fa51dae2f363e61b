//! Navigation configuration
//!
//! A [`NavConfig`] is fixed when the controller is built. Named presets carry
//! values tuned for common encounters; every value can still be overridden
//! through the `with_*` builders or a deserialized file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{NavError, Result};
use crate::obstacle::{ObstacleClass, ObstacleSpec};

/// Tolerance when checking that a weight pair sums to one
const WEIGHT_TOLERANCE: f32 = 1e-4;

/// Goal/avoidance blend weights; always sums to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub goal: f32,
    pub avoid: f32,
}

impl BlendWeights {
    /// 50/50
    pub const EVEN: Self = Self { goal: 0.5, avoid: 0.5 };
    /// Ignore the goal entirely
    pub const AVOID_ONLY: Self = Self { goal: 0.0, avoid: 1.0 };

    /// Weights given by the avoidance share
    pub fn avoid(avoid: f32) -> Self {
        Self {
            goal: 1.0 - avoid,
            avoid,
        }
    }

    /// Scale an arbitrary pair so it sums to one
    pub fn normalized(goal: f32, avoid: f32) -> Self {
        let total = goal + avoid;
        if total <= 0.0 {
            return Self::EVEN;
        }
        Self {
            goal: goal / total,
            avoid: avoid / total,
        }
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.goal)
            && (0.0..=1.0).contains(&self.avoid)
            && (self.goal + self.avoid - 1.0).abs() <= WEIGHT_TOLERANCE
    }
}

/// Where a rotation bias is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasStage {
    /// Rotate the avoidance vector, then blend
    BeforeBlend,
    /// Blend, then rotate the result
    AfterBlend,
}

/// Fixed rotation skewing a dodge consistently to one side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationBias {
    /// Counter-clockwise angle in degrees
    pub degrees: f32,
    pub stage: BiasStage,
}

impl RotationBias {
    pub fn before_blend(degrees: f32) -> Self {
        Self {
            degrees,
            stage: BiasStage::BeforeBlend,
        }
    }

    pub fn radians(&self) -> f32 {
        stride_math::radians(self.degrees)
    }
}

/// Lateral direction used when overtaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateralBias {
    PositiveY,
    NegativeY,
    /// +Y when the obstacle is below the agent, -Y otherwise
    AwayFromObstacle,
}

/// Static obstacle repulsion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticRepulsion {
    pub weights: BlendWeights,
}

impl Default for StaticRepulsion {
    fn default() -> Self {
        Self {
            weights: BlendWeights::EVEN,
        }
    }
}

/// Two dynamic obstacles handled as one flow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualFlow {
    pub weights: BlendWeights,
    /// Unit-velocity dot product below which the pair counts as opposed
    pub opposed_dot: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<RotationBias>,
}

impl Default for DualFlow {
    fn default() -> Self {
        Self {
            weights: BlendWeights::EVEN,
            opposed_dot: -0.5,
            bias: None,
        }
    }
}

/// Lateral bias past a slower obstacle ahead
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overtake {
    pub weights: BlendWeights,
    pub side: LateralBias,
}

impl Default for Overtake {
    fn default() -> Self {
        Self {
            weights: BlendWeights { goal: 0.4, avoid: 0.6 },
            side: LateralBias::AwayFromObstacle,
        }
    }
}

/// Dodge perpendicular to the agent-obstacle line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerpendicularDodge {
    pub weights: BlendWeights,
}

impl Default for PerpendicularDodge {
    fn default() -> Self {
        Self {
            weights: BlendWeights::avoid(0.55),
        }
    }
}

/// Dodge against the obstacle's estimated velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityDodge {
    pub weights: BlendWeights,
    /// Per-tick displacement below which the obstacle counts as standing
    pub min_speed: f32,
}

impl Default for VelocityDodge {
    fn default() -> Self {
        Self {
            weights: BlendWeights { goal: 0.3, avoid: 0.7 },
            min_speed: 1e-6,
        }
    }
}

/// Sidestep driven by image-plane detections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionSidestep {
    pub weights: BlendWeights,
    /// Image width in pixels
    pub image_width: u32,
    /// Half width of the central danger band in pixels
    pub band_half_width: f32,
    /// Detections deeper than this are ignored (meters)
    pub max_depth: f32,
}

impl Default for VisionSidestep {
    fn default() -> Self {
        Self {
            // forward 0.1 + lateral 0.05 per tick
            weights: BlendWeights::normalized(0.1, 0.05),
            image_width: 320,
            band_half_width: 80.0,
            max_depth: 1.5,
        }
    }
}

/// Avoidance rules in priority order; `None` disables a rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySet {
    pub static_repulsion: Option<StaticRepulsion>,
    pub dual_flow: Option<DualFlow>,
    pub overtake: Option<Overtake>,
    pub perpendicular_dodge: Option<PerpendicularDodge>,
    pub velocity_dodge: Option<VelocityDodge>,
    pub vision: Option<VisionSidestep>,
}

/// Committed lateral dodge against crossing obstacles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossingFocus {
    /// Distance at which a crossing obstacle captures the agent
    pub cross_radius: f32,
    /// Lateral displacement that ends the dodge and starts the flee
    pub lateral_threshold: f32,
}

impl Default for CrossingFocus {
    fn default() -> Self {
        Self {
            cross_radius: 0.6,
            lateral_threshold: 0.07,
        }
    }
}

/// What makes the agent stop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PauseTrigger {
    /// An obstacle inside its radius moves faster than `speed` per tick
    FastMotion { speed: f32 },
    /// Any obstacle inside its radius
    Proximity,
}

/// Stop-and-wait behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseConfig {
    pub trigger: PauseTrigger,
    /// Ticks spent standing still, entry tick included
    pub stop_duration: u32,
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            trigger: PauseTrigger::FastMotion { speed: 0.02 },
            stop_duration: 15,
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Distance travelled per tick
    pub speed: f32,
    /// Arrival tolerance
    pub goal_eps: f32,
    /// Default react radius
    pub avoid_radius: f32,
    /// Radius of the overtake rule
    pub overtake_radius: f32,
    /// Maximum heading change per tick (radians); `None` snaps to the direction
    pub turn_speed: Option<f32>,
    /// Obstacles to resolve against the world
    pub obstacles: Vec<ObstacleSpec>,
    pub policies: PolicySet,
    pub crossing: Option<CrossingFocus>,
    pub pause: Option<PauseConfig>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            speed: 0.02,
            goal_eps: 0.05,
            avoid_radius: 0.5,
            overtake_radius: 0.35,
            turn_speed: None,
            obstacles: Vec::new(),
            policies: PolicySet {
                static_repulsion: Some(StaticRepulsion::default()),
                perpendicular_dodge: Some(PerpendicularDodge::default()),
                ..Default::default()
            },
            crossing: None,
            pause: None,
        }
    }
}

impl NavConfig {
    /// Side-step a single pedestrian walking across the path
    pub fn head_on_perpendicular() -> Self {
        Self {
            avoid_radius: 0.25,
            obstacles: vec![ObstacleSpec::new("Ped1", ObstacleClass::Crossing)],
            policies: PolicySet {
                perpendicular_dodge: Some(PerpendicularDodge {
                    weights: BlendWeights { goal: 0.45, avoid: 0.55 },
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Stronger perpendicular dodge against a head-on walker
    pub fn head_on_strong() -> Self {
        Self {
            avoid_radius: 0.25,
            obstacles: vec![ObstacleSpec::new("Ped1", ObstacleClass::HeadOn)],
            policies: PolicySet {
                perpendicular_dodge: Some(PerpendicularDodge {
                    weights: BlendWeights::normalized(0.3, 0.8),
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Pass a slower walker going the same way
    pub fn overtake() -> Self {
        Self {
            overtake_radius: 0.3,
            avoid_radius: 0.3,
            obstacles: vec![ObstacleSpec::new("Ped1", ObstacleClass::Overtake)],
            policies: PolicySet {
                overtake: Some(Overtake {
                    side: LateralBias::PositiveY,
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Dodge against the walker's estimated velocity
    pub fn velocity_dodge() -> Self {
        Self {
            avoid_radius: 0.4,
            obstacles: vec![ObstacleSpec::new("Ped1", ObstacleClass::Crossing)],
            policies: PolicySet {
                velocity_dodge: Some(VelocityDodge::default()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Stop and wait whenever the walker is close
    pub fn wait() -> Self {
        Self {
            avoid_radius: 0.35,
            obstacles: vec![ObstacleSpec::new("Ped1", ObstacleClass::Crossing)],
            policies: PolicySet::default(),
            pause: Some(PauseConfig {
                trigger: PauseTrigger::Proximity,
                stop_duration: 15,
            }),
            ..Default::default()
        }
    }

    /// Pause for fast walkers, velocity dodge for slow ones, side-step otherwise
    pub fn hybrid() -> Self {
        Self {
            avoid_radius: 0.4,
            obstacles: vec![ObstacleSpec::new("Ped1", ObstacleClass::Crossing)],
            policies: PolicySet {
                velocity_dodge: Some(VelocityDodge {
                    weights: BlendWeights { goal: 0.3, avoid: 0.7 },
                    min_speed: 0.01,
                }),
                ..Default::default()
            },
            pause: Some(PauseConfig::default()),
            ..Default::default()
        }
    }

    /// Two opposite crossing flows plus one standing pedestrian
    pub fn dual_flow() -> Self {
        Self {
            avoid_radius: 0.6,
            obstacles: vec![
                ObstacleSpec::new("Ped1", ObstacleClass::Crossing),
                ObstacleSpec::new("Ped2", ObstacleClass::Crossing),
                ObstacleSpec::new("Ped3", ObstacleClass::Static),
            ],
            policies: PolicySet {
                static_repulsion: Some(StaticRepulsion::default()),
                dual_flow: Some(DualFlow::default()),
                perpendicular_dodge: Some(PerpendicularDodge {
                    weights: BlendWeights { goal: 0.6, avoid: 0.4 },
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// [`NavConfig::dual_flow`] with the flow dodge skewed by `bias_degrees`
    pub fn dual_flow_biased(bias_degrees: f32) -> Self {
        let mut config = Self::dual_flow();
        config.avoid_radius = 0.5;
        if let Some(dual) = config.policies.dual_flow.as_mut() {
            dual.bias = Some(RotationBias::before_blend(bias_degrees));
        }
        config
    }

    /// Head-on, crossing and overtaking walkers at once
    pub fn crossing_focus() -> Self {
        Self {
            avoid_radius: 0.35,
            overtake_radius: 0.35,
            obstacles: vec![
                ObstacleSpec::new("Ped1", ObstacleClass::HeadOn),
                ObstacleSpec::new("Ped2", ObstacleClass::Crossing),
                ObstacleSpec::new("Ped3", ObstacleClass::Overtake),
            ],
            policies: PolicySet {
                overtake: Some(Overtake::default()),
                perpendicular_dodge: Some(PerpendicularDodge {
                    weights: BlendWeights::EVEN,
                }),
                ..Default::default()
            },
            crossing: Some(CrossingFocus::default()),
            ..Default::default()
        }
    }

    /// Camera-only sidestep with a turn-rate-limited heading
    pub fn vision_sidestep() -> Self {
        Self {
            speed: 0.1,
            goal_eps: 0.15,
            turn_speed: Some(0.03),
            policies: PolicySet {
                vision: Some(VisionSidestep::default()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Set the speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the default react radius
    pub fn with_avoid_radius(mut self, radius: f32) -> Self {
        self.avoid_radius = radius;
        self
    }

    /// Limit heading change per tick
    pub fn with_turn_speed(mut self, turn_speed: f32) -> Self {
        self.turn_speed = Some(turn_speed);
        self
    }

    /// Declare an obstacle
    pub fn with_obstacle(mut self, spec: ObstacleSpec) -> Self {
        self.obstacles.push(spec);
        self
    }

    /// Replace the avoidance rules
    pub fn with_policies(mut self, policies: PolicySet) -> Self {
        self.policies = policies;
        self
    }

    /// Enable crossing focus
    pub fn with_crossing(mut self, crossing: CrossingFocus) -> Self {
        self.crossing = Some(crossing);
        self
    }

    /// Enable pausing
    pub fn with_pause(mut self, pause: PauseConfig) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Check the values the engine relies on
    pub fn validate(&self) -> Result<()> {
        positive("speed", self.speed)?;
        positive("goal_eps", self.goal_eps)?;
        positive("avoid_radius", self.avoid_radius)?;
        positive("overtake_radius", self.overtake_radius)?;
        if let Some(turn_speed) = self.turn_speed {
            positive("turn_speed", turn_speed)?;
        }

        let mut names = HashSet::new();
        for spec in &self.obstacles {
            if !names.insert(spec.name.as_str()) {
                return Err(NavError::DuplicateObstacle(spec.name.clone()));
            }
            if let Some(radius) = spec.avoid_radius {
                positive(&format!("obstacles.{}.avoid_radius", spec.name), radius)?;
            }
        }

        let policies = &self.policies;
        if let Some(rule) = &policies.static_repulsion {
            weights("static_repulsion", rule.weights)?;
        }
        if let Some(rule) = &policies.dual_flow {
            weights("dual_flow", rule.weights)?;
            if !(-1.0..=1.0).contains(&rule.opposed_dot) {
                return Err(invalid(format!(
                    "dual_flow.opposed_dot must lie in [-1, 1], got {}",
                    rule.opposed_dot
                )));
            }
        }
        if let Some(rule) = &policies.overtake {
            weights("overtake", rule.weights)?;
        }
        if let Some(rule) = &policies.perpendicular_dodge {
            weights("perpendicular_dodge", rule.weights)?;
        }
        if let Some(rule) = &policies.velocity_dodge {
            weights("velocity_dodge", rule.weights)?;
            if rule.min_speed < 0.0 {
                return Err(invalid("velocity_dodge.min_speed must not be negative"));
            }
        }
        if let Some(rule) = &policies.vision {
            weights("vision", rule.weights)?;
            if rule.image_width == 0 {
                return Err(invalid("vision.image_width must be positive"));
            }
            positive("vision.band_half_width", rule.band_half_width)?;
            positive("vision.max_depth", rule.max_depth)?;
        }

        if let Some(crossing) = &self.crossing {
            positive("crossing.cross_radius", crossing.cross_radius)?;
            positive("crossing.lateral_threshold", crossing.lateral_threshold)?;
        }
        if let Some(pause) = &self.pause {
            if pause.stop_duration == 0 {
                return Err(invalid("pause.stop_duration must be at least one tick"));
            }
            if let PauseTrigger::FastMotion { speed } = pause.trigger {
                if speed < 0.0 {
                    return Err(invalid("pause.trigger.speed must not be negative"));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> NavError {
    NavError::InvalidConfig(message.into())
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be positive, got {}", name, value)))
    }
}

fn weights(name: &str, weights: BlendWeights) -> Result<()> {
    if weights.is_valid() {
        Ok(())
    } else {
        Err(invalid(format!(
            "{}.weights must be non-negative and sum to 1.0, got {} + {}",
            name, weights.goal, weights.avoid
        )))
    }
}
