//! Priority-ordered avoidance rules
//!
//! Rules are tried in a fixed order and the first enabled rule whose
//! trigger holds produces the avoidance vector:
//!
//! 1. static repulsion
//! 2. dual dynamic flow
//! 3. overtake bias
//! 4. perpendicular dodge
//! 5. velocity-opposed dodge
//! 6. vision sidestep
//!
//! Only consulted while the agent is seeking.

use serde::{Deserialize, Serialize};
use std::fmt;

use stride_math::Vec2;

use crate::config::{BlendWeights, LateralBias, NavConfig, PolicySet, RotationBias};
use crate::obstacle::{ObstacleClass, ObstacleId, ObstacleView};
use crate::vision::VisionDetection;

/// Projection below which a direction gives no side preference
const SIDE_TOLERANCE: f32 = 1e-3;

/// Lower bound on distances used as inverse weights
const MIN_FLOW_DISTANCE: f32 = 1e-3;

/// Which rule produced an avoidance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvoidanceRule {
    StaticRepulsion,
    DualFlow,
    Overtake,
    PerpendicularDodge,
    VelocityDodge,
    VisionSidestep,
}

impl fmt::Display for AvoidanceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StaticRepulsion => "static_repulsion",
            Self::DualFlow => "dual_flow",
            Self::Overtake => "overtake",
            Self::PerpendicularDodge => "perpendicular_dodge",
            Self::VelocityDodge => "velocity_dodge",
            Self::VisionSidestep => "vision_sidestep",
        };
        f.write_str(name)
    }
}

/// Selected avoidance: a unit (or zero) vector and how to blend it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avoidance {
    pub rule: AvoidanceRule,
    pub vector: Vec2,
    pub weights: BlendWeights,
    pub bias: Option<RotationBias>,
    /// Obstacle the rule reacted to, if it came from the roster
    pub obstacle: Option<ObstacleId>,
}

impl Avoidance {
    fn new(rule: AvoidanceRule, vector: Vec2, weights: BlendWeights) -> Self {
        Self {
            rule,
            vector: vector.normalize(),
            weights,
            bias: None,
            obstacle: None,
        }
    }

    fn against(mut self, obstacle: ObstacleId) -> Self {
        self.obstacle = Some(obstacle);
        self
    }

    fn with_bias(mut self, bias: Option<RotationBias>) -> Self {
        self.bias = bias;
        self
    }
}

/// Inputs of one selection
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub agent: Vec2,
    pub yaw: f32,
    /// Unit direction to the goal
    pub goal_direction: Vec2,
    pub obstacles: &'a [ObstacleView],
    pub detections: &'a [VisionDetection],
}

/// `(0, 1)` when the obstacle is below the agent, `(0, -1)` otherwise
pub fn lateral_away(agent: Vec2, obstacle: Vec2) -> Vec2 {
    if obstacle.y < agent.y {
        Vec2::Y
    } else {
        Vec2::NEG_Y
    }
}

/// Unit perpendicular to the agent-obstacle line.
///
/// The side is chosen so the agent passes behind a moving obstacle instead
/// of stepping into its path. When the obstacle is not moving across the
/// line, the side closer to the goal wins, then the counter-clockwise one.
pub fn perpendicular_dodge(agent: Vec2, obstacle: &ObstacleView, goal_direction: Vec2) -> Vec2 {
    let base = (agent - obstacle.position).perpendicular().normalize();
    if base.is_zero() {
        return Vec2::ZERO;
    }

    let along_motion = base.dot(obstacle.velocity.normalize());
    if along_motion.abs() > SIDE_TOLERANCE {
        return if along_motion > 0.0 { -base } else { base };
    }

    let along_goal = base.dot(goal_direction);
    if along_goal < -SIDE_TOLERANCE {
        -base
    } else {
        base
    }
}

/// The configured avoidance rules
#[derive(Debug, Clone)]
pub struct AvoidancePolicy {
    rules: PolicySet,
    overtake_radius: f32,
}

impl AvoidancePolicy {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            rules: config.policies.clone(),
            overtake_radius: config.overtake_radius,
        }
    }

    pub fn rules(&self) -> &PolicySet {
        &self.rules
    }

    /// First qualifying rule, `None` to follow the goal unmodified
    pub fn select(&self, ctx: &PolicyContext<'_>) -> Option<Avoidance> {
        self.static_repulsion(ctx)
            .or_else(|| self.dual_flow(ctx))
            .or_else(|| self.overtake(ctx))
            .or_else(|| self.perpendicular(ctx))
            .or_else(|| self.velocity(ctx))
            .or_else(|| self.vision(ctx))
    }

    fn static_repulsion(&self, ctx: &PolicyContext<'_>) -> Option<Avoidance> {
        let rule = self.rules.static_repulsion.as_ref()?;
        let obstacle = nearest(ctx.obstacles, |v| v.class == ObstacleClass::Static && v.is_threat())?;
        Some(
            Avoidance::new(
                AvoidanceRule::StaticRepulsion,
                lateral_away(ctx.agent, obstacle.position),
                rule.weights,
            )
            .against(obstacle.id),
        )
    }

    fn dual_flow(&self, ctx: &PolicyContext<'_>) -> Option<Avoidance> {
        let rule = self.rules.dual_flow.as_ref()?;
        let mut threats: Vec<&ObstacleView> = ctx
            .obstacles
            .iter()
            .filter(|v| v.class.is_dynamic() && v.is_threat())
            .collect();
        if threats.len() < 2 {
            return None;
        }
        threats.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        let (near, far) = (threats[0], threats[1]);

        let similarity = near.velocity.normalize().dot(far.velocity.normalize());
        if similarity < rule.opposed_dot {
            // Opposed flows cannot be summed; dodge the nearer one alone
            let weights = self
                .rules
                .perpendicular_dodge
                .map_or(rule.weights, |p| p.weights);
            let vector = perpendicular_dodge(ctx.agent, near, ctx.goal_direction);
            return Some(Avoidance::new(AvoidanceRule::DualFlow, vector, weights).against(near.id));
        }

        // A flow that sums to zero still claims the tick and leaves the goal unmodified
        let flow = [near, far].iter().fold(Vec2::ZERO, |sum, v| {
            sum + v.velocity * (1.0 / v.distance.max(MIN_FLOW_DISTANCE))
        });
        if flow.normalize().is_zero() {
            log::debug!(
                "Dual flow of {} and {} has no direction, following the goal",
                near.id,
                far.id
            );
        }
        Some(
            Avoidance::new(AvoidanceRule::DualFlow, flow.perpendicular(), rule.weights)
                .against(near.id)
                .with_bias(rule.bias),
        )
    }

    fn overtake(&self, ctx: &PolicyContext<'_>) -> Option<Avoidance> {
        let rule = self.rules.overtake.as_ref()?;
        let obstacle = nearest(ctx.obstacles, |v| {
            v.class == ObstacleClass::Overtake
                && v.distance < self.overtake_radius
                && (v.position - ctx.agent).dot(ctx.goal_direction) > 0.0
        })?;
        let lateral = match rule.side {
            LateralBias::PositiveY => Vec2::Y,
            LateralBias::NegativeY => Vec2::NEG_Y,
            LateralBias::AwayFromObstacle => lateral_away(ctx.agent, obstacle.position),
        };
        Some(Avoidance::new(AvoidanceRule::Overtake, lateral, rule.weights).against(obstacle.id))
    }

    fn perpendicular(&self, ctx: &PolicyContext<'_>) -> Option<Avoidance> {
        let rule = self.rules.perpendicular_dodge.as_ref()?;
        let obstacle = nearest(ctx.obstacles, |v| v.class.is_dynamic() && v.is_threat())?;
        let vector = perpendicular_dodge(ctx.agent, obstacle, ctx.goal_direction);
        Some(Avoidance::new(AvoidanceRule::PerpendicularDodge, vector, rule.weights).against(obstacle.id))
    }

    fn velocity(&self, ctx: &PolicyContext<'_>) -> Option<Avoidance> {
        let rule = self.rules.velocity_dodge.as_ref()?;
        let obstacle = nearest(ctx.obstacles, |v| v.class.is_dynamic() && v.is_threat())?;
        let avoidance = if obstacle.speed() > rule.min_speed {
            Avoidance::new(AvoidanceRule::VelocityDodge, -obstacle.velocity, rule.weights)
        } else {
            let vector = perpendicular_dodge(ctx.agent, obstacle, ctx.goal_direction);
            Avoidance::new(AvoidanceRule::PerpendicularDodge, vector, rule.weights)
        };
        Some(avoidance.against(obstacle.id))
    }

    fn vision(&self, ctx: &PolicyContext<'_>) -> Option<Avoidance> {
        let rule = self.rules.vision.as_ref()?;
        let detection = rule.blocking(ctx.detections)?;
        Some(Avoidance::new(
            AvoidanceRule::VisionSidestep,
            rule.sidestep(detection, ctx.yaw),
            rule.weights,
        ))
    }
}

fn nearest<F>(views: &[ObstacleView], filter: F) -> Option<&ObstacleView>
where
    F: Fn(&ObstacleView) -> bool,
{
    views
        .iter()
        .filter(|v| filter(v))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
