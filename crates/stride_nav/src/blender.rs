//! Steering blending and heading smoothing

use stride_math::{clamp, wrap_angle, Vec2};

use crate::config::{BiasStage, BlendWeights, NavConfig};
use crate::policy::Avoidance;

/// What the active mode asks the blender to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steer {
    /// Follow the goal direction
    Goal,
    /// Blend the goal with an avoidance
    Avoid(Avoidance),
    /// Move along a fixed direction, ignoring the goal
    Direct(Vec2),
    /// Stand still
    Hold,
}

/// Blender output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    /// Unit direction or zero
    pub direction: Vec2,
    /// Heading after this tick
    pub yaw: f32,
}

/// Weighted sum of goal and avoidance, renormalized
pub fn combine(goal: Vec2, avoid: Vec2, weights: BlendWeights) -> Vec2 {
    (goal * weights.goal + avoid * weights.avoid).normalize()
}

/// Move `yaw` toward `desired` by at most `max_step` radians
pub fn limit_turn(yaw: f32, desired: f32, max_step: f32) -> f32 {
    let delta = clamp(wrap_angle(desired - yaw), -max_step, max_step);
    wrap_angle(yaw + delta)
}

/// Turns a steering request into a direction and heading
#[derive(Debug, Clone, Copy, Default)]
pub struct SteeringBlender {
    turn_speed: Option<f32>,
}

impl SteeringBlender {
    pub fn new(turn_speed: Option<f32>) -> Self {
        Self { turn_speed }
    }

    pub fn from_config(config: &NavConfig) -> Self {
        Self::new(config.turn_speed)
    }

    pub fn turn_speed(&self) -> Option<f32> {
        self.turn_speed
    }

    /// Direction the agent would like to move in, before turn limiting
    pub fn desired(&self, steer: &Steer, goal_direction: Vec2) -> Vec2 {
        match steer {
            Steer::Goal => goal_direction.normalize(),
            Steer::Avoid(avoidance) => mix(avoidance, goal_direction),
            Steer::Direct(direction) => direction.normalize(),
            Steer::Hold => Vec2::ZERO,
        }
    }

    /// Blend and apply the heading update. A zero direction keeps `yaw`.
    ///
    /// With a turn speed, only the heading is rate limited: it turns toward
    /// the goal (or the fixed direction of [`Steer::Direct`]), while the
    /// avoidance share is added on top of the smoothed heading at once.
    pub fn blend(&self, steer: &Steer, goal_direction: Vec2, yaw: f32) -> Blend {
        let max_step = match self.turn_speed {
            Some(max_step) => max_step,
            None => {
                let desired = self.desired(steer, goal_direction);
                if desired.is_zero() {
                    return hold(yaw);
                }
                return Blend {
                    direction: desired,
                    yaw: desired.angle(),
                };
            }
        };

        match steer {
            Steer::Hold => hold(yaw),
            Steer::Goal => {
                let goal = goal_direction.normalize();
                if goal.is_zero() {
                    return hold(yaw);
                }
                let yaw = limit_turn(yaw, goal.angle(), max_step);
                Blend {
                    direction: Vec2::from_angle(yaw),
                    yaw,
                }
            }
            Steer::Avoid(avoidance) => {
                let goal = goal_direction.normalize();
                let heading = if goal.is_zero() {
                    yaw
                } else {
                    limit_turn(yaw, goal.angle(), max_step)
                };
                let direction = mix(avoidance, Vec2::from_angle(heading));
                if direction.is_zero() {
                    return hold(yaw);
                }
                Blend {
                    direction,
                    yaw: heading,
                }
            }
            Steer::Direct(direction) => {
                let direction = direction.normalize();
                if direction.is_zero() {
                    return hold(yaw);
                }
                Blend {
                    direction,
                    yaw: limit_turn(yaw, direction.angle(), max_step),
                }
            }
        }
    }
}

/// Goal and avoidance combined with the rule's weights and bias
fn mix(avoidance: &Avoidance, goal: Vec2) -> Vec2 {
    let bias = avoidance.bias;
    let mut avoid = avoidance.vector;
    if let Some(b) = bias.filter(|b| b.stage == BiasStage::BeforeBlend) {
        avoid = avoid.rotate(b.radians());
    }
    let mut direction = combine(goal, avoid, avoidance.weights);
    if let Some(b) = bias.filter(|b| b.stage == BiasStage::AfterBlend) {
        direction = direction.rotate(b.radians()).normalize();
    }
    direction
}

fn hold(yaw: f32) -> Blend {
    Blend {
        direction: Vec2::ZERO,
        yaw,
    }
}
