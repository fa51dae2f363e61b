//! Scripted obstacle motion

use serde::{Deserialize, Serialize};

use stride_math::Vec2;

/// World axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn get(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    pub fn set(self, v: &mut Vec2, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
    }
}

/// How an obstacle moves each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mover {
    /// Never moves
    Stationary,
    /// Walk back and forth between `min` and `max`
    Bounce {
        axis: Axis,
        min: f32,
        max: f32,
        speed: f32,
        /// Current direction, `1.0` or `-1.0`
        #[serde(default = "forward")]
        direction: f32,
    },
    /// Walk with `velocity` along the axis and wrap to the opposite bound
    Loop {
        axis: Axis,
        min: f32,
        max: f32,
        velocity: f32,
    },
    /// Walk toward `target` and stop within `eps` of it
    MoveTo {
        axis: Axis,
        target: f32,
        speed: f32,
        eps: f32,
    },
    /// Constant per-tick displacement
    Constant { velocity: Vec2 },
}

fn forward() -> f32 {
    1.0
}

impl Mover {
    pub fn bounce(axis: Axis, min: f32, max: f32, speed: f32, direction: f32) -> Self {
        Self::Bounce {
            axis,
            min,
            max,
            speed,
            direction,
        }
    }

    pub fn move_to(axis: Axis, target: f32, speed: f32) -> Self {
        Self::MoveTo {
            axis,
            target,
            speed,
            eps: 0.01,
        }
    }

    /// Advance one tick from `position`
    pub fn step(&mut self, position: Vec2) -> Vec2 {
        let mut next = position;
        match self {
            Mover::Stationary => {}
            Mover::Bounce {
                axis,
                min,
                max,
                speed,
                direction,
            } => {
                let value = axis.get(position) + *speed * *direction;
                if value > *max {
                    axis.set(&mut next, *max);
                    *direction = -1.0;
                } else if value < *min {
                    axis.set(&mut next, *min);
                    *direction = 1.0;
                } else {
                    axis.set(&mut next, value);
                }
            }
            Mover::Loop {
                axis,
                min,
                max,
                velocity,
            } => {
                let mut value = axis.get(position) + *velocity;
                if *velocity > 0.0 && value > *max {
                    value = *min;
                } else if *velocity < 0.0 && value < *min {
                    value = *max;
                }
                axis.set(&mut next, value);
            }
            Mover::MoveTo {
                axis,
                target,
                speed,
                eps,
            } => {
                let remaining = *target - axis.get(position);
                if remaining.abs() > *eps {
                    let step = remaining.abs().min(*speed).copysign(remaining);
                    axis.set(&mut next, axis.get(position) + step);
                }
            }
            Mover::Constant { velocity } => next += *velocity,
        }
        next
    }
}
