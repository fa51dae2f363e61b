//! Goal seeking

use serde::{Deserialize, Serialize};
use std::fmt;

use stride_math::Vec2;

/// Fixed target with an arrival tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub target: Vec2,
    pub eps: f32,
}

impl Goal {
    pub fn new(target: Vec2, eps: f32) -> Self {
        Self { target, eps }
    }

    /// Direction and distance from `position` to the target
    pub fn toward(&self, position: Vec2) -> Heading {
        let offset = self.target - position;
        Heading {
            direction: offset.normalize(),
            distance: offset.length(),
        }
    }

    /// Strictly inside the tolerance
    pub fn is_reached(&self, position: Vec2) -> bool {
        self.target.distance(position) < self.eps
    }

    /// Arrival status at `position`
    pub fn status(&self, position: Vec2) -> NavStatus {
        if self.is_reached(position) {
            NavStatus::Arrived
        } else {
            NavStatus::Moving
        }
    }
}

/// Unit direction toward the goal and the remaining distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    pub direction: Vec2,
    pub distance: f32,
}

/// Progress toward the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavStatus {
    Moving,
    Arrived,
}

impl fmt::Display for NavStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moving => write!(f, "moving"),
            Self::Arrived => write!(f, "arrived"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_toward() {
        let goal = Goal::new(Vec2::new(-2.0, 0.0), 0.05);
        let heading = goal.toward(Vec2::new(1.0, 4.0));

        assert_relative_eq!(heading.distance, 5.0, epsilon = 1e-6);
        assert_relative_eq!(heading.direction.x, -0.6, epsilon = 1e-6);
        assert_relative_eq!(heading.direction.y, -0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_arrival_is_strict() {
        let goal = Goal::new(Vec2::new(1.0, 0.0), 0.25);
        assert_eq!(goal.status(Vec2::new(0.8, 0.0)), NavStatus::Arrived);
        assert_eq!(goal.status(Vec2::new(0.5, 0.0)), NavStatus::Moving);
        assert_eq!(goal.status(Vec2::new(0.75, 0.0)), NavStatus::Moving);
    }

    #[test]
    fn test_on_target_direction_is_zero() {
        let goal = Goal::new(Vec2::new(1.0, 1.0), 0.05);
        let heading = goal.toward(Vec2::new(1.0, 1.0));
        assert_eq!(heading.direction, Vec2::ZERO);
        assert_eq!(heading.distance, 0.0);
    }
}
