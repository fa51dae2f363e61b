//! Obstacle tracking
//!
//! Remembers the last reported position of every obstacle and derives a
//! one-step velocity from consecutive reports.

use std::collections::HashMap;

use stride_math::Vec2;

use crate::obstacle::ObstacleId;

/// Memory of a single obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    /// Last known position
    pub position: Vec2,
    /// Position reported on the observation before this one
    pub previous: Option<Vec2>,
    /// Displacement between the last two observations
    pub velocity: Vec2,
    /// Number of times this obstacle was observed
    pub observations: u32,
}

impl Track {
    fn first(position: Vec2) -> Self {
        Self {
            position,
            previous: None,
            velocity: Vec2::ZERO,
            observations: 1,
        }
    }

    fn observe(&mut self, position: Vec2) {
        self.previous = Some(self.position);
        self.velocity = position - self.position;
        self.position = position;
        self.observations += 1;
    }
}

/// Per-obstacle position memory and velocity estimate
#[derive(Debug, Clone, Default)]
pub struct ObstacleTracker {
    tracks: HashMap<ObstacleId, Track>,
}

impl ObstacleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position and return the velocity estimate.
    ///
    /// The first observation of an id yields zero velocity. Later ones yield
    /// the raw per-tick displacement `position - previous`.
    pub fn update(&mut self, id: ObstacleId, position: Vec2) -> Vec2 {
        match self.tracks.get_mut(&id) {
            Some(track) => {
                track.observe(position);
                track.velocity
            }
            None => {
                self.tracks.insert(id, Track::first(position));
                Vec2::ZERO
            }
        }
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.tracks.clear();
    }

    /// Last velocity estimate, zero for unknown ids
    pub fn velocity(&self, id: ObstacleId) -> Vec2 {
        self.tracks.get(&id).map_or(Vec2::ZERO, |t| t.velocity)
    }

    /// Last known position
    pub fn position(&self, id: ObstacleId) -> Option<Vec2> {
        self.tracks.get(&id).map(|t| t.position)
    }

    pub fn track(&self, id: ObstacleId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_has_zero_velocity() {
        let mut tracker = ObstacleTracker::new();
        let v = tracker.update(ObstacleId(1), Vec2::new(0.0, 1.0));

        assert_eq!(v, Vec2::ZERO);
        assert_eq!(tracker.track(ObstacleId(1)).unwrap().previous, None);
    }

    #[test]
    fn test_velocity_is_displacement() {
        let mut tracker = ObstacleTracker::new();
        tracker.update(ObstacleId(1), Vec2::new(0.0, 1.0));
        let v = tracker.update(ObstacleId(1), Vec2::new(0.5, 0.75));

        assert_eq!(v, Vec2::new(0.5, 0.75) - Vec2::new(0.0, 1.0));
        assert_eq!(tracker.velocity(ObstacleId(1)), v);

        let v = tracker.update(ObstacleId(1), Vec2::new(0.5, 0.75));
        assert_eq!(v, Vec2::ZERO);
        assert_eq!(tracker.track(ObstacleId(1)).unwrap().observations, 3);
    }

    #[test]
    fn test_ids_tracked_independently() {
        let mut tracker = ObstacleTracker::new();
        tracker.update(ObstacleId(1), Vec2::new(0.0, 0.0));
        tracker.update(ObstacleId(2), Vec2::new(5.0, 5.0));
        let v1 = tracker.update(ObstacleId(1), Vec2::new(1.0, 0.0));

        assert_eq!(v1, Vec2::new(1.0, 0.0));
        assert_eq!(tracker.velocity(ObstacleId(2)), Vec2::ZERO);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut tracker = ObstacleTracker::new();
        tracker.update(ObstacleId(1), Vec2::new(0.0, 0.0));
        tracker.reset();

        assert!(tracker.is_empty());
        assert_eq!(tracker.update(ObstacleId(1), Vec2::new(3.0, 0.0)), Vec2::ZERO);
        assert_eq!(tracker.position(ObstacleId(1)), Some(Vec2::new(3.0, 0.0)));
    }
}
