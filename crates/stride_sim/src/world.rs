//! Kinematic world: the agent body, scripted obstacles and an optional camera

use std::collections::HashMap;

use stride_math::Vec2;
use stride_nav::controller::{MotionActuator, Snapshot, SteeringCommand};
use stride_nav::obstacle::{ObstacleId, ObstacleRegistry};

use crate::camera::PinholeCamera;
use crate::mover::Mover;

/// Pose of the simulated agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentBody {
    pub position: Vec2,
    /// Height above the ground, never changed by steering
    pub z: f32,
    pub yaw: f32,
}

/// Moves the agent body by the commanded displacement
#[derive(Debug, Clone)]
pub struct KinematicActuator {
    body: AgentBody,
    travelled: f32,
}

impl KinematicActuator {
    pub fn new(body: AgentBody) -> Self {
        Self {
            body,
            travelled: 0.0,
        }
    }

    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    /// Path length covered so far
    pub fn travelled(&self) -> f32 {
        self.travelled
    }
}

impl MotionActuator for KinematicActuator {
    fn apply(&mut self, command: &SteeringCommand) {
        if command.is_arrived() {
            return;
        }
        self.body.position += command.displacement;
        self.body.yaw = command.yaw;
        self.travelled += command.displacement.length();
    }
}

/// An obstacle living in the world
#[derive(Debug, Clone)]
pub struct WorldObstacle {
    pub id: ObstacleId,
    pub name: String,
    pub position: Vec2,
    pub mover: Mover,
}

/// Obstacles and sensors around the agent
#[derive(Debug, Clone, Default)]
pub struct World {
    obstacles: Vec<WorldObstacle>,
    names: HashMap<String, ObstacleId>,
    camera: Option<PinholeCamera>,
    tick: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera: PinholeCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Add an obstacle; ids are assigned in insertion order starting at 1
    pub fn spawn(&mut self, name: impl Into<String>, position: Vec2, mover: Mover) -> ObstacleId {
        let name = name.into();
        let id = ObstacleId(self.obstacles.len() as u32 + 1);
        if self.names.insert(name.clone(), id).is_some() {
            log::warn!("Obstacle name {} reused, lookups now resolve to {}", name, id);
        }
        self.obstacles.push(WorldObstacle {
            id,
            name,
            position,
            mover,
        });
        id
    }

    pub fn obstacles(&self) -> &[WorldObstacle] {
        &self.obstacles
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// What the controller sees this tick
    pub fn snapshot(&self, body: &AgentBody) -> Snapshot {
        let mut snapshot = Snapshot::new(body.position).with_z(body.z);
        snapshot.first_tick = self.tick == 0;
        for obstacle in &self.obstacles {
            snapshot = snapshot.with_obstacle(obstacle.id, obstacle.position);
        }
        if let Some(camera) = &self.camera {
            snapshot.detections = self
                .obstacles
                .iter()
                .filter_map(|o| camera.project(body.position, body.yaw, o.position, o.id.0))
                .collect();
        }
        snapshot
    }

    /// Distance from `position` to the closest obstacle
    pub fn clearance(&self, position: Vec2) -> Option<f32> {
        self.obstacles
            .iter()
            .map(|o| o.position.distance(position))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Advance every obstacle by one tick
    pub fn step(&mut self) {
        for obstacle in &mut self.obstacles {
            obstacle.position = obstacle.mover.step(obstacle.position);
        }
        self.tick += 1;
    }
}

impl ObstacleRegistry for World {
    fn resolve(&self, name: &str) -> Option<ObstacleId> {
        self.names.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mover::Axis;
    use stride_nav::goal::NavStatus;
    use stride_nav::mode::ModeKind;

    fn body() -> AgentBody {
        AgentBody {
            position: Vec2::ZERO,
            z: 1.27,
            yaw: 0.0,
        }
    }

    #[test]
    fn test_snapshot_marks_first_tick() {
        let mut world = World::new();
        let id = world.spawn("Ped1", Vec2::new(0.0, 1.0), Mover::move_to(Axis::Y, -1.0, 0.04));

        let snapshot = world.snapshot(&body());
        assert!(snapshot.first_tick);
        assert_eq!(snapshot.obstacles[0].id, id);
        assert_eq!(snapshot.z, Some(1.27));

        world.step();
        let snapshot = world.snapshot(&body());
        assert!(!snapshot.first_tick);
        assert!((snapshot.obstacles[0].position.y - 0.96).abs() < 1e-6);
    }

    #[test]
    fn test_registry_lookup() {
        let mut world = World::new();
        world.spawn("Ped1", Vec2::ZERO, Mover::Stationary);
        world.spawn("Ped2", Vec2::ZERO, Mover::Stationary);
        assert_eq!(world.resolve("Ped2"), Some(ObstacleId(2)));
        assert_eq!(world.resolve("Ped3"), None);
    }

    #[test]
    fn test_actuator_keeps_height_and_stops_on_arrival() {
        let mut actuator = KinematicActuator::new(body());
        let mut command = SteeringCommand {
            direction: Vec2::new(-1.0, 0.0),
            yaw: std::f32::consts::PI,
            status: NavStatus::Moving,
            mode: ModeKind::Seeking,
            rule: None,
            displacement: Vec2::new(-0.02, 0.0),
            transition: None,
        };
        actuator.apply(&command);
        assert_eq!(actuator.body().position, Vec2::new(-0.02, 0.0));
        assert_eq!(actuator.body().z, 1.27);
        assert_eq!(actuator.body().yaw, std::f32::consts::PI);

        command.status = NavStatus::Arrived;
        actuator.apply(&command);
        assert_eq!(actuator.body().position, Vec2::new(-0.02, 0.0));
    }

    #[test]
    fn test_camera_detections_in_snapshot() {
        let mut world = World::new().with_camera(PinholeCamera::default());
        world.spawn("Ped1", Vec2::new(1.0, 0.0), Mover::Stationary);
        world.spawn("Ped2", Vec2::new(-1.0, 0.0), Mover::Stationary);

        let snapshot = world.snapshot(&body());
        assert_eq!(snapshot.detections.len(), 1);
        assert_eq!(snapshot.detections[0].id, Some(1));
    }
}
