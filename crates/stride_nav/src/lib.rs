//! # stride_nav - Reactive Steering Engine
//!
//! Drives one agent toward a fixed goal on the plane while avoiding point
//! obstacles reported once per tick.
//!
//! # Features
//!
//! - Per-obstacle position memory with one-step velocity estimates
//! - Mode machine (seeking, crossing focus, flee, pause) over a transition table
//! - Priority-ordered avoidance rules
//! - Weighted goal/avoidance blending with rotation bias and turn-rate limiting
//!
//! # Example
//!
//! ```ignore
//! use stride_nav::prelude::*;
//!
//! let mut nav = NavController::new(NavConfig::crossing_focus(), Vec2::new(-2.0, 0.0), &world)?;
//! loop {
//!     let command = nav.tick(&world.snapshot());
//!     actuator.apply(&command);
//! }
//! ```

pub mod blender;
pub mod config;
pub mod controller;
pub mod error;
pub mod goal;
pub mod mode;
pub mod obstacle;
pub mod policy;
pub mod state_machine;
pub mod tracker;
pub mod vision;

pub use error::{NavError, Result};

pub mod prelude {
    pub use crate::blender::{Blend, Steer, SteeringBlender};
    pub use crate::config::{
        BiasStage, BlendWeights, CrossingFocus, DualFlow, LateralBias, NavConfig, Overtake,
        PauseConfig, PauseTrigger, PerpendicularDodge, PolicySet, RotationBias, StaticRepulsion,
        VelocityDodge, VisionSidestep,
    };
    pub use crate::controller::{AgentState, MotionActuator, NavController, Snapshot, SteeringCommand};
    pub use crate::error::{NavError, Result};
    pub use crate::goal::{Goal, NavStatus};
    pub use crate::mode::{Mode, ModeChange, ModeKind};
    pub use crate::obstacle::{
        ObstacleClass, ObstacleId, ObstacleRegistry, ObstacleSample, ObstacleSpec, Roster,
    };
    pub use crate::policy::{Avoidance, AvoidancePolicy, AvoidanceRule};
    pub use crate::tracker::ObstacleTracker;
    pub use crate::vision::VisionDetection;
    pub use stride_math::Vec2;
}
