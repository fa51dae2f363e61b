//! # stride_sim - Scenario Simulator
//!
//! Closes the loop around [`stride_nav`]: a kinematic agent body, obstacles
//! driven by scripted movers, an optional pinhole camera, and a runner that
//! steps everything and summarizes the episode.
//!
//! # Example
//!
//! ```ignore
//! use stride_sim::prelude::*;
//!
//! let report = Runner::new(Scenario::by_name("crossing_focus")?)?.run();
//! println!("{}", report.to_json()?);
//! ```

pub mod camera;
pub mod cli;
pub mod error;
pub mod mover;
pub mod runner;
pub mod scenario;
pub mod settings;
pub mod world;

pub use error::{Result, SimError};

pub mod prelude {
    pub use crate::camera::PinholeCamera;
    pub use crate::cli::CliArgs;
    pub use crate::error::{Result, SimError};
    pub use crate::mover::{Axis, Mover};
    pub use crate::runner::{RunReport, Runner, TransitionRecord};
    pub use crate::scenario::{ObstacleSetup, Scenario, DEFAULT_MAX_TICKS, SCENARIOS};
    pub use crate::settings::SimSettings;
    pub use crate::world::{AgentBody, KinematicActuator, World};
}
