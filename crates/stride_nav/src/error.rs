//! Error types for the navigation engine

use thiserror::Error;

/// Navigation engine errors
///
/// All of these are construction-time failures. A running controller never
/// fails a tick: degenerate geometry resolves to a zero vector instead.
#[derive(Debug, Error)]
pub enum NavError {
    /// A named obstacle could not be resolved against the world
    #[error("Obstacle not found: {0}")]
    MissingObstacle(String),

    /// The same obstacle was declared twice in the roster
    #[error("Obstacle declared more than once: {0}")]
    DuplicateObstacle(String),

    /// Invalid configuration
    #[error("Invalid navigation configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for navigation operations
pub type Result<T> = std::result::Result<T, NavError>;
