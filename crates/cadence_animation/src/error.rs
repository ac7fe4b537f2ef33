//! Animation error types

use cadence_core::PropertyError;
use thiserror::Error;

/// Errors surfaced by the scheduler, timelines and graph runners
#[derive(Error, Debug)]
pub enum TweenError {
    /// Active plus pooled jobs would exceed the configured ceiling
    #[error("Job limit reached: at most {max} jobs may exist")]
    CapacityExceeded { max: usize },

    /// The manager is disabled and hands out no jobs
    #[error("Tween manager is disabled")]
    Disabled,

    /// A handle outlived the manager it points to
    #[error("Tween manager has been dropped")]
    ManagerDropped,

    /// No global manager is installed on this thread
    #[error("No tween manager installed on this thread")]
    NotInitialized,

    /// A pooled instance did not have the requested job type
    #[error("Pooled job is not a `{expected}`")]
    TypeMismatch { expected: &'static str },

    /// `run` was called on a graph that is still running
    #[error("Sequence is already running")]
    AlreadyRunning,

    /// The handle's job has finished and its instance was recycled
    #[error("Job handle is stale")]
    StaleHandle,

    /// There is nothing to build or run
    #[error("Sequence has no steps")]
    EmptySequence,

    /// Property lookup or binding failed
    #[error("Property error: {0}")]
    Property(#[from] PropertyError),

    /// Failed to read a config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a config file
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Failed to serialize a config
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, TweenError>;
