//! Error types for sab-bridge
//!
//! Acquisition-path failures (missing software, unreadable or malformed
//! files) are recovered inside the bridge by falling back to synthesis and
//! never reach this type. What does reach callers is a rejected config
//! update, an analysis over unusable input, or a lookup miss.

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::config::ConfigError;
use crate::measurement::MeasurementError;

/// Main error type for sab-bridge
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected configuration update (stored config left unchanged)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Analysis rejected its input
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Measurement construction failed
    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    /// Unknown measurement type, malformed request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found (e.g. history entry id)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Shared-library error (settings, measurement vocabulary)
    #[error(transparent)]
    Common(#[from] sab_common::Error),

    /// Internal invariant broken (poisoned lock)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using sab-bridge Error
pub type Result<T> = std::result::Result<T, Error>;
