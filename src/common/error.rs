//! Error types for jammer_motion

use thiserror::Error;

/// Main error type for motion planning
#[derive(Debug, Error)]
pub enum MotionError {
    /// Missing, empty or out-of-range configuration input
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Roadmap cannot be queried
    #[error("Graph is too small: {nodes} node(s), at least 2 required")]
    GraphTooSmall { nodes: usize },
    /// Roadmap search ran out of attempts
    #[error("Failed to find valid path after {attempts} attempts")]
    SearchExhausted { attempts: usize },
    /// Numerical computation failed (singular system, non-finite values)
    #[error("Numerical error: {0}")]
    NumericalError(String),
    /// No trajectory stored under this id
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON input
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for motion planning operations
pub type MotionResult<T> = Result<T, MotionError>;
