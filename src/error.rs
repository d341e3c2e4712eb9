//! Error types for the powercast analysis pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during preprocessing, forecasting, or a pipeline run.
///
/// Configuration problems (`InvalidParameter`, `NotReady`, `RunInFlight`) are
/// reported to the caller before a run starts; data problems and stage
/// failures stay local to the stage that hit them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between index-aligned sequences.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before forecasting")]
    FitRequired,

    /// An external stage collaborator failed.
    #[error("stage {stage} failed: {message}")]
    StageExecution { stage: String, message: String },

    /// Cooperative cancellation was requested and observed at a checkpoint.
    #[error("cancellation requested")]
    Cancelled,

    /// The readiness gate is not fully locked.
    #[error("parameters not ready: {0} is unlocked")]
    NotReady(String),

    /// A pipeline run currently holds the locked parameter snapshot.
    #[error("a pipeline run is in flight")]
    RunInFlight,
}
