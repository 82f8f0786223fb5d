//! Error types for the monitoring layer

use crate::{Checkpoint, VideoId};

/// Reasons a snapshot is rejected. A rejected snapshot never changes the record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    #[error("Late snapshot for {video_id}: monitoring already completed, {checkpoint} ignored")]
    LateSnapshot {
        video_id: VideoId,
        checkpoint: Checkpoint,
    },

    #[error("Out-of-order checkpoint for {video_id}: got {got}, expected {expected}")]
    OutOfOrderCheckpoint {
        video_id: VideoId,
        got: Checkpoint,
        expected: Checkpoint,
    },

    #[error("Duplicate checkpoint for {video_id}: {checkpoint} already recorded")]
    DuplicateCheckpoint {
        video_id: VideoId,
        checkpoint: Checkpoint,
    },

    #[error("Unexpected checkpoint for {video_id}: {checkpoint} requires long-term watch")]
    UnexpectedCheckpoint {
        video_id: VideoId,
        checkpoint: Checkpoint,
    },

    #[error("Invalid snapshot for {video_id} at {checkpoint}: {reason}")]
    InvalidSnapshot {
        video_id: VideoId,
        checkpoint: Checkpoint,
        reason: String,
    },

    #[error("Record invariant violated for {video_id}: {reason}")]
    InvariantViolation { video_id: VideoId, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MonitorError {
    /// Whether the caller may retry the same snapshot later.
    ///
    /// Only an out-of-order arrival can succeed once the missing
    /// predecessor has been backfilled.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MonitorError::OutOfOrderCheckpoint { .. })
    }

    /// Stable kind name for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::LateSnapshot { .. } => "late_snapshot",
            MonitorError::OutOfOrderCheckpoint { .. } => "out_of_order_checkpoint",
            MonitorError::DuplicateCheckpoint { .. } => "duplicate_checkpoint",
            MonitorError::UnexpectedCheckpoint { .. } => "unexpected_checkpoint",
            MonitorError::InvalidSnapshot { .. } => "invalid_snapshot",
            MonitorError::InvariantViolation { .. } => "invariant_violation",
            MonitorError::Configuration(_) => "configuration",
        }
    }
}

/// Result type alias for monitoring operations
pub type MonitorResult<T> = Result<T, MonitorError>;
