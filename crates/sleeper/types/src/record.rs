//! Per-video monitoring records
//!
//! A MonitoringRecord is the finite-state record the decision engine
//! mutates: the snapshots recorded so far, where in the schedule the
//! video is, and the long-term / explosion / completion flags. The
//! persistence layer owns durability; the record only owns its shape and
//! invariants.

use crate::{Checkpoint, MetricSnapshot, MonitorError, MonitorResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CTR multiple over the `72h` baseline that counts as a delayed explosion.
pub const DEFAULT_EXPLOSION_MULTIPLIER: f64 = 1.5;

/// Relative slack on the explosion threshold so that decimal inputs on
/// the exact multiple (0.10 → 0.15) still count as reaching it.
const EXPLOSION_EPSILON: f64 = 1e-9;

/// Whether `current` CTR reaches `multiplier` times a positive `base` CTR.
///
/// The comparison is inclusive. A zero or negative base never fires.
pub fn reaches_explosion(base: f64, current: f64, multiplier: f64) -> bool {
    if base <= 0.0 {
        return false;
    }
    let threshold = base * multiplier;
    current >= threshold - threshold * EXPLOSION_EPSILON
}

// ── Video Identifier ─────────────────────────────────────────────────

/// Platform identifier of a monitored video
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Where a record is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonitoringState {
    /// Waiting for the snapshot at `checkpoint`
    Monitoring { checkpoint: Checkpoint },
    /// Terminal; no further snapshots are accepted
    Completed,
}

impl MonitoringState {
    pub fn status(&self) -> MonitoringStatus {
        match self {
            MonitoringState::Monitoring { .. } => MonitoringStatus::Monitoring,
            MonitoringState::Completed => MonitoringStatus::Completed,
        }
    }
}

/// Persisted status column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringStatus {
    Monitoring,
    Completed,
}

impl std::fmt::Display for MonitoringStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitoringStatus::Monitoring => write!(f, "monitoring"),
            MonitoringStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Why monitoring ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Closed at `72h` without extension
    #[serde(rename = "normal_72h_completion")]
    Normal72h,
    /// Reached the `30d` checkpoint under long-term watch
    #[serde(rename = "extended_30d_completion")]
    Extended30d,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionReason::Normal72h => "normal_72h_completion",
            CompletionReason::Extended30d => "extended_30d_completion",
        }
    }
}

impl std::fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Transition History ───────────────────────────────────────────────

/// Kind of state change recorded in a record's history
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEvent {
    SnapshotRecorded,
    LongTermWatchStarted,
    ExplosionDetected,
    Completed,
}

/// One entry of a record's transition history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub at: DateTime<Utc>,
    pub checkpoint: Checkpoint,
    pub event: TransitionEvent,
    pub detail: String,
}

// ── Monitoring Record ────────────────────────────────────────────────

/// Monitoring state of one video
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRecord {
    pub video_id: VideoId,
    pub published_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: MonitoringState,
    /// Recorded snapshots in checkpoint order, at most one per checkpoint
    pub snapshots: Vec<MetricSnapshot>,
    pub long_term_watch: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_term_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_monitoring_started_at: Option<DateTime<Utc>>,
    pub explosion_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_reason: Option<CompletionReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<TransitionEntry>,
}

impl MonitoringRecord {
    /// Create a record for a newly detected video, waiting for `1h`.
    pub fn new(video_id: VideoId, published_at: DateTime<Utc>) -> Self {
        Self {
            video_id,
            published_at,
            state: MonitoringState::Monitoring {
                checkpoint: Checkpoint::H1,
            },
            snapshots: Vec::new(),
            long_term_watch: false,
            long_term_reason: None,
            extended_monitoring_started_at: None,
            explosion_detected: false,
            completion_reason: None,
            completed_at: None,
            history: Vec::new(),
        }
    }

    pub fn status(&self) -> MonitoringStatus {
        self.state.status()
    }

    pub fn is_completed(&self) -> bool {
        self.state == MonitoringState::Completed
    }

    /// The checkpoint the record is waiting for, `None` once completed.
    pub fn expected_checkpoint(&self) -> Option<Checkpoint> {
        match self.state {
            MonitoringState::Monitoring { checkpoint } => Some(checkpoint),
            MonitoringState::Completed => None,
        }
    }

    pub fn snapshot(&self, checkpoint: Checkpoint) -> Option<&MetricSnapshot> {
        self.snapshots.iter().find(|s| s.checkpoint == checkpoint)
    }

    pub fn has_snapshot(&self, checkpoint: Checkpoint) -> bool {
        self.snapshot(checkpoint).is_some()
    }

    /// The `72h` snapshot every long-term comparison is made against.
    pub fn baseline(&self) -> Option<&MetricSnapshot> {
        self.snapshot(Checkpoint::DECISION)
    }

    pub fn latest_snapshot(&self) -> Option<&MetricSnapshot> {
        self.snapshots.last()
    }

    /// The latest recorded long-term snapshot, if any.
    pub fn latest_long_term_snapshot(&self) -> Option<&MetricSnapshot> {
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.checkpoint.is_long_term())
    }

    /// Hours between publication and `at`, negative if `at` is earlier.
    pub fn hours_online(&self, at: DateTime<Utc>) -> f64 {
        (at - self.published_at).num_seconds() as f64 / 3600.0
    }

    // ── Mutations (driven by the state machine) ──────────────────────

    /// Append a snapshot. Callers must have checked ordering and uniqueness.
    pub fn push_snapshot(&mut self, snapshot: MetricSnapshot) {
        self.record_history(
            snapshot.captured_at,
            snapshot.checkpoint,
            TransitionEvent::SnapshotRecorded,
            format!(
                "ctr={:.4} vph={:.1} retention={:.4}",
                snapshot.ctr, snapshot.vph, snapshot.retention
            ),
        );
        self.snapshots.push(snapshot);
    }

    /// Move to waiting for `checkpoint`.
    pub fn advance_to(&mut self, checkpoint: Checkpoint) {
        self.state = MonitoringState::Monitoring { checkpoint };
    }

    /// Place the record on long-term watch.
    pub fn start_long_term_watch(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        let reason = reason.into();
        self.long_term_watch = true;
        self.extended_monitoring_started_at = Some(at);
        self.record_history(
            at,
            Checkpoint::DECISION,
            TransitionEvent::LongTermWatchStarted,
            reason.clone(),
        );
        self.long_term_reason = Some(reason);
    }

    /// Set the explosion flag. Set-once: later calls are no-ops.
    pub fn mark_explosion(&mut self, checkpoint: Checkpoint, at: DateTime<Utc>, detail: String) {
        if self.explosion_detected {
            return;
        }
        self.explosion_detected = true;
        self.record_history(at, checkpoint, TransitionEvent::ExplosionDetected, detail);
    }

    /// Close the record. `completed` is terminal.
    pub fn complete(&mut self, checkpoint: Checkpoint, reason: CompletionReason, at: DateTime<Utc>) {
        self.state = MonitoringState::Completed;
        self.completion_reason = Some(reason);
        self.completed_at = Some(at);
        self.record_history(
            at,
            checkpoint,
            TransitionEvent::Completed,
            reason.as_str().to_string(),
        );
    }

    fn record_history(
        &mut self,
        at: DateTime<Utc>,
        checkpoint: Checkpoint,
        event: TransitionEvent,
        detail: String,
    ) {
        self.history.push(TransitionEntry {
            at,
            checkpoint,
            event,
            detail,
        });
    }

    // ── Invariants ───────────────────────────────────────────────────

    /// Check the record invariants with the default explosion multiplier.
    pub fn check_invariants(&self) -> MonitorResult<()> {
        self.check_invariants_with(DEFAULT_EXPLOSION_MULTIPLIER)
    }

    /// Check the record invariants against a given explosion multiplier.
    pub fn check_invariants_with(&self, explosion_multiplier: f64) -> MonitorResult<()> {
        let violation = |reason: String| MonitorError::InvariantViolation {
            video_id: self.video_id.clone(),
            reason,
        };

        for pair in self.snapshots.windows(2) {
            if pair[0].checkpoint >= pair[1].checkpoint {
                return Err(violation(format!(
                    "snapshots not in strict checkpoint order: {} then {}",
                    pair[0].checkpoint, pair[1].checkpoint
                )));
            }
        }

        match self.state {
            MonitoringState::Completed => {
                let reason = self
                    .completion_reason
                    .ok_or_else(|| violation("completed without completion_reason".into()))?;
                if self.completed_at.is_none() {
                    return Err(violation("completed without completed_at".into()));
                }
                let required = match reason {
                    CompletionReason::Normal72h => Checkpoint::DECISION,
                    CompletionReason::Extended30d => Checkpoint::FINAL,
                };
                if !self.has_snapshot(required) {
                    return Err(violation(format!(
                        "{} without a {} snapshot",
                        reason, required
                    )));
                }
                if reason == CompletionReason::Normal72h && self.long_term_watch {
                    return Err(violation("normal_72h_completion under long-term watch".into()));
                }
            }
            MonitoringState::Monitoring { checkpoint } => {
                if self.completion_reason.is_some() {
                    return Err(violation("completion_reason set while monitoring".into()));
                }
                if let Some(last) = self.latest_snapshot() {
                    if last.checkpoint >= checkpoint {
                        return Err(violation(format!(
                            "waiting for {} but {} already recorded",
                            checkpoint, last.checkpoint
                        )));
                    }
                }
                if checkpoint.is_long_term() && !self.long_term_watch {
                    return Err(violation(format!(
                        "waiting for {} without long-term watch",
                        checkpoint
                    )));
                }
            }
        }

        if self.long_term_watch {
            let baseline = self
                .baseline()
                .ok_or_else(|| violation("long-term watch without a 72h snapshot".into()))?;
            let started = self.extended_monitoring_started_at.ok_or_else(|| {
                violation("long-term watch without extended_monitoring_started_at".into())
            })?;
            if started < baseline.captured_at {
                return Err(violation(
                    "extended monitoring started before the 72h snapshot".into(),
                ));
            }
            if self.long_term_reason.is_none() {
                return Err(violation("long-term watch without long_term_reason".into()));
            }
        } else if let Some(s) = self.latest_long_term_snapshot() {
            return Err(violation(format!(
                "{} snapshot recorded without long-term watch",
                s.checkpoint
            )));
        }

        if self.explosion_detected {
            let base = self
                .baseline()
                .map(|b| b.ctr)
                .filter(|ctr| *ctr > 0.0)
                .ok_or_else(|| violation("explosion without a usable 72h baseline".into()))?;
            let fired = self
                .snapshots
                .iter()
                .any(|s| {
                    s.checkpoint.is_long_term()
                        && reaches_explosion(base, s.ctr, explosion_multiplier)
                });
            if !fired {
                return Err(violation(
                    "explosion flagged but no long-term snapshot reaches the threshold".into(),
                ));
            }
        }

        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Field set handed to the persistence collaborator.
    pub fn to_patch(&self) -> RecordPatch {
        RecordPatch {
            video_id: self.video_id.clone(),
            status: self.status(),
            monitoring_stage: self.latest_snapshot().map(|s| s.checkpoint.storage_key()),
            long_term_watch: self.long_term_watch,
            long_term_reason: self.long_term_reason.clone(),
            extended_monitoring_started_at: self.extended_monitoring_started_at,
            explosion_detected: self.explosion_detected,
            completion_reason: self.completion_reason,
            completed_at: self.completed_at,
            metrics: self
                .snapshots
                .iter()
                .map(|s| (s.checkpoint.storage_key(), s.clone()))
                .collect(),
        }
    }
}

/// Persistence-facing view of a record, matching the stored column set.
///
/// Optional columns serialize as `null` rather than being omitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub video_id: VideoId,
    pub status: MonitoringStatus,
    pub monitoring_stage: Option<String>,
    pub long_term_watch: bool,
    pub long_term_reason: Option<String>,
    pub extended_monitoring_started_at: Option<DateTime<Utc>>,
    pub explosion_detected: bool,
    pub completion_reason: Option<CompletionReason>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Snapshots keyed by `checkpoint_<label>`
    pub metrics: BTreeMap<String, MetricSnapshot>,
}
