//! State machine: admits snapshots and drives record transitions
//!
//! States are `monitoring(C)` for each checkpoint `C` and `completed`.
//! A record starts at `monitoring(1h)`. Every accepted snapshot is
//! appended and moves the record forward:
//!
//! - short-term checkpoints before `72h` advance to the next checkpoint;
//! - `72h` runs the extension rule and either starts long-term watch
//!   (advance to `7d`) or completes with `normal_72h_completion`;
//! - `7d` / `15d` run the explosion rule and advance;
//! - `30d` runs the explosion rule and completes with
//!   `extended_30d_completion`.
//!
//! `completed` is terminal. Rejected snapshots leave the record untouched.

use crate::config::{CheckpointOrdering, RuleThresholds};
use crate::rules::{self, ExplosionCheck, Verdict};
use sleeper_types::*;

/// Outcome of one accepted snapshot
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub checkpoint: Checkpoint,
    pub action: DecisionAction,
    pub reason: DecisionReason,
    /// Present at long-term checkpoints
    pub explosion: Option<ExplosionCheck>,
    /// Set when this transition started long-term watch
    pub long_term_reason: Option<String>,
    /// Set when this transition completed the record
    pub completion: Option<CompletionReason>,
}

/// Drives monitoring records through the checkpoint schedule
#[derive(Clone, Debug, Default)]
pub struct StateMachine {
    thresholds: RuleThresholds,
    ordering: CheckpointOrdering,
}

impl StateMachine {
    pub fn new(thresholds: RuleThresholds, ordering: CheckpointOrdering) -> Self {
        Self {
            thresholds,
            ordering,
        }
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Admit and apply a snapshot.
    pub fn step(
        &self,
        record: &mut MonitoringRecord,
        snapshot: MetricSnapshot,
    ) -> MonitorResult<Transition> {
        self.admit(record, &snapshot)?;
        Ok(self.apply(record, snapshot))
    }

    /// Check whether a snapshot may be applied, without touching the record.
    ///
    /// Checks run in a fixed order: completed record, duplicate, long-term
    /// gate, ordering, input contract.
    pub fn admit(&self, record: &MonitoringRecord, snapshot: &MetricSnapshot) -> MonitorResult<()> {
        let video_id = || record.video_id.clone();
        let checkpoint = snapshot.checkpoint;

        let expected = match record.expected_checkpoint() {
            Some(expected) => expected,
            None => {
                return Err(MonitorError::LateSnapshot {
                    video_id: video_id(),
                    checkpoint,
                })
            }
        };

        if record.has_snapshot(checkpoint) {
            return Err(MonitorError::DuplicateCheckpoint {
                video_id: video_id(),
                checkpoint,
            });
        }

        if checkpoint.is_long_term() && !record.long_term_watch {
            return Err(MonitorError::UnexpectedCheckpoint {
                video_id: video_id(),
                checkpoint,
            });
        }

        let in_order = match self.ordering {
            CheckpointOrdering::Strict => checkpoint == expected,
            CheckpointOrdering::AllowGaps => checkpoint >= expected,
        };
        if !in_order {
            return Err(MonitorError::OutOfOrderCheckpoint {
                video_id: video_id(),
                got: checkpoint,
                expected,
            });
        }

        if checkpoint.is_long_term() && record.baseline().is_none() {
            return Err(MonitorError::InvariantViolation {
                video_id: video_id(),
                reason: format!("{} arrived under long-term watch without a 72h snapshot", checkpoint),
            });
        }

        snapshot
            .validate()
            .map_err(|reason| MonitorError::InvalidSnapshot {
                video_id: video_id(),
                checkpoint,
                reason,
            })
    }

    /// Apply an admitted snapshot. Infallible once `admit` has passed.
    pub fn apply(&self, record: &mut MonitoringRecord, snapshot: MetricSnapshot) -> Transition {
        let checkpoint = snapshot.checkpoint;
        let at = snapshot.captured_at;

        if checkpoint == Checkpoint::DECISION {
            let classification = rules::classify_decision(&snapshot, &self.thresholds);

            return match classification.verdict {
                Verdict::Extend => {
                    let reason = rules::long_term_reason(classification.reason, &snapshot);
                    record.push_snapshot(snapshot);
                    record.start_long_term_watch(reason.clone(), at);
                    record.advance_to(Checkpoint::D7);
                    Transition {
                        checkpoint,
                        action: DecisionAction::Extend,
                        reason: classification.reason,
                        explosion: None,
                        long_term_reason: Some(reason),
                        completion: None,
                    }
                }
                Verdict::Close => {
                    record.push_snapshot(snapshot);
                    record.complete(checkpoint, CompletionReason::Normal72h, at);
                    Transition {
                        checkpoint,
                        action: DecisionAction::Close,
                        reason: classification.reason,
                        explosion: None,
                        long_term_reason: None,
                        completion: Some(CompletionReason::Normal72h),
                    }
                }
            };
        }

        if checkpoint.is_long_term() {
            let explosion = record
                .baseline()
                .map(|baseline| rules::check_explosion(baseline, &snapshot, &self.thresholds));
            let newly_exploded =
                explosion.map(|e| e.fired).unwrap_or(false) && !record.explosion_detected;
            let detail = explosion
                .and_then(|e| e.growth_percent)
                .map(|g| format!("ctr {:.4} is {:+.1}% over the 72h baseline", snapshot.ctr, g))
                .unwrap_or_default();
            record.push_snapshot(snapshot);

            if newly_exploded {
                record.mark_explosion(checkpoint, at, detail);
            }

            let (action, reason, completion) = match checkpoint.next() {
                Some(next) => {
                    record.advance_to(next);
                    if newly_exploded {
                        (
                            DecisionAction::DetectExplosionContinue,
                            DecisionReason::DelayedExplosion,
                            None,
                        )
                    } else {
                        (DecisionAction::Continue, DecisionReason::LongTermWatch, None)
                    }
                }
                None => {
                    record.complete(checkpoint, CompletionReason::Extended30d, at);
                    if newly_exploded {
                        (
                            DecisionAction::DetectExplosionClose,
                            DecisionReason::DelayedExplosion,
                            Some(CompletionReason::Extended30d),
                        )
                    } else {
                        (
                            DecisionAction::Close,
                            DecisionReason::ExtendedWatchFinished,
                            Some(CompletionReason::Extended30d),
                        )
                    }
                }
            };

            return Transition {
                checkpoint,
                action,
                reason,
                explosion,
                long_term_reason: None,
                completion,
            };
        }

        record.push_snapshot(snapshot);
        // Short-term checkpoints before 72h always have a successor
        if let Some(next) = checkpoint.next() {
            record.advance_to(next);
        }
        Transition {
            checkpoint,
            action: DecisionAction::Continue,
            reason: DecisionReason::ScheduledCheckpoint,
            explosion: None,
            long_term_reason: None,
            completion: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn published() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 18, 0, 0).unwrap()
    }

    fn snap(checkpoint: Checkpoint, ctr: f64, vph: f64, retention: f64) -> MetricSnapshot {
        MetricSnapshot::new(checkpoint, checkpoint.due_time(published()), ctr, vph, retention)
    }

    fn record_at_72h() -> MonitoringRecord {
        let machine = StateMachine::default();
        let mut record = MonitoringRecord::new(VideoId::new("vid-1"), published());
        for c in [Checkpoint::H1, Checkpoint::H6, Checkpoint::H24, Checkpoint::H48] {
            machine.step(&mut record, snap(c, 0.04, 15.0, 0.6)).unwrap();
        }
        record
    }

    #[test]
    fn test_short_term_advances() {
        let machine = StateMachine::default();
        let mut record = MonitoringRecord::new(VideoId::new("vid-1"), published());
        let t = machine
            .step(&mut record, snap(Checkpoint::H1, 0.03, 40.0, 0.5))
            .unwrap();
        assert_eq!(t.action, DecisionAction::Continue);
        assert_eq!(t.reason, DecisionReason::ScheduledCheckpoint);
        assert_eq!(record.expected_checkpoint(), Some(Checkpoint::H6));
    }

    #[test]
    fn test_72h_verdict_alone_decides_extend_or_close() {
        let machine = StateMachine::default();
        let cases = [
            (0.042, 18.0, 0.65),
            (0.09, 12.0, 0.47),
            (0.09, 60.0, 0.70),
            (0.07, 10.0, 0.30),
            (0.065, 35.0, 0.47),
        ];
        for (ctr, vph, retention) in cases {
            let snapshot = snap(Checkpoint::H72, ctr, vph, retention);
            let verdict = rules::classify_decision(&snapshot, machine.thresholds()).verdict;
            let mut record = record_at_72h();
            let t = machine.step(&mut record, snapshot).unwrap();

            match verdict {
                Verdict::Extend => {
                    assert_eq!(t.action, DecisionAction::Extend);
                    assert!(t.long_term_reason.is_some());
                    assert!(record.long_term_watch);
                }
                Verdict::Close => {
                    assert_eq!(t.action, DecisionAction::Close);
                    assert_eq!(t.completion, Some(CompletionReason::Normal72h));
                    assert!(!record.long_term_watch);
                }
            }
            assert!(record.check_invariants().is_ok());
        }
    }

    #[test]
    fn test_72h_extend_moves_to_7d() {
        let machine = StateMachine::default();
        let mut record = record_at_72h();
        let t = machine
            .step(&mut record, snap(Checkpoint::H72, 0.042, 18.0, 0.65))
            .unwrap();
        assert_eq!(t.action, DecisionAction::Extend);
        assert_eq!(record.expected_checkpoint(), Some(Checkpoint::D7));
        assert!(record.long_term_watch);
        assert_eq!(
            record.extended_monitoring_started_at,
            Some(Checkpoint::H72.due_time(published()))
        );
        assert!(record.check_invariants().is_ok());
    }

    #[test]
    fn test_72h_close_completes() {
        let machine = StateMachine::default();
        let mut record = record_at_72h();
        let t = machine
            .step(&mut record, snap(Checkpoint::H72, 0.09, 60.0, 0.7))
            .unwrap();
        assert_eq!(t.action, DecisionAction::Close);
        assert_eq!(t.completion, Some(CompletionReason::Normal72h));
        assert!(record.is_completed());
        assert!(record.check_invariants().is_ok());
    }

    #[test]
    fn test_rejections_leave_record_untouched() {
        let machine = StateMachine::default();
        let mut record = record_at_72h();
        let before = record.clone();

        let dup = machine
            .step(&mut record, snap(Checkpoint::H24, 0.04, 15.0, 0.6))
            .unwrap_err();
        assert!(matches!(dup, MonitorError::DuplicateCheckpoint { .. }));

        let unexpected = machine
            .step(&mut record, snap(Checkpoint::D7, 0.04, 15.0, 0.6))
            .unwrap_err();
        assert!(matches!(unexpected, MonitorError::UnexpectedCheckpoint { .. }));

        let invalid = machine
            .step(&mut record, snap(Checkpoint::H72, 0.04, 15.0, 1.4))
            .unwrap_err();
        assert!(matches!(invalid, MonitorError::InvalidSnapshot { .. }));

        assert_eq!(record, before);
    }

    #[test]
    fn test_strict_ordering_rejects_skips() {
        let machine = StateMachine::default();
        let mut record = MonitoringRecord::new(VideoId::new("vid-1"), published());
        let err = machine
            .step(&mut record, snap(Checkpoint::H24, 0.04, 15.0, 0.6))
            .unwrap_err();
        match err {
            MonitorError::OutOfOrderCheckpoint { got, expected, .. } => {
                assert_eq!(got, Checkpoint::H24);
                assert_eq!(expected, Checkpoint::H1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(record.snapshots.is_empty());
    }

    #[test]
    fn test_allow_gaps_accepts_forward_skip_only() {
        let machine = StateMachine::new(RuleThresholds::default(), CheckpointOrdering::AllowGaps);
        let mut record = MonitoringRecord::new(VideoId::new("vid-1"), published());
        machine
            .step(&mut record, snap(Checkpoint::H1, 0.04, 15.0, 0.6))
            .unwrap();
        machine
            .step(&mut record, snap(Checkpoint::H24, 0.04, 15.0, 0.6))
            .unwrap();
        assert_eq!(record.expected_checkpoint(), Some(Checkpoint::H48));

        let err = machine
            .step(&mut record, snap(Checkpoint::H6, 0.04, 15.0, 0.6))
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(record.check_invariants().is_ok());
    }

    #[test]
    fn test_completed_rejects_late_snapshots() {
        let machine = StateMachine::default();
        let mut record = record_at_72h();
        machine
            .step(&mut record, snap(Checkpoint::H72, 0.09, 60.0, 0.7))
            .unwrap();
        let err = machine
            .step(&mut record, snap(Checkpoint::D7, 0.2, 60.0, 0.7))
            .unwrap_err();
        assert!(matches!(err, MonitorError::LateSnapshot { .. }));
    }
}
