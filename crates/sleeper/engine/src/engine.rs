//! Decision engine: the single public entry point for evaluating snapshots
//!
//! The engine composes the state machine, the rule table and the
//! diagnosis. It never performs I/O; the returned report is the only
//! channel to persistence, notification and analytics collaborators.

use crate::config::MonitorConfig;
use crate::diagnosis::diagnose;
use crate::health::check_health;
use crate::state_machine::StateMachine;
use sleeper_types::*;
use tracing::{debug, info, instrument, warn};

/// Evaluates metric snapshots against monitoring records
#[derive(Clone, Debug)]
pub struct DecisionEngine {
    config: MonitorConfig,
    state_machine: StateMachine,
}

impl DecisionEngine {
    /// Create an engine, rejecting invalid thresholds.
    pub fn new(config: MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;
        let state_machine = StateMachine::new(config.thresholds.clone(), config.ordering);
        Ok(Self {
            config,
            state_machine,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Evaluate one snapshot against a record.
    ///
    /// On success the record has been moved through exactly one transition.
    /// On error the record is unchanged and the caller decides whether to
    /// retry (see [`MonitorError::is_retryable`]).
    #[instrument(
        skip(self, record, snapshot),
        fields(video_id = %record.video_id, checkpoint = %snapshot.checkpoint)
    )]
    pub fn evaluate(
        &self,
        record: &mut MonitoringRecord,
        snapshot: MetricSnapshot,
    ) -> MonitorResult<DecisionReport> {
        let result = record
            .check_invariants_with(self.config.thresholds.explosion_multiplier)
            .and_then(|()| self.state_machine.admit(record, &snapshot));

        if let Err(err) = result {
            warn!(
                video_id = %record.video_id,
                checkpoint = %snapshot.checkpoint,
                error_kind = err.kind(),
                retryable = err.is_retryable(),
                "Snapshot rejected: {}",
                err
            );
            return Err(err);
        }

        let diagnosis = diagnose(&snapshot, &self.config.diagnosis, self.config.profile);
        let health = check_health(
            &snapshot,
            record.hours_online(snapshot.captured_at),
            &self.config.diagnosis,
            self.config.profile,
        );
        let transition = self.state_machine.apply(record, snapshot);

        let report = DecisionReport {
            video_id: record.video_id.clone(),
            checkpoint: transition.checkpoint,
            action: transition.action,
            reason: transition.reason,
            explosion_detected: record.explosion_detected,
            growth_percent: transition.explosion.and_then(|e| e.growth_percent),
            vph_growth_percent: transition.explosion.and_then(|e| e.vph_growth_percent),
            next_checkpoint: record.expected_checkpoint(),
            long_term_reason: transition.long_term_reason,
            completion_reason: transition.completion,
            diagnosis,
            health,
        };

        debug!(
            action = %report.action,
            reason = %report.reason,
            growth_percent = ?report.growth_percent,
            syndrome = %report.diagnosis.syndrome,
            health = %report.health.status,
            "Snapshot evaluated"
        );
        if report.health.priority == Priority::High {
            warn!(
                video_id = %report.video_id,
                health = %report.health.status,
                "{}",
                report.health.message
            );
        }

        match report.action {
            DecisionAction::Extend => info!(
                video_id = %report.video_id,
                reason = %report.reason,
                long_term_reason = report.long_term_reason.as_deref().unwrap_or_default(),
                "Long-term watch started"
            ),
            DecisionAction::DetectExplosionContinue | DecisionAction::DetectExplosionClose => {
                info!(
                    video_id = %report.video_id,
                    checkpoint = %report.checkpoint,
                    growth_percent = ?report.growth_percent,
                    "Delayed explosion detected"
                )
            }
            _ => {}
        }
        if let Some(reason) = report.completion_reason {
            info!(
                video_id = %report.video_id,
                completion_reason = %reason,
                explosion_detected = report.explosion_detected,
                "Monitoring completed"
            );
        }

        Ok(report)
    }

    /// Run a fresh record through a sequence of snapshots.
    ///
    /// Rejected snapshots are collected alongside the reports and skipped;
    /// the record keeps whatever state the accepted ones produced.
    pub fn replay<I>(&self, record: &mut MonitoringRecord, snapshots: I) -> Vec<ReplayStep>
    where
        I: IntoIterator<Item = MetricSnapshot>,
    {
        snapshots
            .into_iter()
            .map(|snapshot| {
                let checkpoint = snapshot.checkpoint;
                ReplayStep {
                    checkpoint,
                    outcome: self.evaluate(record, snapshot),
                }
            })
            .collect()
    }
}

/// One snapshot of a replay and what became of it
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayStep {
    pub checkpoint: Checkpoint,
    pub outcome: MonitorResult<DecisionReport>,
}
