//! Sleeper-Hit Decision Engine
//!
//! Evaluates metric snapshots against per-video monitoring records and
//! decides, at each checkpoint, whether to keep watching, extend into
//! long-term watch, close, or flag a delayed explosion.
//!
//! # Key Principle
//!
//! **The engine decides, it never performs I/O.**
//!
//! Metrics are fetched before [`DecisionEngine::evaluate`] is called, and
//! the returned [`DecisionReport`](sleeper_types::DecisionReport) is the only
//! thing persistence and notification collaborators consume.
//!
//! # Architecture
//!
//! - [`MonitorConfig`] — Rule thresholds, diagnosis thresholds, ordering
//! - [`rules`] — The ordered `72h` rule table and the explosion rule
//! - [`StateMachine`] — Admits snapshots and drives record transitions
//! - [`diagnosis`] — Root-cause diagnosis attached to every report
//! - [`health`] — Profile-aware health status and priority per snapshot
//! - [`DecisionEngine`] — Composes the above behind `evaluate`
//! - [`sleeper_hits`] — Read-only analytics view over finished records
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use sleeper_engine::{DecisionEngine, MonitorConfig};
//! use sleeper_types::*;
//!
//! let engine = DecisionEngine::new(MonitorConfig::default()).unwrap();
//! let published = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
//! let mut record = MonitoringRecord::new(VideoId::new("dQw4w9WgXcQ"), published);
//!
//! for checkpoint in [Checkpoint::H1, Checkpoint::H6, Checkpoint::H24, Checkpoint::H48] {
//!     let snapshot = MetricSnapshot::new(checkpoint, checkpoint.due_time(published), 0.04, 15.0, 0.6);
//!     engine.evaluate(&mut record, snapshot).unwrap();
//! }
//!
//! let at_72h = MetricSnapshot::new(
//!     Checkpoint::H72,
//!     Checkpoint::H72.due_time(published),
//!     0.042,
//!     18.0,
//!     0.65,
//! );
//! let report = engine.evaluate(&mut record, at_72h).unwrap();
//! assert_eq!(report.action, DecisionAction::Extend);
//! assert_eq!(report.next_checkpoint, Some(Checkpoint::D7));
//! ```

#![deny(unsafe_code)]

pub mod analytics;
pub mod config;
pub mod diagnosis;
pub mod engine;
pub mod health;
pub mod rules;
pub mod state_machine;

pub use analytics::{sleeper_hits, SleeperHitRow};
pub use config::{ChannelProfile, CheckpointOrdering, DiagnosisThresholds, MonitorConfig, RuleThresholds};
pub use engine::{DecisionEngine, ReplayStep};
pub use state_machine::{StateMachine, Transition};
