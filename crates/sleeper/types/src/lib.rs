//! Sleeper-Hit Monitoring Domain Types
//!
//! Videos are observed at fixed checkpoints after publication. Most are
//! closed at `72h`; a few that look under-exposed but well-made are kept on
//! long-term watch to catch a delayed explosion (a "sleeper hit").
//!
//! # Key Concepts
//!
//! - **Checkpoint**: one of eight fixed offsets (`1h` … `30d`). The first
//!   five are short-term, the last three long-term.
//! - **MetricSnapshot**: CTR, VPH and retention observed at a checkpoint.
//!   Immutable once recorded.
//! - **MonitoringRecord**: per-video state: recorded snapshots, where the
//!   video is in the schedule, and the long-term / explosion / completion
//!   flags.
//! - **DecisionReport**: what the engine decided at a checkpoint, and the
//!   only thing collaborators (persistence, notification, learning feeds)
//!   consume.
//!
//! This crate holds shapes and invariants only. Transition logic lives in
//! `sleeper-engine`.

#![deny(unsafe_code)]

mod checkpoint;
mod errors;
mod record;
mod report;
mod snapshot;

pub use checkpoint::*;
pub use errors::*;
pub use record::*;
pub use report::*;
pub use snapshot::*;
