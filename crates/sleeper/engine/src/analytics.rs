//! Sleeper-hit analytics view.
//!
//! Read-only projection over monitoring records for the reporting side:
//! every record whose explosion fired, with its day-3 metrics joined to the
//! day-30 (or latest long-term) metrics.

use crate::rules::growth_percent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sleeper_types::{Checkpoint, MonitoringRecord, VideoId};

/// One row of the sleeper-hit view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SleeperHitRow {
    pub video_id: VideoId,
    pub ctr_day3: f64,
    pub ctr_day30: f64,
    pub ctr_growth_percent: Option<f64>,
    pub vph_day3: f64,
    pub vph_day30: f64,
    pub vph_growth_percent: Option<f64>,
    /// `30d` when recorded, otherwise the latest long-term checkpoint
    pub compared_checkpoint: Checkpoint,
    /// Capture time of the compared snapshot
    pub observed_at: DateTime<Utc>,
}

/// Build the sleeper-hit view, most recent first.
pub fn sleeper_hits(records: &[MonitoringRecord]) -> Vec<SleeperHitRow> {
    let mut rows: Vec<SleeperHitRow> = records
        .iter()
        .filter(|r| r.explosion_detected)
        .filter_map(hit_row)
        .collect();
    rows.sort_by(|a, b| {
        b.observed_at
            .cmp(&a.observed_at)
            .then_with(|| a.video_id.cmp(&b.video_id))
    });
    rows
}

fn hit_row(record: &MonitoringRecord) -> Option<SleeperHitRow> {
    let day3 = record.baseline()?;
    let later = record
        .snapshot(Checkpoint::FINAL)
        .or_else(|| record.latest_long_term_snapshot())?;

    Some(SleeperHitRow {
        video_id: record.video_id.clone(),
        ctr_day3: day3.ctr,
        ctr_day30: later.ctr,
        ctr_growth_percent: growth_percent(day3.ctr, later.ctr),
        vph_day3: day3.vph,
        vph_day30: later.vph,
        vph_growth_percent: growth_percent(day3.vph, later.vph),
        compared_checkpoint: later.checkpoint,
        observed_at: later.captured_at,
    })
}
