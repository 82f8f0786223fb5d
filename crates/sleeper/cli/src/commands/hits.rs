//! Sleeper-hit analytics view

use super::read_json;
use crate::error::CliResult;
use crate::output::{self, percent, OutputFormat};
use clap::Args;
use serde::Serialize;
use sleeper_engine::{sleeper_hits, SleeperHitRow};
use sleeper_types::MonitoringRecord;
use std::path::PathBuf;
use tabled::Tabled;

/// Arguments for `sleeper hits`
#[derive(Args)]
pub struct HitsArgs {
    /// Monitoring records (JSON array)
    pub records: PathBuf,
}

/// Table row for a sleeper hit
#[derive(Debug, Serialize, Tabled)]
struct HitRow {
    video: String,
    #[tabled(rename = "ctr 72h")]
    ctr_day3: String,
    #[tabled(rename = "ctr later")]
    ctr_day30: String,
    #[tabled(rename = "ctr growth")]
    ctr_growth: String,
    #[tabled(rename = "vph 72h")]
    vph_day3: String,
    #[tabled(rename = "vph later")]
    vph_day30: String,
    #[tabled(rename = "vph growth")]
    vph_growth: String,
    at: String,
    observed: String,
}

impl From<&SleeperHitRow> for HitRow {
    fn from(h: &SleeperHitRow) -> Self {
        Self {
            video: h.video_id.to_string(),
            ctr_day3: format!("{:.2}%", h.ctr_day3 * 100.0),
            ctr_day30: format!("{:.2}%", h.ctr_day30 * 100.0),
            ctr_growth: percent(h.ctr_growth_percent),
            vph_day3: format!("{:.1}", h.vph_day3),
            vph_day30: format!("{:.1}", h.vph_day30),
            vph_growth: percent(h.vph_growth_percent),
            at: h.compared_checkpoint.to_string(),
            observed: h.observed_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute `sleeper hits`
pub fn execute(args: HitsArgs, format: OutputFormat) -> CliResult<()> {
    let records: Vec<MonitoringRecord> = read_json(&args.records)?;
    let hits = sleeper_hits(&records);
    tracing::debug!(records = records.len(), hits = hits.len(), "Sleeper-hit view built");

    match format {
        OutputFormat::Table => output::print_output(hits.iter().map(HitRow::from).collect(), format),
        _ => output::print_single(&hits, format),
    }
}
