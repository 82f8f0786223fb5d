//! Replay a snapshot sequence through a fresh record

use super::evaluate::ReportRow;
use super::{read_json, write_json};
use crate::error::CliResult;
use crate::output::{self, print_info, print_success, print_warning, OutputFormat};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use sleeper_engine::DecisionEngine;
use sleeper_types::{Checkpoint, DecisionReport, MetricSnapshot, MonitoringRecord, VideoId};
use std::path::PathBuf;

/// Arguments for `sleeper replay`
#[derive(Args)]
pub struct ReplayArgs {
    /// Video identifier for the new record
    #[arg(long)]
    pub video_id: String,

    /// Publication time (RFC 3339)
    #[arg(long)]
    pub published_at: DateTime<Utc>,

    /// Snapshots to replay, in arrival order (JSON array)
    pub snapshots: PathBuf,

    /// Save the final record to this path
    #[arg(long)]
    pub save: Option<PathBuf>,
}

/// A snapshot the engine refused
#[derive(Debug, Serialize)]
struct Rejection {
    checkpoint: Checkpoint,
    kind: &'static str,
    error: String,
}

/// Machine-readable replay result
#[derive(Debug, Serialize)]
struct ReplayOutput<'a> {
    reports: Vec<DecisionReport>,
    rejected: Vec<Rejection>,
    record: &'a MonitoringRecord,
}

/// Execute `sleeper replay`
pub fn execute(args: ReplayArgs, engine: &DecisionEngine, format: OutputFormat) -> CliResult<()> {
    let snapshots: Vec<MetricSnapshot> = read_json(&args.snapshots)?;
    let mut record = MonitoringRecord::new(VideoId::new(args.video_id), args.published_at);

    let mut reports = Vec::new();
    let mut rejected = Vec::new();
    for step in engine.replay(&mut record, snapshots) {
        match step.outcome {
            Ok(report) => reports.push(report),
            Err(err) => rejected.push(Rejection {
                checkpoint: step.checkpoint,
                kind: err.kind(),
                error: err.to_string(),
            }),
        }
    }

    match format {
        OutputFormat::Table => {
            for r in &rejected {
                print_warning(&format!("Skipped {}: {}", r.checkpoint, r.error));
            }
            let rows: Vec<ReportRow> = reports.iter().map(ReportRow::from).collect();
            output::print_output(rows, format)?;
            print_info(&format!(
                "{} is {}{}",
                record.video_id,
                record.status(),
                record
                    .expected_checkpoint()
                    .map(|c| format!(", waiting for {}", c))
                    .unwrap_or_default()
            ));
        }
        _ => output::print_single(
            &ReplayOutput {
                reports,
                rejected,
                record: &record,
            },
            format,
        )?,
    }

    if let Some(path) = &args.save {
        write_json(path, &record)?;
        if matches!(format, OutputFormat::Table) {
            print_success(&format!("Record saved to {}", path.display()));
        }
    }
    Ok(())
}
