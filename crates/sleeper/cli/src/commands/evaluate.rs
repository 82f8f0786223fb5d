//! Single-snapshot evaluation

use super::{read_json, write_json};
use crate::error::CliResult;
use crate::output::{self, or_dash, percent, print_info, print_success, print_warning, OutputFormat};
use clap::Args;
use serde::Serialize;
use sleeper_engine::DecisionEngine;
use sleeper_types::{DecisionReport, MetricSnapshot, MonitoringRecord};
use std::path::PathBuf;
use tabled::Tabled;

/// Arguments for `sleeper evaluate`
#[derive(Args)]
pub struct EvaluateArgs {
    /// Monitoring record (JSON)
    #[arg(long)]
    pub record: PathBuf,

    /// Metric snapshot to evaluate (JSON)
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Save the updated record back to `--record`
    #[arg(long)]
    pub write: bool,
}

/// Table row for a decision report
#[derive(Debug, Serialize, Tabled)]
pub struct ReportRow {
    checkpoint: String,
    action: String,
    reason: String,
    #[tabled(rename = "ctr growth")]
    growth: String,
    #[tabled(rename = "vph growth")]
    vph_growth: String,
    explosion: bool,
    next: String,
    diagnosis: String,
    health: String,
}

impl From<&DecisionReport> for ReportRow {
    fn from(r: &DecisionReport) -> Self {
        Self {
            checkpoint: r.checkpoint.to_string(),
            action: r.action.to_string(),
            reason: r.reason.to_string(),
            growth: percent(r.growth_percent),
            vph_growth: percent(r.vph_growth_percent),
            explosion: r.explosion_detected,
            next: or_dash(r.next_checkpoint),
            diagnosis: r.diagnosis.syndrome.to_string(),
            health: format!("{} ({})", r.health.status, r.health.priority),
        }
    }
}

/// Execute `sleeper evaluate`
pub fn execute(args: EvaluateArgs, engine: &DecisionEngine, format: OutputFormat) -> CliResult<()> {
    let mut record: MonitoringRecord = read_json(&args.record)?;
    let snapshot: MetricSnapshot = read_json(&args.snapshot)?;

    let report = engine.evaluate(&mut record, snapshot)?;

    match format {
        OutputFormat::Table => {
            output::print_output(vec![ReportRow::from(&report)], format)?;
            if let Some(reason) = &report.long_term_reason {
                print_info(&format!("Long-term watch: {}", reason));
            }
            if let Some(reason) = report.completion_reason {
                print_info(&format!("Completed: {}", reason));
            }
            print_info(&format!("Diagnosis: {}", report.diagnosis.explanation));
            print_info(&format!("Suggested action: {}", report.diagnosis.action));
            if report.health.status.is_alert() {
                print_warning(&report.health.message);
            } else {
                print_info(&report.health.message);
            }
        }
        _ => output::print_single(&report, format)?,
    }

    if args.write {
        write_json(&args.record, &record)?;
        if matches!(format, OutputFormat::Table) {
            print_success(&format!("Record saved to {}", args.record.display()));
        }
    }
    Ok(())
}
