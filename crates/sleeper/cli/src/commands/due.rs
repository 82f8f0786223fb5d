//! Due-checkpoint resolution

use crate::error::CliResult;
use crate::output::{self, print_info, print_warning, OutputFormat};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use sleeper_types::{resolve_due, Checkpoint};

/// Arguments for `sleeper due`
#[derive(Args)]
pub struct DueArgs {
    /// Publication time (RFC 3339)
    #[arg(long)]
    pub published_at: DateTime<Utc>,

    /// Evaluation time (RFC 3339), defaults to the current time
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct DueOutput {
    published_at: DateTime<Utc>,
    now: DateTime<Utc>,
    elapsed_hours: f64,
    due: Option<Checkpoint>,
    window_start: Option<DateTime<Utc>>,
    window_end: Option<DateTime<Utc>>,
}

/// Execute `sleeper due`
pub fn execute(args: DueArgs, format: OutputFormat) -> CliResult<()> {
    let now = args.now.unwrap_or_else(Utc::now);
    let due = resolve_due(args.published_at, now);
    let window = due.map(|c| {
        let at = c.due_time(args.published_at);
        (at - c.tolerance(), at + c.tolerance())
    });

    let result = DueOutput {
        published_at: args.published_at,
        now,
        elapsed_hours: (now - args.published_at).num_minutes() as f64 / 60.0,
        due,
        window_start: window.map(|w| w.0),
        window_end: window.map(|w| w.1),
    };

    match format {
        OutputFormat::Table => {
            match (result.due, window) {
                (Some(checkpoint), Some((start, end))) => print_info(&format!(
                    "Checkpoint {} is due ({} to {})",
                    checkpoint,
                    start.format("%Y-%m-%d %H:%M"),
                    end.format("%Y-%m-%d %H:%M")
                )),
                _ => print_warning(&format!(
                    "No checkpoint due {:.1}h after publication",
                    result.elapsed_hours
                )),
            }
            Ok(())
        }
        _ => output::print_single(&result, format),
    }
}
