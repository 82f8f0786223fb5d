//! sleeper CLI - Offline replay and inspection for sleeper-hit monitoring
//!
//! This CLI gives operators a terminal interface to:
//! - Evaluate a single snapshot against a stored record
//! - Replay a snapshot sequence through a fresh record
//! - List detected sleeper hits
//! - Resolve which checkpoint is due for a publication time
//! - Inspect the effective engine configuration

use clap::{Parser, Subcommand, ValueEnum};
use sleeper_engine::{ChannelProfile, DecisionEngine, DiagnosisThresholds};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{due, evaluate, hits, replay};
use config::CliConfig;
use error::CliResult;
use output::{print_error, OutputFormat};

/// sleeper CLI application
#[derive(Parser)]
#[command(name = "sleeper")]
#[command(about = "sleeper - Checkpoint-based sleeper-hit monitor", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SLEEPER_CONFIG")]
    config: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long)]
    output: Option<OutputFormat>,

    /// Channel profile; replaces the config file's profile and `[diagnosis]` table
    #[arg(short, long, env = "SLEEPER_PROFILE")]
    profile: Option<ProfileArg>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Channel profile names accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    Search,
    Viral,
    Generic,
}

impl From<ProfileArg> for ChannelProfile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Search => ChannelProfile::Search,
            ProfileArg::Viral => ChannelProfile::Viral,
            ProfileArg::Generic => ChannelProfile::Generic,
        }
    }
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Evaluate one snapshot against a record
    #[command(alias = "eval")]
    Evaluate(evaluate::EvaluateArgs),

    /// Replay a snapshot sequence through a fresh record
    Replay(replay::ReplayArgs),

    /// List sleeper hits across records
    Hits(hits::HitsArgs),

    /// Resolve the checkpoint due at a point in time
    Due(due::DueArgs),

    /// Show the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    // Load config
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(profile) = cli.profile {
        let profile = ChannelProfile::from(profile);
        config.monitor.profile = profile;
        config.monitor.diagnosis = DiagnosisThresholds::for_profile(profile);
    }
    let format = cli.output.or(config.output).unwrap_or_default();

    // Validates thresholds before any command runs
    let engine = DecisionEngine::new(config.monitor.clone())?;

    match cli.command {
        Commands::Evaluate(args) => evaluate::execute(args, &engine, format),
        Commands::Replay(args) => replay::execute(args, &engine, format),
        Commands::Hits(args) => hits::execute(args, format),
        Commands::Due(args) => due::execute(args, format),
        Commands::Config => match format {
            OutputFormat::Table => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            _ => output::print_single(&config.monitor, format),
        },
    }
}
