//! CLI entry point for the visit report tool.
//!
//! Provides subcommands for producing the usage report from analytics
//! exports, listing developer sessions, and checking visit consistency.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use visit_report::analyzers::analyzer::analyze;
use visit_report::analyzers::countries::IsoCountries;
use visit_report::{
    classify::classify_sessions,
    config::ReportConfig,
    diagnostics::visits_with_multiple_sessions,
    loader::{InputPaths, load_snapshot},
    logging,
    output::{render_report, write_json, write_report},
};

#[derive(Parser)]
#[command(name = "visit_report")]
#[command(about = "Summarize real user behavior from web analytics exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Directory holding session_data.csv, website_event.csv and event_data.csv
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Session attribute export (overrides --data-dir)
    #[arg(long)]
    sessions: Option<PathBuf>,

    /// Website event export (overrides --data-dir)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Custom event data export (overrides --data-dir)
    #[arg(long)]
    event_data: Option<PathBuf>,

    /// JSON file overriding the built-in rules
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Inputs {
    fn paths(&self) -> InputPaths {
        let defaults = InputPaths::from_dir(&self.data_dir);
        InputPaths {
            sessions: self.sessions.clone().unwrap_or(defaults.sessions),
            events: self.events.clone().unwrap_or(defaults.events),
            event_data: self.event_data.clone().unwrap_or(defaults.event_data),
        }
    }

    fn config(&self) -> Result<ReportConfig> {
        match &self.config {
            Some(path) => ReportConfig::load(path),
            None => Ok(ReportConfig::default()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the usage report
    Report {
        #[command(flatten)]
        inputs: Inputs,

        /// Text file to write the report to
        #[arg(short, long, default_value = "latest_analytics_report.txt")]
        output: PathBuf,

        /// Optional: also write the report as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Do not print the report to stdout
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
    },
    /// List sessions classified as developer/test traffic
    DevSessions {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// List visits recorded under more than one session
    CheckVisits {
        #[command(flatten)]
        inputs: Inputs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = logging::init(&logging::LogSettings::from_env())?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            inputs,
            output,
            json,
            quiet,
        } => {
            let config = inputs.config()?;
            let snapshot = load_snapshot(&inputs.paths())?;
            let report = analyze(&snapshot, &config, &IsoCountries);

            let lines = render_report(&report);
            if !quiet {
                for line in &lines {
                    println!("{line}");
                }
            }
            write_report(&output, &lines)?;

            if let Some(json_path) = json {
                write_json(&json_path, &report)?;
            }
        }
        Commands::DevSessions { inputs } => {
            let config = inputs.config()?;
            let snapshot = load_snapshot(&inputs.paths())?;
            let dev = classify_sessions(&snapshot.sessions, &config.blackout);

            for (session_id, rule) in dev.iter() {
                println!("{session_id}\t{rule}");
            }
            info!(dev_sessions = dev.len(), "Developer sessions listed");
        }
        Commands::CheckVisits { inputs } => {
            let snapshot = load_snapshot(&inputs.paths())?;
            let shared = visits_with_multiple_sessions(&snapshot.events);

            for (visit_id, sessions) in &shared {
                println!("{visit_id}\t{}", sessions.join(", "));
            }
            if shared.is_empty() {
                info!("Every visit belongs to exactly one session");
            } else {
                warn!(visits = shared.len(), "Visits with multiple sessions found");
            }
        }
    }

    Ok(())
}
