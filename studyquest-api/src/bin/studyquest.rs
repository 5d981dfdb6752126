//! Line-oriented StudyQuest front end.
//!
//! Reads one JSON request per line from stdin (or a single `--request`) and
//! prints one JSON reply per line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use studyquest_api::QuestApi;
use studyquest_core::config::QuestConfig;
use studyquest_core::telemetry::init_tracing;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "studyquest", version, about = "Turn study sessions into character progress")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "STUDYQUEST_CONFIG")]
    config: Option<PathBuf>,

    /// Database path, overriding the configuration.
    #[arg(long, env = "STUDYQUEST_DB")]
    db: Option<String>,

    /// Run a single request instead of reading stdin.
    #[arg(long)]
    request: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match QuestConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("studyquest: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => QuestConfig::default(),
    };
    if let Some(db) = cli.db {
        config.persistence.database_path = db;
    }

    if let Err(e) = init_tracing(&config.general) {
        eprintln!("studyquest: {e}");
        return ExitCode::FAILURE;
    }

    let api = match QuestApi::open(&config) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "Failed to open StudyQuest");
            return ExitCode::FAILURE;
        }
    };

    if let Some(raw) = cli.request {
        println!("{}", api.handle_json(&raw));
        return ExitCode::SUCCESS;
    }

    info!(db = %config.persistence.database_path, "Reading requests from stdin");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if writeln!(out, "{}", api.handle_json(&line)).is_err() {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
