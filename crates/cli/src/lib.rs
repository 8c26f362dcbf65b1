pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lightquote_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "lightquote",
    about = "Lighting quote intake operator CLI",
    long_about = "Inspect extraction responses, drive the quote intake wizard, and check webhook configuration.",
    after_help = "Examples:\n  lightquote normalize response.json\n  lightquote extract schedule.pdf\n  lightquote replay script.json --offline\n  lightquote config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Normalize the products found in a saved extraction webhook response")]
    Normalize {
        #[arg(help = "Path to the JSON response body")]
        response: PathBuf,
    },
    #[command(about = "Upload a document to the extraction webhook and print normalized products")]
    Extract {
        #[arg(help = "Path to the document to upload")]
        document: PathBuf,
    },
    #[command(about = "Apply a JSON list of wizard actions to a fresh session")]
    Replay {
        #[arg(help = "Path to the JSON action script")]
        script: PathBuf,
        #[arg(long, help = "Record submissions in memory instead of posting them")]
        offline: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Normalize { response } => commands::normalize::run(&response),
        Command::Extract { document } => commands::extract::run(&document),
        Command::Replay { script, offline } => commands::replay::run(&script, offline),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command payload. A config that
/// fails to load falls back to compact `warn`; the command reports the failure.
fn init_logging() {
    let (level, format) = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => (config.logging.level, config.logging.format),
        Err(_) => ("warn".to_string(), LogFormat::Compact),
    };
    let rust_log = std::env::var("RUST_LOG").ok();

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(log_filter(&level, rust_log.as_deref()))
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// `RUST_LOG` directives take precedence over the configured level.
fn log_filter(configured_level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(configured_level))
}
