//! hamlog - contact log analytics for amateur radio operators
//!
//! Validates call signs in contact logs, counts contacts per call sign and
//! per country, and enriches each call sign with its QSO history.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "hamlog")]
#[command(about = "Contact log analytics for amateur radio")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./hamlog.toml or ~/.config/hamlog/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate, count and enrich call signs from contact logs
    Run(cmd::run::RunArgs),
    /// Show the table entry each call sign resolves to
    Lookup(cmd::lookup::LookupArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(hamlog_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    hamlog_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Lookup(args) => cmd::lookup::run(args, &config).map(|()| ExitCode::SUCCESS),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Output directory",
                &config.output.default_dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Workers",
                &format!(
                    "{} ({} partitions)",
                    config.workers.default, config.workers.partitions
                ),
            ]);
            table.add_row(vec!["Lookup URL", &config.enrich.base_url]);
            table.add_row(vec![
                "Lookups in flight",
                &format!("{} per partition", config.enrich.max_concurrency),
            ]);
            table.add_row(vec![
                "Lookup timeout",
                &format!("{}s", config.enrich.timeout_secs),
            ]);
            table.add_row(vec![
                "Max invalid",
                &format!("{}% of valid", config.gate.max_invalid_percent),
            ]);
            table.add_row(vec!["Watched sign", &config.input.watch_sign]);
            table.add_row(vec![
                "Call sign table",
                &config.input.table.display().to_string(),
            ]);

            eprintln!("\n{table}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
