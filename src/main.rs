// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use macos_calendar_mcp::config::Config;
use macos_calendar_mcp::mcp::calendar_server;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "macos-calendar-mcp")]
#[command(about = "MCP server for macOS Calendar: list, create, search, delete and fix events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,
    /// Print the tool catalog as JSON
    Tools,
    /// Run one tool and print its text result
    Call {
        /// Tool name, e.g. list-calendars
        tool: String,
        /// Arguments as a JSON object
        args: Option<String>,
    },
}

fn init_logging(config: &Config, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => config
            .logging
            .level
            .parse::<Level>()
            .with_context(|| format!("Invalid log level '{}'", config.logging.level))?,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // stdout belongs to the protocol.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {e}"))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let config = match &config_path {
        Some(path) => Config::load_file(path)?,
        None => Config::default(),
    };
    init_logging(&config, cli.verbose)?;
    match &config_path {
        Some(path) => tracing::debug!(path = %path.display(), "Configuration loaded"),
        None => tracing::debug!("No config file; using defaults"),
    }
    let server = calendar_server(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            server.serve_stdio().await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools => {
            let specs = server.dispatcher().specs();
            println!("{}", serde_json::to_string_pretty(&specs)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Call { tool, args } => {
            let args: Value = match args {
                Some(raw) => serde_json::from_str(&raw).context("ARGS must be a JSON object")?,
                None => Value::Null,
            };
            let result = server.dispatcher().dispatch(&tool, args).await;
            if result.success {
                println!("{}", result.text());
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("{}", result.text());
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
