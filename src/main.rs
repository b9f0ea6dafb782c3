// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Hubtips CLI - drive the tip dispatcher from a terminal

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use hubtips::commands::{self, pick::PickArgs, prefs::PrefsAction, simulate::SimulateArgs, CommandContext};
use hubtips::types::Breakpoint;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hubtips")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "HUBTIPS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, env = "HUBTIPS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tip catalog
    Catalog {
        /// Catalog JSON file (defaults to the built-in catalog)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Pick one tip for a page using the stored prefs
    Pick {
        /// Location pathname, e.g. /packages/helm/foo
        #[arg(short, long, default_value = "/")]
        route: String,

        /// Enforce the one-tip-per-day limit
        #[arg(long)]
        date_limit: bool,

        /// Record the picked tip as displayed
        #[arg(long)]
        mark: bool,

        /// Random seed for reproducible picks
        #[arg(long)]
        seed: Option<u64>,

        /// Catalog JSON file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Run a full dispatcher session with real timers
    Simulate {
        /// Location pathname the session starts on
        #[arg(short, long, default_value = "/")]
        route: String,

        /// Device breakpoint (xs, sm, md, lg, xl, xxl)
        #[arg(short, long, default_value = "lg")]
        breakpoint: Breakpoint,

        /// Random seed for reproducible picks
        #[arg(long)]
        seed: Option<u64>,

        /// Override the start delay
        #[arg(long)]
        start_delay_ms: Option<u64>,

        /// Override how long the tip stays up
        #[arg(long)]
        display_ms: Option<u64>,

        /// Catalog JSON file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Inspect or edit stored prefs
    Prefs {
        /// Action to perform
        #[arg(value_enum, default_value = "show")]
        action: PrefsAction,
    },

    /// Show the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = hubtips::config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = CommandContext {
        config,
        json: cli.json,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Catalog { file } => commands::catalog::run(&ctx, file.as_deref()),
        Commands::Pick { route, date_limit, mark, seed, file } => commands::pick::run(
            &ctx,
            &PickArgs {
                route: &route,
                date_limit,
                mark,
                seed,
                file: file.as_deref(),
            },
        ),
        Commands::Simulate { route, breakpoint, seed, start_delay_ms, display_ms, file } => {
            commands::simulate::run(
                &ctx,
                &SimulateArgs {
                    route: &route,
                    breakpoint,
                    seed,
                    start_delay_ms,
                    display_ms,
                    file: file.as_deref(),
                },
            )
        }
        Commands::Prefs { action } => commands::prefs::run(&ctx, action),
        Commands::Config => commands::config::run(&ctx),
        Commands::Completions { shell } => commands::completions::run(shell, Cli::command()),
    }
}
