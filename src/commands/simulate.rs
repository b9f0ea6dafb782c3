// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Simulate command - runs one dispatcher session against real timers
//!
//! Plays the part of the embedding application: it subscribes to the
//! dispatcher, marks shown tips as displayed and persists the prefs.

use super::{load_catalog, make_rng, CommandContext};
use crate::config::DispatcherConfig;
use crate::dispatcher::Dispatcher;
use crate::scheduler::TokioScheduler;
use crate::types::{Breakpoint, NotificationMessage};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Slack added to timer waits so the dispatcher's own timer fires first
const WAIT_MARGIN: Duration = Duration::from_millis(500);

/// Options for the simulate command
#[derive(Debug, Clone)]
pub struct SimulateArgs<'a> {
    /// Location pathname the session starts on
    pub route: &'a str,
    /// Device breakpoint
    pub breakpoint: Breakpoint,
    /// Seed for reproducible picks
    pub seed: Option<u64>,
    /// Override for the start delay
    pub start_delay_ms: Option<u64>,
    /// Override for the display duration
    pub display_ms: Option<u64>,
    /// Catalog file instead of the embedded one
    pub file: Option<&'a Path>,
}

/// Run the simulate command
pub fn run(ctx: &CommandContext, args: &SimulateArgs<'_>) -> Result<()> {
    let catalog = load_catalog(args.file)?;

    let mut config = DispatcherConfig::try_from(&ctx.config.dispatcher)?;
    if let Some(ms) = args.start_delay_ms {
        config.start_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = args.display_ms {
        config.display_duration = Duration::from_millis(ms);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start tokio runtime")?;

    runtime.block_on(session(ctx, args, catalog, config))
}

async fn session(
    ctx: &CommandContext,
    args: &SimulateArgs<'_>,
    catalog: crate::catalog::Catalog,
    config: DispatcherConfig,
) -> Result<()> {
    let store = ctx.prefs_store();
    let mut prefs = store.load().context("Failed to load notification prefs")?;

    let start_wait = config.start_delay + WAIT_MARGIN;
    let display_wait = config.display_duration + WAIT_MARGIN;

    let dispatcher = Dispatcher::builder(catalog, Arc::new(TokioScheduler::current()))
        .config(config)
        .rng(make_rng(args.seed))
        .build();

    let (tx, mut rx) = mpsc::unbounded_channel::<Option<NotificationMessage>>();
    dispatcher.subscribe(Arc::new(move |notification: Option<&NotificationMessage>| {
        // Receiver is gone once the session returns
        let _ = tx.send(notification.cloned());
    }));

    info!("Starting session on {} ({})", args.route, args.breakpoint);
    dispatcher.start(prefs.clone(), args.breakpoint, args.route);

    let shown = match tokio::time::timeout(start_wait, rx.recv()).await {
        Ok(Some(Some(message))) => message,
        _ => {
            dispatcher.close();
            println!("No tip shown");
            return Ok(());
        }
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        println!("Showing {}", shown.id);
        println!("{}", shown.body);
    }

    prefs.mark_displayed(&shown.id, Utc::now());
    store
        .save(&prefs)
        .with_context(|| format!("Failed to save {}", store.path().display()))?;
    dispatcher.update_settings(prefs);
    debug!("Recorded {} as displayed", shown.id);

    match tokio::time::timeout(display_wait, rx.recv()).await {
        Ok(Some(None)) => {
            if !ctx.json {
                println!("Dismissed {}", shown.id);
            }
        }
        other => debug!("Session ended without auto-dismiss: {:?}", other.is_ok()),
    }

    dispatcher.close();
    Ok(())
}
