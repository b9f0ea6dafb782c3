// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Pick command - runs the eligibility filter once against stored prefs

use super::{load_catalog, make_rng, CommandContext};
use crate::eligibility::pick_notification;
use crate::types::RouteTag;
use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use std::path::Path;
use tracing::info;

/// Options for the pick command
#[derive(Debug, Clone, Default)]
pub struct PickArgs<'a> {
    /// Location pathname the user is on
    pub route: &'a str,
    /// Enforce the daily limit
    pub date_limit: bool,
    /// Record the picked tip as displayed
    pub mark: bool,
    /// Seed for reproducible picks
    pub seed: Option<u64>,
    /// Catalog file instead of the embedded one
    pub file: Option<&'a Path>,
}

/// Run the pick command
pub fn run(ctx: &CommandContext, args: &PickArgs<'_>) -> Result<()> {
    let catalog = load_catalog(args.file)?;
    let store = ctx.prefs_store();
    let mut prefs = store.load().context("Failed to load notification prefs")?;
    let mut rng = make_rng(args.seed);
    let now = Utc::now();

    info!(
        "Picking for {} ({})",
        args.route,
        RouteTag::from_path(args.route).map_or("untracked", |t| t.code())
    );

    let picked = pick_notification(&catalog, Some(&prefs), args.route, args.date_limit, now, &mut rng).cloned();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&picked)?);
    } else {
        match &picked {
            Some(message) => {
                if ctx.color {
                    println!("{}", message.id.cyan());
                } else {
                    println!("{}", message.id);
                }
                println!("{}", message.body);
            }
            None => println!("No eligible tip"),
        }
    }

    if let (true, Some(message)) = (args.mark, &picked) {
        prefs.mark_displayed(&message.id, now);
        store
            .save(&prefs)
            .with_context(|| format!("Failed to save {}", store.path().display()))?;
        info!("Marked {} as displayed", message.id);
    }

    Ok(())
}
