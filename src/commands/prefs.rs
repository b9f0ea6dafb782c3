// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Prefs command - inspect and edit the stored notification prefs

use super::CommandContext;
use anyhow::{Context, Result};

/// What to do with the stored prefs
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PrefsAction {
    /// Print the current prefs
    Show,
    /// Delete the prefs file
    Reset,
    /// Turn tips on
    Enable,
    /// Turn tips off
    Disable,
}

/// Run the prefs command
pub fn run(ctx: &CommandContext, action: PrefsAction) -> Result<()> {
    let store = ctx.prefs_store();

    match action {
        PrefsAction::Show => {
            let prefs = store.load().context("Failed to load notification prefs")?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            } else {
                println!("enabled: {}", prefs.enabled);
                println!("displayed: {}", prefs.displayed.len());
                for id in &prefs.displayed {
                    println!("  {id}");
                }
                match prefs.last_displayed_time {
                    Some(t) => println!("last displayed: {}", t.to_rfc3339()),
                    None => println!("last displayed: never"),
                }
            }
        }
        PrefsAction::Reset => {
            if store.reset()? {
                println!("Removed {}", store.path().display());
            } else {
                println!("Nothing to reset");
            }
        }
        PrefsAction::Enable | PrefsAction::Disable => {
            let mut prefs = store.load().context("Failed to load notification prefs")?;
            prefs.enabled = action == PrefsAction::Enable;
            store
                .save(&prefs)
                .with_context(|| format!("Failed to save {}", store.path().display()))?;
            println!("Tips {}", if prefs.enabled { "enabled" } else { "disabled" });
        }
    }

    Ok(())
}
