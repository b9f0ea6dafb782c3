// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Catalog command - lists the tips a user can be shown

use super::{headline, load_catalog, CommandContext};
use crate::types::NotificationMessage;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Entry<'a> {
    #[serde(flatten)]
    message: &'a NotificationMessage,
    displayed: bool,
}

/// Run the catalog command
pub fn run(ctx: &CommandContext, file: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(file)?;
    let prefs = ctx
        .prefs_store()
        .load()
        .context("Failed to load notification prefs")?;

    let entries: Vec<Entry<'_>> = catalog
        .iter()
        .map(|message| Entry {
            message,
            displayed: prefs.has_displayed(&message.id),
        })
        .collect();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Catalog is empty");
        return Ok(());
    }

    let shown = entries.iter().filter(|e| e.displayed).count();
    println!("{} tips ({} already shown):", entries.len(), shown);
    println!();

    for entry in &entries {
        let tag = entry
            .message
            .link_tip
            .map_or("generic", |t| t.code());
        let marker = if entry.displayed { "*" } else { " " };
        let line = headline(&entry.message.body);

        if ctx.color {
            println!("{} {} [{}] {}", marker, entry.message.id.cyan(), tag.yellow(), line);
        } else {
            println!("{} {} [{}] {}", marker, entry.message.id, tag, line);
        }
    }

    Ok(())
}
