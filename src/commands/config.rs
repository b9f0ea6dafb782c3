// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - prints the effective layered configuration

use super::CommandContext;
use anyhow::{Context, Result};

/// Print the effective configuration
pub fn run(ctx: &CommandContext) -> Result<()> {
    let rendered = if ctx.json {
        serde_json::to_string_pretty(&ctx.config).context("Failed to serialize config")?
    } else {
        toml::to_string_pretty(&ctx.config).context("Failed to serialize config")?
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
