// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod catalog;
pub mod completions;
pub mod config;
pub mod pick;
pub mod prefs;
pub mod simulate;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::prefs_store::PrefsStore;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::Path;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Effective configuration
    pub config: AppConfig,
    /// Emit JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
}

impl CommandContext {
    /// Prefs file under the configured data directory
    #[must_use]
    pub fn prefs_store(&self) -> PrefsStore {
        PrefsStore::in_dir(&self.config.data_dir)
    }
}

/// Load a catalog from `file`, or the embedded one
pub fn load_catalog(file: Option<&Path>) -> Result<Catalog> {
    match file {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Catalog::from_json(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
        None => Ok(Catalog::embedded()),
    }
}

/// Seeded RNG when a seed is given, entropy otherwise
#[must_use]
pub fn make_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// First line of a markdown body, for one-line listings
#[must_use]
pub fn headline(body: &str) -> &str {
    body.lines().next().unwrap_or_default().trim()
}
