// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the library surface
//!
//! The dispatcher itself never fails; these cover parsing caller input,
//! loading catalogs and reading or writing the prefs file.

use std::path::PathBuf;

/// Library result alias
pub type Result<T, E = HubTipsError> = std::result::Result<T, E>;

/// Errors raised outside the (infallible) dispatch path
#[derive(Debug, thiserror::Error)]
pub enum HubTipsError {
    /// Unknown device breakpoint
    #[error("invalid breakpoint: {0} (expected xs, sm, md, lg, xl or xxl)")]
    InvalidBreakpoint(String),

    /// Unknown route tag
    #[error("invalid route tag: {0} (expected home, search, package or control-panel)")]
    InvalidRouteTag(String),

    /// Catalog document could not be parsed
    #[error("invalid notification catalog: {0}")]
    Catalog(#[source] serde_json::Error),

    /// Prefs document could not be parsed or serialized
    #[error("invalid notification prefs: {0}")]
    Prefs(#[source] serde_json::Error),

    /// Filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration layering failed
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
