// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! JSON file store for notification prefs, used by the CLI in place of an
//! application's user-preference backend

use crate::error::{HubTipsError, Result};
use crate::types::NotificationPrefs;
use std::fs;
use std::path::{Path, PathBuf};

/// File name inside the data directory
pub const PREFS_FILE: &str = "prefs.json";

/// Prefs persisted as a single JSON document
#[derive(Debug, Clone)]
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    /// Store at `<data_dir>/prefs.json`
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PREFS_FILE),
        }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read prefs, or defaults when nothing has been saved yet
    pub fn load(&self) -> Result<NotificationPrefs> {
        if !self.path.exists() {
            return Ok(NotificationPrefs::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| HubTipsError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(HubTipsError::Prefs)
    }

    /// Write prefs, creating the data directory if needed
    pub fn save(&self, prefs: &NotificationPrefs) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| HubTipsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(prefs).map_err(HubTipsError::Prefs)?;
        fs::write(&self.path, json).map_err(|source| HubTipsError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Forget everything. Returns whether a file was removed.
    pub fn reset(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(HubTipsError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
