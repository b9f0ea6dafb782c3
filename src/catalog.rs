// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Notification catalog - the fixed set of tips a user can be shown
//!
//! Each entry is identified by a content hash of its body, so an ID stays
//! stable across sessions for as long as the text is unchanged.

use crate::error::{HubTipsError, Result};
use crate::types::{NotificationMessage, RouteTag};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::warn;

/// Catalog compiled into the binary
const EMBEDDED_CATALOG: &str = include_str!("../data/notifications.json");

/// Number of hex characters kept from the digest
const ID_LEN: usize = 16;

/// Strategy for deriving a tip ID from its body
pub trait ContentHasher {
    /// Produce a stable identifier for `body`
    fn hash(&self, body: &str) -> String;
}

/// Default hasher: truncated hex SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash(&self, body: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body.as_bytes());
        let hash = hex::encode(hasher.finalize());
        hash[..ID_LEN].to_string()
    }
}

/// Raw catalog entry as written in the data file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Template {
    body: String,
    #[serde(default)]
    link_tip: Option<RouteTag>,
}

/// Immutable, ordered and deduplicated list of tips
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    messages: Vec<NotificationMessage>,
}

impl Catalog {
    /// Load the catalog compiled into the crate.
    ///
    /// Never fails: a malformed document yields an empty catalog.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_json(EMBEDDED_CATALOG).unwrap_or_else(|e| {
            warn!("Embedded notification catalog is unusable: {}", e);
            Self::default()
        })
    }

    /// Parse a JSON array of `{ body, linkTip? }` templates
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with(json, &Sha256Hasher)
    }

    /// Parse a catalog, deriving IDs with a custom hasher
    pub fn from_json_with(json: &str, hasher: &dyn ContentHasher) -> Result<Self> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(HubTipsError::Catalog)?;

        let messages = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<Template>(value) {
                Ok(template) => Some(template),
                Err(e) => {
                    warn!("Skipping catalog entry {}: {}", index, e);
                    None
                }
            })
            .filter(|template| !template.body.trim().is_empty())
            .map(|template| NotificationMessage {
                id: hasher.hash(&template.body),
                body: template.body,
                link_tip: template.link_tip,
            })
            .collect();

        Ok(Self::from_messages(messages))
    }

    /// Build a catalog from ready-made messages. Later duplicates of an ID
    /// are dropped.
    #[must_use]
    pub fn from_messages(messages: Vec<NotificationMessage>) -> Self {
        let mut seen = HashSet::new();
        let messages = messages
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        Self { messages }
    }

    /// Number of distinct tips
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the catalog holds no tips
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate tips in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, NotificationMessage> {
        self.messages.iter()
    }

    /// Look up a tip by ID
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NotificationMessage> {
        self.messages.iter().find(|m| m.id == id)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a NotificationMessage;
    type IntoIter = std::slice::Iter<'a, NotificationMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded();
        assert!(!catalog.is_empty());
        assert!(catalog.iter().all(|m| m.id.len() == ID_LEN));
        assert!(catalog.iter().any(|m| m.link_tip == Some(RouteTag::Package)));
        assert!(catalog.iter().any(|m| m.link_tip.is_none()));
    }

    #[test]
    fn test_ids_are_content_hashes() {
        let a = Catalog::from_json(r#"[{"body":"hello"}]"#).unwrap();
        let b = Catalog::from_json(r#"[{"body":"hello","linkTip":"search"}]"#).unwrap();
        let c = Catalog::from_json(r#"[{"body":"hello!"}]"#).unwrap();

        let id = &a.iter().next().unwrap().id;
        assert_eq!(id, &b.iter().next().unwrap().id);
        assert_ne!(id, &c.iter().next().unwrap().id);
        assert_eq!(id, &Sha256Hasher.hash("hello"));
    }

    #[test]
    fn test_invalid_and_duplicate_entries_are_skipped() {
        let json = r#"[
            {"body":"first"},
            {"body":"   "},
            {"body":"tagged","linkTip":"nowhere"},
            {"nobody":"x"},
            {"body":"first","linkTip":"home"},
            {"body":"second","linkTip":"control-panel"}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();

        let bodies: Vec<_> = catalog.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
        assert_eq!(catalog.iter().next().unwrap().link_tip, None);
        assert_eq!(catalog.iter().nth(1).unwrap().link_tip, Some(RouteTag::ControlPanel));
    }

    #[test]
    fn test_non_array_document_is_an_error() {
        assert!(matches!(
            Catalog::from_json(r#"{"body":"x"}"#),
            Err(HubTipsError::Catalog(_))
        ));
    }

    #[test]
    fn test_custom_hasher() {
        struct Len;
        impl ContentHasher for Len {
            fn hash(&self, body: &str) -> String {
                format!("len-{}", body.len())
            }
        }

        let catalog = Catalog::from_json_with(r#"[{"body":"ab"},{"body":"cd"},{"body":"xyz"}]"#, &Len).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("len-2").is_some());
        assert!(catalog.get("len-3").is_some());
    }
}
