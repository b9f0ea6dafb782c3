// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Hubtips library - contextual tip dispatcher for package-discovery portals
//!
//! This crate picks which tip a signed-in user should see, when it should
//! appear, and when it goes away again. Rendering is left to the embedding
//! application, which subscribes to show/hide transitions and persists the
//! user's [`types::NotificationPrefs`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod clock;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod eligibility;
pub mod error;
pub mod prefs_store;
pub mod scheduler;

pub use error::{HubTipsError, Result};

/// Core data types shared by the catalog, filter and dispatcher
pub mod types {
    use crate::error::HubTipsError;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    // =========================================================================
    // Route Tags
    // =========================================================================

    /// Page classes a tip can be targeted at
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum RouteTag {
        /// Landing page
        Home,
        /// Package search results
        Search,
        /// A single package detail page
        Package,
        /// User/organization control panel
        ControlPanel,
    }

    impl RouteTag {
        /// Get the short code for this tag
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Home => "home",
                Self::Search => "search",
                Self::Package => "package",
                Self::ControlPanel => "control-panel",
            }
        }

        /// Resolve a location pathname to the page class it belongs to
        #[must_use]
        pub fn from_path(path: &str) -> Option<Self> {
            let path = path
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .trim_end_matches('/');

            if path.is_empty() {
                Some(Self::Home)
            } else if path == "/packages/search" || path.starts_with("/packages/search/") {
                Some(Self::Search)
            } else if path.starts_with("/packages/") {
                Some(Self::Package)
            } else if path == "/control-panel" || path.starts_with("/control-panel/") {
                Some(Self::ControlPanel)
            } else {
                None
            }
        }
    }

    impl fmt::Display for RouteTag {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.code())
        }
    }

    impl FromStr for RouteTag {
        type Err = HubTipsError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "home" => Ok(Self::Home),
                "search" => Ok(Self::Search),
                "package" => Ok(Self::Package),
                "control-panel" | "controlpanel" => Ok(Self::ControlPanel),
                _ => Err(HubTipsError::InvalidRouteTag(s.to_string())),
            }
        }
    }

    // =========================================================================
    // Breakpoints
    // =========================================================================

    /// Device-width classes reported by the UI layer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Breakpoint {
        /// Extra small (phones)
        Xs,
        /// Small (large phones)
        Sm,
        /// Medium (tablets)
        Md,
        /// Large (laptops)
        Lg,
        /// Extra large
        Xl,
        /// Extra extra large
        Xxl,
    }

    impl Breakpoint {
        /// Get the short code for this breakpoint
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Xs => "xs",
                Self::Sm => "sm",
                Self::Md => "md",
                Self::Lg => "lg",
                Self::Xl => "xl",
                Self::Xxl => "xxl",
            }
        }

        /// Mobile widths, where tips are never shown automatically
        #[must_use]
        pub fn is_small(&self) -> bool {
            matches!(self, Self::Xs | Self::Sm)
        }
    }

    impl fmt::Display for Breakpoint {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.code())
        }
    }

    impl FromStr for Breakpoint {
        type Err = HubTipsError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "xs" => Ok(Self::Xs),
                "sm" => Ok(Self::Sm),
                "md" => Ok(Self::Md),
                "lg" => Ok(Self::Lg),
                "xl" => Ok(Self::Xl),
                "xxl" => Ok(Self::Xxl),
                _ => Err(HubTipsError::InvalidBreakpoint(s.to_string())),
            }
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// A tip from the catalog, identified by a hash of its body
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NotificationMessage {
        /// Content hash of `body`
        pub id: String,
        /// Markdown body
        pub body: String,
        /// Page this tip is most relevant on
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub link_tip: Option<RouteTag>,
    }

    // =========================================================================
    // User Preferences
    // =========================================================================

    /// Per-user notification settings, owned and persisted by the caller
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NotificationPrefs {
        /// Whether the user wants tips at all
        pub enabled: bool,
        /// IDs of tips already shown (grows monotonically)
        #[serde(default)]
        pub displayed: Vec<String>,
        /// When the last tip was shown, as epoch milliseconds on the wire
        #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
        pub last_displayed_time: Option<DateTime<Utc>>,
    }

    impl Default for NotificationPrefs {
        fn default() -> Self {
            Self {
                enabled: true,
                displayed: Vec::new(),
                last_displayed_time: None,
            }
        }
    }

    impl NotificationPrefs {
        /// Whether the tip with this ID has been shown before
        #[must_use]
        pub fn has_displayed(&self, id: &str) -> bool {
            self.displayed.iter().any(|d| d == id)
        }

        /// Record a shown tip. Returns `false` if it was already recorded,
        /// in which case only the timestamp moves.
        pub fn mark_displayed(&mut self, id: &str, now: DateTime<Utc>) -> bool {
            self.last_displayed_time = Some(now);
            if self.has_displayed(id) {
                return false;
            }
            self.displayed.push(id.to_string());
            true
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::dispatcher::{Dispatcher, NotificationSubscriber, Phase};
    pub use crate::eligibility::pick_notification;
    pub use crate::scheduler::{Scheduler, TimerHandle};
    pub use crate::types::*;
}
