// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Eligibility filter - decides which tip, if any, a user should see next
//!
//! Tips targeted at the current page win over generic ones. Tips targeted
//! at some other page are never offered here; they wait until the user
//! visits that page.

use crate::catalog::Catalog;
use crate::types::{NotificationMessage, NotificationPrefs, RouteTag};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

/// Minimum spacing between automatic tips
#[must_use]
pub fn default_rate_limit() -> Duration {
    Duration::days(1)
}

/// Rate-limit window applied to a date-limited pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Time the pick is evaluated at
    pub now: DateTime<Utc>,
    /// How long after a display no new automatic tip is allowed
    pub window: Duration,
}

impl RateLimit {
    /// One tip per day, evaluated at `now`
    #[must_use]
    pub fn daily(now: DateTime<Utc>) -> Self {
        Self {
            now,
            window: default_rate_limit(),
        }
    }

    /// Whether a tip shown at `last` still blocks a new one.
    /// Timestamps in the future count as recent.
    #[must_use]
    pub fn blocks(&self, last: DateTime<Utc>) -> bool {
        self.now.signed_duration_since(last) < self.window
    }
}

/// Pick a tip for the page at `route` (a location pathname).
///
/// With `date_limited` set, a tip shown less than a day before `now`
/// suppresses the pick.
pub fn pick_notification<'a, R: Rng + ?Sized>(
    catalog: &'a Catalog,
    prefs: Option<&NotificationPrefs>,
    route: &str,
    date_limited: bool,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<&'a NotificationMessage> {
    let limit = date_limited.then(|| RateLimit::daily(now));
    pick_for_tag(catalog, prefs, RouteTag::from_path(route), limit, rng)
}

/// Pick a tip for an already-resolved page class
pub fn pick_for_tag<'a, R: Rng + ?Sized>(
    catalog: &'a Catalog,
    prefs: Option<&NotificationPrefs>,
    tag: Option<RouteTag>,
    limit: Option<RateLimit>,
    rng: &mut R,
) -> Option<&'a NotificationMessage> {
    let prefs = prefs.filter(|p| p.enabled)?;

    if prefs.displayed.len() >= catalog.len() {
        return None;
    }

    if let (Some(limit), Some(last)) = (limit, prefs.last_displayed_time) {
        if limit.blocks(last) {
            return None;
        }
    }

    let mut buckets = candidates(catalog, prefs);

    let targeted = tag
        .and_then(|t| buckets.remove(&Some(t)))
        .filter(|group| !group.is_empty());

    let group = match targeted {
        Some(group) => group,
        None => buckets.remove(&None)?,
    };

    choose(&group, rng)
}

/// Tips not yet shown, grouped by target page (`None` = generic)
#[must_use]
pub fn candidates<'a>(
    catalog: &'a Catalog,
    prefs: &NotificationPrefs,
) -> BTreeMap<Option<RouteTag>, Vec<&'a NotificationMessage>> {
    let displayed: HashSet<&str> = prefs.displayed.iter().map(String::as_str).collect();

    let mut buckets: BTreeMap<Option<RouteTag>, Vec<&NotificationMessage>> = BTreeMap::new();
    for message in catalog.iter().filter(|m| !displayed.contains(m.id.as_str())) {
        buckets.entry(message.link_tip).or_default().push(message);
    }
    buckets
}

fn choose<'a, R: Rng + ?Sized>(
    group: &[&'a NotificationMessage],
    rng: &mut R,
) -> Option<&'a NotificationMessage> {
    if group.is_empty() {
        return None;
    }
    group.get(rng.gen_range(0..group.len())).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn msg(id: &str, tag: Option<RouteTag>) -> NotificationMessage {
        NotificationMessage {
            id: id.into(),
            body: format!("body of {id}"),
            link_tip: tag,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap()
    }

    fn fresh_prefs() -> NotificationPrefs {
        NotificationPrefs::default()
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_messages(vec![
            msg("a", None),
            msg("b", Some(RouteTag::Package)),
            msg("c", Some(RouteTag::Search)),
        ])
    }

    #[test]
    fn test_disabled_prefs_never_pick() {
        let catalog = sample_catalog();
        let prefs = NotificationPrefs {
            enabled: false,
            ..fresh_prefs()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_notification(&catalog, Some(&prefs), "/", false, now(), &mut rng).is_none());
    }

    #[test]
    fn test_missing_prefs_never_pick() {
        let catalog = sample_catalog();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_notification(&catalog, None, "/", false, now(), &mut rng).is_none());
    }

    #[test]
    fn test_route_match_wins() {
        let catalog = sample_catalog();
        let prefs = fresh_prefs();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_notification(&catalog, Some(&prefs), "/packages/helm/foo", false, now(), &mut rng);
            assert_eq!(picked.map(|m| m.id.as_str()), Some("b"));
        }
    }

    #[test]
    fn test_unmatched_route_falls_back_to_generic() {
        let catalog = sample_catalog();
        let prefs = fresh_prefs();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = pick_notification(&catalog, Some(&prefs), "/stats", false, now(), &mut rng);
        assert_eq!(picked.map(|m| m.id.as_str()), Some("a"));
    }

    #[test]
    fn test_exhausted_route_bucket_falls_back_to_generic() {
        let catalog = sample_catalog();
        let prefs = NotificationPrefs {
            displayed: vec!["b".into()],
            ..fresh_prefs()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let picked = pick_notification(&catalog, Some(&prefs), "/packages/helm/foo", false, now(), &mut rng);
        assert_eq!(picked.map(|m| m.id.as_str()), Some("a"));
    }

    #[test]
    fn test_other_route_tips_are_not_offered() {
        let catalog = sample_catalog();
        let prefs = NotificationPrefs {
            displayed: vec!["a".into()],
            ..fresh_prefs()
        };
        let mut rng = StdRng::seed_from_u64(3);
        // "b" and "c" remain, but neither targets the home page
        assert!(pick_notification(&catalog, Some(&prefs), "/", false, now(), &mut rng).is_none());
    }

    #[test]
    fn test_exhausted_catalog() {
        let catalog = sample_catalog();
        let prefs = NotificationPrefs {
            displayed: vec!["a".into(), "b".into(), "c".into()],
            ..fresh_prefs()
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert!(pick_notification(&catalog, Some(&prefs), "/packages/x/y", false, now(), &mut rng).is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::default();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(pick_notification(&catalog, Some(&fresh_prefs()), "/", false, now(), &mut rng).is_none());
    }

    #[test]
    fn test_date_limit() {
        let catalog = sample_catalog();
        let mut rng = StdRng::seed_from_u64(5);

        let recent = NotificationPrefs {
            last_displayed_time: Some(now() - Duration::minutes(10)),
            ..fresh_prefs()
        };
        assert!(pick_notification(&catalog, Some(&recent), "/", true, now(), &mut rng).is_none());
        // Manual picks ignore the limit
        assert!(pick_notification(&catalog, Some(&recent), "/", false, now(), &mut rng).is_some());

        let old = NotificationPrefs {
            last_displayed_time: Some(now() - Duration::days(2)),
            ..fresh_prefs()
        };
        assert!(pick_notification(&catalog, Some(&old), "/", true, now(), &mut rng).is_some());
    }

    #[test]
    fn test_rate_limit_boundary() {
        let limit = RateLimit::daily(now());
        assert!(limit.blocks(now() - Duration::hours(23)));
        assert!(!limit.blocks(now() - Duration::days(1)));
        assert!(limit.blocks(now() + Duration::minutes(5)));
    }

    #[test]
    fn test_candidates_grouping() {
        let catalog = sample_catalog();
        let prefs = NotificationPrefs {
            displayed: vec!["c".into()],
            ..fresh_prefs()
        };
        let buckets = candidates(&catalog, &prefs);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[&None][0].id, "a");
        assert_eq!(buckets[&Some(RouteTag::Package)][0].id, "b");
        assert!(!buckets.contains_key(&Some(RouteTag::Search)));
    }
}
