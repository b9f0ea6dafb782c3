// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use hubtips::catalog::Catalog;
use hubtips::eligibility::pick_notification;
use hubtips::types::NotificationPrefs;
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

static CATALOG: OnceLock<Catalog> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let Ok(prefs) = serde_json::from_slice::<NotificationPrefs>(data) else {
        return;
    };
    let catalog = CATALOG.get_or_init(Catalog::embedded);
    let now = chrono::Utc::now();
    let mut rng = rand::rngs::mock::StepRng::new(0, 1);
    if let Some(picked) = pick_notification(catalog, Some(&prefs), "/", true, now, &mut rng) {
        assert!(prefs.enabled);
        assert!(!prefs.has_displayed(&picked.id));
    }
});
