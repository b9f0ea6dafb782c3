// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use hubtips::catalog::Catalog;
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(catalog) = Catalog::from_json(json) {
            let ids: HashSet<_> = catalog.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids.len(), catalog.len());
            assert!(catalog.iter().all(|m| !m.body.trim().is_empty()));
        }
    }
});
