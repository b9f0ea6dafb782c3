// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use hubtips::types::RouteTag;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|path: &str| {
    let tag = RouteTag::from_path(path);
    // Query strings never change the page class
    assert_eq!(tag, RouteTag::from_path(&format!("{path}?q=1")));
});
