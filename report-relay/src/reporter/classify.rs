// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::client::TestType;
use itertools::Itertools;

static BEFORE_KEYWORDS: &[&str] = &["beforeall", "before all", "beforeeach", "before each", "setup"];
static AFTER_KEYWORDS: &[&str] = &["afterall", "after all", "aftereach", "after each", "teardown"];

/// Classifies a test as a setup hook, a teardown hook or an ordinary test, based on its display
/// name.
///
/// This is a case-insensitive substring match against fixed keyword sets, with runs of whitespace
/// collapsed first. Setup keywords are checked before teardown keywords.
///
/// The runner's hook metadata is not consulted, so names that merely mention a keyword are
/// misclassified: a test called "setup database" is reported as a setup hook.
pub fn classify_test_type(name: &str) -> TestType {
    let normalized = name.split_whitespace().join(" ").to_lowercase();

    if BEFORE_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
        TestType::Before
    } else if AFTER_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
        TestType::After
    } else {
        TestType::Test
    }
}
