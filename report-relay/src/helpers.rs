// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for report-relay.

use camino::{Utf8Path, Utf8PathBuf};

/// Utilities for pluralizing various words based on count.
pub(crate) mod plural {
    /// Returns "log" if `count` is 1, otherwise "logs".
    pub(crate) fn logs_str(count: usize) -> &'static str {
        if count == 1 { "log" } else { "logs" }
    }

    /// Returns "test" if `count` is 1, otherwise "tests".
    pub(crate) fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "upload" if `count` is 1, otherwise "uploads".
    pub(crate) fn uploads_str(count: usize) -> &'static str {
        if count == 1 { "upload" } else { "uploads" }
    }
}

/// Returns the process working directory, if it is representable as UTF-8.
pub(crate) fn current_dir_utf8() -> Option<Utf8PathBuf> {
    let dir = std::env::current_dir().ok()?;
    Utf8PathBuf::try_from(dir).ok()
}

/// Returns `path` relative to `base` when `path` lies strictly within `base`, and `path`
/// unchanged otherwise.
///
/// Relative paths always use forward slashes.
pub(crate) fn display_path_relative_to(path: &Utf8Path, base: Option<&Utf8Path>) -> Utf8PathBuf {
    match base.and_then(|base| path.strip_prefix(base).ok()) {
        Some(rel_path) if !rel_path.as_str().is_empty() => {
            convert_rel_path_to_forward_slash(rel_path)
        }
        _ => path.to_path_buf(),
    }
}

/// On Windows, convert relative paths to always use forward slashes.
#[cfg(windows)]
pub(crate) fn convert_rel_path_to_forward_slash(rel_path: &Utf8Path) -> Utf8PathBuf {
    rel_path.as_str().replace('\\', "/").into()
}

#[cfg(not(windows))]
pub(crate) fn convert_rel_path_to_forward_slash(rel_path: &Utf8Path) -> Utf8PathBuf {
    rel_path.to_path_buf()
}

/// Escapes text so that it can be placed inside a single markdown table cell.
pub(crate) fn escape_table_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Returns the language hint for a fenced code block, based on a file's extension.
pub(crate) fn code_fence_language(path: &Utf8Path) -> &'static str {
    match path.extension() {
        Some("ts" | "mts" | "cts") => "ts",
        Some("tsx") => "tsx",
        Some("js" | "mjs" | "cjs") => "js",
        Some("jsx") => "jsx",
        Some("rs") => "rust",
        Some("py") => "python",
        Some("json") => "json",
        _ => "",
    }
}
