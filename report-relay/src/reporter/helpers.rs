// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use regex::Regex;
use std::sync::LazyLock;

static SGR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[([0-9;]*)m").expect("SGR regex is valid"));

/// Converts ANSI-styled text into light markdown.
///
/// Runs of text that are bold or colored become `**bold**`; every other escape sequence is
/// removed. Emphasis never spans a line break, and surrounding whitespace is kept outside the
/// markers so that the result is valid markdown.
pub fn ansi_to_markdown(text: &str) -> String {
    let mut spans: Vec<(String, bool)> = Vec::new();
    let mut emphasized = false;
    let mut last = 0;

    for sgr in SGR_REGEX.captures_iter(text) {
        let (Some(whole), Some(params)) = (sgr.get(0), sgr.get(1)) else {
            continue;
        };
        push_span(&mut spans, &text[last..whole.start()], emphasized);
        emphasized = apply_sgr(params.as_str(), emphasized);
        last = whole.end();
    }
    push_span(&mut spans, &text[last..], emphasized);

    let mut out = String::with_capacity(text.len());
    for (span, emphasized) in spans {
        if emphasized {
            write_emphasized(&mut out, &span);
        } else {
            out.push_str(&span);
        }
    }
    out
}

/// Removes all ANSI escape sequences from `text`.
pub fn strip_ansi(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

/// Wraps `text` in a fenced code block, using a fence longer than any backtick run in the text.
pub(super) fn fenced_code_block(text: &str, language: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    let fence = "`".repeat((longest + 1).max(3));
    format!("{fence}{language}\n{text}\n{fence}")
}

fn push_span(spans: &mut Vec<(String, bool)>, segment: &str, emphasized: bool) {
    let segment = strip_ansi(segment);
    if segment.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some((text, last_emphasized)) if *last_emphasized == emphasized => text.push_str(&segment),
        _ => spans.push((segment, emphasized)),
    }
}

/// Returns the emphasis state after applying the SGR parameters `params`.
fn apply_sgr(params: &str, mut emphasized: bool) -> bool {
    if params.is_empty() {
        // ESC[m is a reset.
        return false;
    }
    for code in params.split(';') {
        match code.parse::<u16>() {
            Ok(0 | 22 | 39) => emphasized = false,
            Ok(1 | 30..=38 | 90..=97) => emphasized = true,
            _ => {}
        }
    }
    emphasized
}

fn write_emphasized(out: &mut String, span: &str) {
    for (index, line) in span.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push_str(line);
            continue;
        }
        let start = line.len() - line.trim_start().len();
        let end = start + trimmed.len();
        out.push_str(&line[..start]);
        out.push_str("**");
        out.push_str(trimmed);
        out.push_str("**");
        out.push_str(&line[end..]);
    }
}
