// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::helpers::fenced_code_block;
use crate::{errors::SnippetError, events::SourceLocation, helpers::code_fence_language};
use swrite::{SWrite, swrite};

/// Reads the source around `location` and renders it as a markdown excerpt, with `context` lines
/// on either side of the failing line.
pub(super) async fn source_snippet(
    location: &SourceLocation,
    context: usize,
) -> Result<String, SnippetError> {
    let contents = tokio::fs::read_to_string(&location.file)
        .await
        .map_err(|error| SnippetError::Read {
            path: location.file.clone(),
            error,
        })?;
    format_snippet(location, &contents, context)
}

fn format_snippet(
    location: &SourceLocation,
    contents: &str,
    context: usize,
) -> Result<String, SnippetError> {
    let lines: Vec<&str> = contents.lines().collect();
    let index = (location.line as usize)
        .checked_sub(1)
        .filter(|index| *index < lines.len())
        .ok_or_else(|| SnippetError::LineOutOfRange {
            path: location.file.clone(),
            line: location.line,
            line_count: lines.len(),
        })?;

    let start = index.saturating_sub(context);
    let end = index.saturating_add(context).min(lines.len() - 1);
    let width = (end + 1).to_string().len();

    let mut excerpt = String::new();
    for (offset, line) in lines[start..=end].iter().enumerate() {
        let number = start + offset + 1;
        let marker = if number == index + 1 { '>' } else { ' ' };
        if !excerpt.is_empty() {
            excerpt.push('\n');
        }
        swrite!(excerpt, "{marker} {number:>width$} | {line}");
    }

    Ok(format!(
        "Source: `{location}`\n{}",
        fenced_code_block(&excerpt, code_fence_language(&location.file)),
    ))
}
