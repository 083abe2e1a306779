// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{CoverageMetric, CoverageSnapshot, CoverageSummary, FileCoverageMap};
use crate::helpers::{display_path_relative_to, escape_table_cell};
use camino::Utf8Path;
use swrite::{SWrite, swrite};

static HEADER: &str = "| File | Statements | Branches | Functions | Lines | Uncovered lines |\n\
                       | --- | --- | --- | --- | --- | --- |\n";
static ALL_FILES: &str = "All files";
static RAW_HEADER: &str = "| Coverage | Data |\n| --- | --- |\n";
static RAW_LABEL: &str = "Unrecognized coverage data";
static RAW_PLACEHOLDER: &str = "(coverage data could not be serialized)";

pub(super) fn render(snapshot: &CoverageSnapshot, cwd: Option<&Utf8Path>) -> String {
    match snapshot {
        CoverageSnapshot::PerFile(map) => render_file_map(map.as_ref(), cwd),
        CoverageSnapshot::Aggregate(summary) => {
            let mut out = HEADER.to_owned();
            write_row(&mut out, ALL_FILES, summary, "");
            out
        }
        CoverageSnapshot::Unrecognized(value) => render_raw(value),
    }
}

fn render_file_map(map: &dyn FileCoverageMap, cwd: Option<&Utf8Path>) -> String {
    let mut out = HEADER.to_owned();
    write_row(&mut out, ALL_FILES, &map.summary(), "");

    let mut files = map.files();
    files.sort();
    files.dedup();
    for file in files {
        let name = display_path_relative_to(&file, cwd);
        let uncovered = format_line_ranges(&map.uncovered_lines(&file));
        match map.file_summary(&file) {
            Some(summary) => write_row(&mut out, name.as_str(), &summary, &uncovered),
            None => {
                swrite!(
                    out,
                    "| {} | - | - | - | - | {} |\n",
                    escape_table_cell(name.as_str()),
                    uncovered,
                );
            }
        }
    }

    out
}

fn render_raw(value: &serde_json::Value) -> String {
    let data = match serde_json::to_string_pretty(value) {
        Ok(json) => escape_table_cell(&json),
        Err(_) => RAW_PLACEHOLDER.to_owned(),
    };
    let mut out = RAW_HEADER.to_owned();
    swrite!(out, "| {RAW_LABEL} | {data} |\n");
    out
}

fn write_row(out: &mut String, name: &str, summary: &CoverageSummary, uncovered: &str) {
    swrite!(
        out,
        "| {} | {} | {} | {} | {} | {} |\n",
        escape_table_cell(name),
        format_cell(summary.statements),
        format_cell(summary.branches),
        format_cell(summary.functions),
        format_cell(summary.lines),
        uncovered,
    );
}

fn format_cell(metric: CoverageMetric) -> String {
    format!("{:.1}% ({}/{})", metric.pct(), metric.covered, metric.total)
}

/// Collapses sorted line numbers into ranges: `[3, 4, 5, 9]` becomes `3-5, 9`.
fn format_line_ranges(lines: &[u32]) -> String {
    let mut out = String::new();
    let mut iter = lines.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(next) = end.checked_add(1) {
            if iter.peek() != Some(&next) {
                break;
            }
            end = next;
            iter.next();
        }
        if !out.is_empty() {
            out.push_str(", ");
        }
        if start == end {
            swrite!(out, "{start}");
        } else {
            swrite!(out, "{start}-{end}");
        }
    }
    out
}
