// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coverage snapshots and their rendering as a markdown table.
//!
//! Runners hand coverage over in one of a few shapes. [`CoverageSnapshot`] is the tagged union
//! the reporter works with: a per-file map (anything implementing [`FileCoverageMap`]), a flat
//! aggregate-only summary, or data that matched neither shape. [`CoverageSnapshot::from_json`]
//! probes raw JSON for the istanbul report formats.

mod istanbul;
mod table;

pub use istanbul::*;

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Covered and total counts for one coverage metric.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct CoverageMetric {
    /// The number of covered items.
    pub covered: u64,

    /// The total number of items.
    pub total: u64,
}

impl CoverageMetric {
    /// Creates a new metric.
    pub fn new(covered: u64, total: u64) -> Self {
        Self { covered, total }
    }

    /// Returns the covered percentage. A metric with nothing to cover is 100% covered.
    pub fn pct(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.covered as f64 * 100.0 / self.total as f64
        }
    }

    fn merge(&mut self, other: CoverageMetric) {
        self.covered += other.covered;
        self.total += other.total;
    }
}

/// Coverage metrics for one file, or for a whole run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct CoverageSummary {
    /// Statement coverage.
    pub statements: CoverageMetric,

    /// Branch coverage.
    pub branches: CoverageMetric,

    /// Function coverage.
    pub functions: CoverageMetric,

    /// Line coverage.
    pub lines: CoverageMetric,
}

impl CoverageSummary {
    /// Adds the counts in `other` to this summary.
    pub fn merge(&mut self, other: &CoverageSummary) {
        self.statements.merge(other.statements);
        self.branches.merge(other.branches);
        self.functions.merge(other.functions);
        self.lines.merge(other.lines);
    }
}

/// Coverage data broken down per file.
pub trait FileCoverageMap: fmt::Debug + Send + Sync {
    /// Returns the files covered by this map.
    fn files(&self) -> Vec<Utf8PathBuf>;

    /// Returns the summary for one file, or `None` if the file is not part of the map.
    fn file_summary(&self, file: &Utf8Path) -> Option<CoverageSummary>;

    /// Returns the lines in `file` that were never executed, in ascending order.
    fn uncovered_lines(&self, file: &Utf8Path) -> Vec<u32>;

    /// Returns the summary across all files.
    fn summary(&self) -> CoverageSummary;
}

/// The coverage data for a run, as observed by the reporter.
#[derive(Debug)]
pub enum CoverageSnapshot {
    /// Coverage broken down per file.
    PerFile(Box<dyn FileCoverageMap>),

    /// Only aggregate coverage is available.
    Aggregate(CoverageSummary),

    /// The data did not match a known shape. It is rendered verbatim.
    Unrecognized(serde_json::Value),
}

impl CoverageSnapshot {
    /// Probes raw coverage JSON for a known shape.
    ///
    /// Recognized shapes, in the order they are tried:
    ///
    /// * an istanbul `coverage-final.json` map (per-file hit counts),
    /// * an istanbul `coverage-summary.json` map (`total` plus per-file summaries),
    /// * a bare summary object with `lines`, `statements`, `functions` or `branches` metrics.
    ///
    /// Anything else becomes [`CoverageSnapshot::Unrecognized`].
    pub fn from_json(value: serde_json::Value) -> Self {
        if let Some(map) = SummaryCoverageMap::from_final_json(&value) {
            return CoverageSnapshot::PerFile(Box::new(map));
        }
        if let Some(map) = SummaryCoverageMap::from_summary_json(&value) {
            if map.is_empty() {
                return CoverageSnapshot::Aggregate(map.summary());
            }
            return CoverageSnapshot::PerFile(Box::new(map));
        }
        if let Some(summary) = summary_from_json(&value) {
            return CoverageSnapshot::Aggregate(summary);
        }
        CoverageSnapshot::Unrecognized(value)
    }

    /// Renders this snapshot as a markdown table.
    ///
    /// File paths within `cwd` are shown relative to it. This never fails: data that cannot be
    /// tabulated is embedded in a fallback table instead.
    pub fn render_table(&self, cwd: Option<&Utf8Path>) -> String {
        table::render(self, cwd)
    }
}
