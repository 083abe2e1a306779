// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{CoverageMetric, CoverageSummary, FileCoverageMap};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A [`FileCoverageMap`] holding precomputed per-file summaries.
///
/// Built from istanbul JSON reports by [`CoverageSnapshot::from_json`](super::CoverageSnapshot::from_json),
/// or directly with [`SummaryCoverageMap::add_file`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryCoverageMap {
    // None means "sum of the files".
    total: Option<CoverageSummary>,
    files: BTreeMap<Utf8PathBuf, FileEntry>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct FileEntry {
    summary: CoverageSummary,
    uncovered_lines: Vec<u32>,
}

impl SummaryCoverageMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file to the map. `uncovered_lines` need not be sorted.
    pub fn add_file(
        &mut self,
        path: impl Into<Utf8PathBuf>,
        summary: CoverageSummary,
        mut uncovered_lines: Vec<u32>,
    ) -> &mut Self {
        uncovered_lines.sort_unstable();
        uncovered_lines.dedup();
        self.files.insert(
            path.into(),
            FileEntry {
                summary,
                uncovered_lines,
            },
        );
        self
    }

    /// Returns true if the map has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Parses an istanbul `coverage-final.json` document.
    pub(super) fn from_final_json(value: &serde_json::Value) -> Option<Self> {
        let data = IndexMap::<String, FinalFileData>::deserialize(value).ok()?;
        if data.is_empty() {
            return None;
        }

        let mut map = Self::new();
        for (key, file) in data {
            let path = file.path.clone().unwrap_or_else(|| key.into());
            let (summary, uncovered_lines) = file.summarize();
            map.add_file(path, summary, uncovered_lines);
        }
        Some(map)
    }

    /// Parses an istanbul `coverage-summary.json` document.
    pub(super) fn from_summary_json(value: &serde_json::Value) -> Option<Self> {
        let mut data = IndexMap::<String, SummaryData>::deserialize(value).ok()?;
        let total = data.shift_remove("total")?.into_summary()?;

        let mut map = Self {
            total: Some(total),
            files: BTreeMap::new(),
        };
        for (path, file) in data {
            let summary = file.into_summary()?;
            map.add_file(path, summary, Vec::new());
        }
        Some(map)
    }
}

impl FileCoverageMap for SummaryCoverageMap {
    fn files(&self) -> Vec<Utf8PathBuf> {
        self.files.keys().cloned().collect()
    }

    fn file_summary(&self, file: &Utf8Path) -> Option<CoverageSummary> {
        self.files.get(file).map(|entry| entry.summary)
    }

    fn uncovered_lines(&self, file: &Utf8Path) -> Vec<u32> {
        self.files
            .get(file)
            .map(|entry| entry.uncovered_lines.clone())
            .unwrap_or_default()
    }

    fn summary(&self) -> CoverageSummary {
        match self.total {
            Some(total) => total,
            None => {
                let mut total = CoverageSummary::default();
                for entry in self.files.values() {
                    total.merge(&entry.summary);
                }
                total
            }
        }
    }
}

/// Parses a bare summary object: `{ "lines": { "total": .., "covered": .. }, ... }`.
pub(super) fn summary_from_json(value: &serde_json::Value) -> Option<CoverageSummary> {
    SummaryData::deserialize(value).ok()?.into_summary()
}

// ---
// istanbul coverage-final.json
// ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalFileData {
    #[serde(default)]
    path: Option<Utf8PathBuf>,
    statement_map: BTreeMap<String, SourceRange>,
    s: BTreeMap<String, u64>,
    #[serde(default)]
    f: BTreeMap<String, u64>,
    #[serde(default)]
    b: BTreeMap<String, Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct SourceRange {
    start: SourcePosition,
}

#[derive(Debug, Deserialize)]
struct SourcePosition {
    line: u32,
}

impl FinalFileData {
    /// Computes the file summary and its uncovered lines.
    ///
    /// A line's hit count is the highest count of any statement starting on it.
    fn summarize(&self) -> (CoverageSummary, Vec<u32>) {
        let statements = count_hits(self.s.values().copied());
        let functions = count_hits(self.f.values().copied());
        let branches = count_hits(self.b.values().flatten().copied());

        let mut line_hits = BTreeMap::<u32, u64>::new();
        for (id, range) in &self.statement_map {
            let hits = self.s.get(id).copied().unwrap_or(0);
            let entry = line_hits.entry(range.start.line).or_insert(0);
            *entry = (*entry).max(hits);
        }
        let lines = count_hits(line_hits.values().copied());
        let uncovered_lines = line_hits
            .iter()
            .filter(|(_, hits)| **hits == 0)
            .map(|(line, _)| *line)
            .collect();

        (
            CoverageSummary {
                statements,
                branches,
                functions,
                lines,
            },
            uncovered_lines,
        )
    }
}

fn count_hits(hits: impl Iterator<Item = u64>) -> CoverageMetric {
    let mut metric = CoverageMetric::default();
    for hit in hits {
        metric.total += 1;
        if hit > 0 {
            metric.covered += 1;
        }
    }
    metric
}

// ---
// istanbul coverage-summary.json
// ---

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(default)]
    lines: Option<MetricData>,
    #[serde(default)]
    statements: Option<MetricData>,
    #[serde(default)]
    functions: Option<MetricData>,
    #[serde(default)]
    branches: Option<MetricData>,
}

#[derive(Debug, Deserialize)]
struct MetricData {
    total: u64,
    covered: u64,
}

impl SummaryData {
    fn into_summary(self) -> Option<CoverageSummary> {
        if self.lines.is_none()
            && self.statements.is_none()
            && self.functions.is_none()
            && self.branches.is_none()
        {
            return None;
        }
        let metric = |data: Option<MetricData>| {
            data.map(|data| CoverageMetric::new(data.covered, data.total))
                .unwrap_or_default()
        };
        Some(CoverageSummary {
            statements: metric(self.statements),
            branches: metric(self.branches),
            functions: metric(self.functions),
            lines: metric(self.lines),
        })
    }
}
