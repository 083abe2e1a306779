// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of the remote suite hierarchy for tests.
//!
//! A test's suite path is its module path followed by the names of its enclosing scopes. Each
//! prefix of that path is a suite on the remote side; suites are created lazily, parent first,
//! and memoized by their full prefix so each one is created exactly once per run.

use crate::{
    client::{ReportClient, RunId, StartSuites, SuiteId},
    errors::{ClientError, ClientOperation, HierarchyError, ReportError},
    events::TestCase,
    helpers::display_path_relative_to,
};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

/// Returns the suite path for `test`: the module path (relative to `root_dir` when it lies
/// within it), then each enclosing scope name, outermost first.
///
/// Segments that are empty after trimming are dropped.
pub(super) fn suite_path(test: &TestCase, root_dir: Option<&Utf8Path>) -> Vec<String> {
    let module = display_path_relative_to(&test.module_path, root_dir);
    std::iter::once(module.as_str())
        .chain(test.ancestors.iter().map(String::as_str))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Memoized remote suite identifiers, keyed by suite path prefix.
#[derive(Debug, Default)]
pub(super) struct SuiteResolver {
    suites: IndexMap<Vec<String>, SuiteId>,
}

impl SuiteResolver {
    /// Returns the remote identifier of the innermost suite in `path`, creating any missing
    /// suites along the way.
    ///
    /// Fails with [`HierarchyError::EmptySuitePath`] if `path` is empty.
    pub(super) async fn resolve<C: ReportClient>(
        &mut self,
        client: &C,
        run_id: &RunId,
        path: &[String],
        test_name: &str,
        start_time: DateTime<Utc>,
    ) -> Result<SuiteId, ReportError> {
        let mut parent: Option<SuiteId> = None;

        for depth in 1..=path.len() {
            let prefix = &path[..depth];
            let suite_id = match self.suites.get(prefix) {
                Some(suite_id) => suite_id.clone(),
                None => {
                    let name = &path[depth - 1];
                    let suite_id = client
                        .start_suites(StartSuites {
                            run_id: run_id.clone(),
                            parent: parent.clone(),
                            names: vec![name.clone()],
                            start_time,
                        })
                        .await
                        .map_err(ReportError::client(ClientOperation::StartSuites))?
                        .into_iter()
                        .next()
                        .ok_or_else(|| ReportError::Client {
                            operation: ClientOperation::StartSuites,
                            error: ClientError::new(format!(
                                "reporting service returned no identifier for suite `{name}`"
                            )),
                        })?;
                    debug!(suite = %name, %suite_id, depth, "created suite");
                    self.suites.insert(prefix.to_vec(), suite_id.clone());
                    suite_id
                }
            };
            parent = Some(suite_id);
        }

        parent.ok_or_else(|| {
            HierarchyError::EmptySuitePath {
                test_name: test_name.to_owned(),
            }
            .into()
        })
    }

    /// Returns the number of suites created so far.
    pub(super) fn len(&self) -> usize {
        self.suites.len()
    }
}
