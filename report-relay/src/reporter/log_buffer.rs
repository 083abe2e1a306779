// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::events::{ConsoleLog, RunnerTestId};
use debug_ignore::DebugIgnore;
use indexmap::IndexMap;

/// Console logs held back until the test that produced them is known to the remote side.
///
/// Logs are queued per runner test identifier in arrival order. There is no bound on the number
/// of queued logs.
#[derive(Debug, Default)]
pub(super) struct ConsoleLogBuffer {
    pending: DebugIgnore<IndexMap<RunnerTestId, Vec<ConsoleLog>>>,
}

impl ConsoleLogBuffer {
    /// Queues a log for `test_id`.
    pub(super) fn push(&mut self, test_id: RunnerTestId, log: ConsoleLog) {
        self.pending.entry(test_id).or_default().push(log);
    }

    /// Removes and returns every log queued for `test_id`, oldest first.
    pub(super) fn take(&mut self, test_id: &RunnerTestId) -> Vec<ConsoleLog> {
        self.pending.shift_remove(test_id).unwrap_or_default()
    }

    /// Discards everything still queued, returning the number of (tests, logs) dropped.
    pub(super) fn clear(&mut self) -> (usize, usize) {
        let tests = self.pending.len();
        let logs = self.pending.values().map(Vec::len).sum();
        self.pending.clear();
        (tests, logs)
    }
}
