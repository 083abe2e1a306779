// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{client::TestStatus, events::TestState};

/// Maps the runner's state for a test onto a final remote status.
///
/// Returns `None` for states that are not terminal. Tests in such states are left open.
pub fn status_for_state(state: TestState) -> Option<TestStatus> {
    match state {
        TestState::Passed => Some(TestStatus::Passed),
        TestState::Failed => Some(TestStatus::Failed),
        TestState::Skipped | TestState::Pending => Some(TestStatus::Skipped),
        TestState::Queued | TestState::Running => None,
    }
}
