// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle events produced by the test runner.
//!
//! Events are produced by the host runner and consumed by a
//! [`Reporter`](crate::reporter::Reporter), one callback per event kind.

use crate::coverage::CoverageSnapshot;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use smol_str::SmolStr;
use std::fmt;

/// The runner's identifier for a test case.
///
/// Unique within a run; the runner never reuses an identifier once the test has finished.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RunnerTestId(SmolStr);

impl RunnerTestId {
    /// Creates a new runner test identifier.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunnerTestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A location in a source file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceLocation {
    /// The source file.
    pub file: Utf8PathBuf,

    /// The 1-based line number.
    pub line: u32,

    /// The 1-based column number, if known.
    pub column: Option<u32>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)?;
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        Ok(())
    }
}

/// A test case as described by the runner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    /// The runner's identifier for this test.
    pub id: RunnerTestId,

    /// The display name of the test.
    pub name: String,

    /// The path of the module (test file) that defines this test.
    pub module_path: Utf8PathBuf,

    /// Names of the nested scopes enclosing the test, outermost first.
    pub ancestors: Vec<String>,

    /// Where the test is defined, if known.
    pub location: Option<SourceLocation>,

    /// Free-form tags attached to the test.
    pub tags: Vec<String>,
}

impl TestCase {
    /// Creates a new test case with no ancestors, location or tags.
    pub fn new(
        id: impl Into<SmolStr>,
        name: impl Into<String>,
        module_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            id: RunnerTestId::new(id),
            name: name.into(),
            module_path: module_path.into(),
            ancestors: Vec::new(),
            location: None,
            tags: Vec::new(),
        }
    }

    /// Sets the enclosing scope names, outermost first.
    pub fn with_ancestors(mut self, ancestors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the source location of the test.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the tags for the test.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// The terminal (or not yet terminal) state the runner reports for a test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TestState {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test was skipped.
    Skipped,

    /// The test was marked pending (todo).
    Pending,

    /// The test is queued and has not started.
    Queued,

    /// The test is still running.
    Running,
}

/// An error reported for a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestError {
    /// The human-readable message. May contain ANSI escape sequences.
    pub message: String,

    /// The raw stack trace, if any.
    pub stack: Option<String>,

    /// The location the error was raised at, if known.
    pub location: Option<SourceLocation>,
}

impl TestError {
    /// Creates a new error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            location: None,
        }
    }
}

/// The result the runner reports for a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCaseResult {
    /// The state of the test.
    pub state: TestState,

    /// Errors reported for the test, in order.
    pub errors: Vec<TestError>,
}

/// The stream a console log was written to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ConsoleStream {
    /// Standard output.
    Stdout,

    /// Standard error.
    Stderr,
}

/// Console output captured by the runner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConsoleLog {
    /// The test that produced the output. Output that cannot be correlated with a test carries
    /// no identifier.
    pub test_id: Option<RunnerTestId>,

    /// The captured text. May contain ANSI escape sequences.
    pub content: String,

    /// The stream the output was written to.
    pub stream: ConsoleStream,

    /// When the output was produced, if the runner reports it.
    pub time: Option<DateTime<Utc>>,
}

/// An artifact (screenshot, trace, video, ...) recorded by a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    /// The kind of artifact, as reported by the runner.
    pub kind: String,

    /// The path of the file holding the artifact.
    pub path: Utf8PathBuf,

    /// The MIME type, if the runner knows it.
    pub content_type: Option<String>,

    /// A description supplied by the runner.
    pub message: Option<String>,
}

/// A runner lifecycle event.
#[derive(Debug)]
pub enum RunnerEvent {
    /// The run started.
    RunStarted,

    /// A test case is about to run.
    TestCaseReady(TestCase),

    /// A test case reported its result.
    TestCaseResult {
        /// The test case.
        test: TestCase,

        /// Its result.
        result: TestCaseResult,
    },

    /// Console output was captured.
    ConsoleLog(ConsoleLog),

    /// A test recorded an artifact.
    ArtifactRecorded {
        /// The test that recorded the artifact.
        test_id: RunnerTestId,

        /// The artifact.
        artifact: Artifact,
    },

    /// Coverage data was collected.
    CoverageObserved(CoverageSnapshot),

    /// The run ended.
    RunEnded,
}
