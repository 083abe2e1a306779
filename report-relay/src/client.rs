// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The remote reporting service, as seen by the reporter.
//!
//! The service exposes a session model: a run contains suites, suites contain suites and tests,
//! and tests own log entries and attachments. [`ReportClient`] is the sink the
//! [`Reporter`](crate::reporter::Reporter) drives; implementations own the wire format.

use crate::errors::ClientError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{fmt, future::Future};

macro_rules! remote_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(SmolStr);

        impl $name {
            /// Creates a new identifier.
            pub fn new(id: impl Into<SmolStr>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

remote_id!(
    /// The remote identifier for a run.
    RunId
);
remote_id!(
    /// The remote identifier for a suite.
    SuiteId
);
remote_id!(
    /// The remote identifier for a test.
    TestItemId
);
remote_id!(
    /// The remote identifier for a log entry.
    LogId
);

/// A key-value attribute attached to a run or test.
///
/// Attributes without a key are plain tags.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute key, if any.
    #[serde(default)]
    pub key: Option<String>,

    /// The attribute value.
    pub value: String,
}

impl Attribute {
    /// Creates a tag: an attribute with no key.
    pub fn tag(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: value.into(),
        }
    }

    /// Creates a key-value attribute.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

/// The kind of test entity opened on the remote side.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TestType {
    /// An ordinary test.
    Test,

    /// A setup hook (before-all, before-each and similar).
    Before,

    /// A teardown hook (after-all, after-each and similar).
    After,
}

/// The final status of a test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TestStatus {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test was skipped.
    Skipped,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => f.write_str("PASSED"),
            TestStatus::Failed => f.write_str("FAILED"),
            TestStatus::Skipped => f.write_str("SKIPPED"),
        }
    }
}

/// The severity of a log entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum LogLevel {
    /// Tracing output.
    Trace,
    /// Debugging output.
    Debug,
    /// Informational output.
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}

/// How the message of a log entry should be rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LogFormat {
    /// Plain text.
    Text,

    /// Markdown.
    Markdown,
}

/// A request to open a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartRun {
    /// The name of the test set.
    pub name: String,

    /// A free-form description of the run.
    pub description: Option<String>,

    /// Attributes attached to the run.
    pub attributes: Vec<Attribute>,

    /// When the run started.
    pub start_time: DateTime<Utc>,
}

/// A request to open one or more suites under the same parent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartSuites {
    /// The run the suites belong to.
    pub run_id: RunId,

    /// The parent suite, or `None` for root suites.
    pub parent: Option<SuiteId>,

    /// The suite names. The service returns one identifier per name, in order.
    pub names: Vec<String>,

    /// When the suites started.
    pub start_time: DateTime<Utc>,
}

/// A request to open a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartTest {
    /// The run the test belongs to.
    pub run_id: RunId,

    /// The suite the test belongs to.
    pub suite_id: SuiteId,

    /// The display name of the test.
    pub name: String,

    /// The kind of test entity.
    pub test_type: TestType,

    /// When the test started.
    pub start_time: DateTime<Utc>,

    /// A free-form description.
    pub description: Option<String>,

    /// Attributes attached to the test.
    pub attributes: Vec<Attribute>,
}

/// A request to close a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinishTest {
    /// The run the test belongs to.
    pub run_id: RunId,

    /// The test to close.
    pub test_id: TestItemId,

    /// The final status.
    pub status: TestStatus,

    /// When the test ended.
    pub end_time: DateTime<Utc>,
}

/// A log entry attached to a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    /// The run the log belongs to.
    pub run_id: RunId,

    /// The test the log belongs to.
    pub test_id: TestItemId,

    /// How the message should be rendered.
    pub format: LogFormat,

    /// The severity.
    pub level: LogLevel,

    /// When the log was produced.
    pub timestamp: DateTime<Utc>,

    /// The message.
    pub message: String,
}

/// A binary attachment tied to a test and a log entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    /// The run the attachment belongs to.
    pub run_id: RunId,

    /// The test the attachment belongs to.
    pub test_id: TestItemId,

    /// The log entry the attachment is shown under.
    pub log_id: LogId,

    /// The file name shown for the attachment.
    pub file_name: String,

    /// The MIME type of the contents.
    pub content_type: String,

    /// The file contents.
    pub contents: Bytes,
}

/// A client for the remote reporting service.
///
/// Every method is attempted exactly once per call; the reporter never retries. Attachment
/// uploads are run on spawned tasks, which is why implementations must be `Send + Sync +
/// 'static` and return `Send` futures.
pub trait ReportClient: Send + Sync + 'static {
    /// Opens a run, returning its identifier.
    fn start_run(
        &self,
        request: StartRun,
    ) -> impl Future<Output = Result<RunId, ClientError>> + Send;

    /// Closes a run.
    fn finish_run(
        &self,
        run_id: RunId,
        end_time: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Opens one suite per name under the same parent, returning one identifier per name in the
    /// same order.
    fn start_suites(
        &self,
        request: StartSuites,
    ) -> impl Future<Output = Result<Vec<SuiteId>, ClientError>> + Send;

    /// Opens a test, returning its identifier.
    fn start_test(
        &self,
        request: StartTest,
    ) -> impl Future<Output = Result<TestItemId, ClientError>> + Send;

    /// Closes a test with a final status.
    fn finish_test(
        &self,
        request: FinishTest,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Writes a log entry, returning its identifier.
    fn send_log(&self, entry: LogEntry)
    -> impl Future<Output = Result<LogId, ClientError>> + Send;

    /// Sends an attachment.
    fn send_attachment(
        &self,
        attachment: Attachment,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}
