// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by report-relay.

use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::{error, fmt, io, time::Duration};
use thiserror::Error;

/// An error that occurred while parsing the reporter config.
#[derive(Debug, Error)]
#[error("failed to parse reporter config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// A remote reporting service operation, used to annotate errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientOperation {
    /// Opening a run.
    StartRun,
    /// Closing a run.
    FinishRun,
    /// Opening one or more suites.
    StartSuites,
    /// Opening a test.
    StartTest,
    /// Closing a test.
    FinishTest,
    /// Writing a log entry.
    SendLog,
    /// Sending an attachment.
    SendAttachment,
}

impl fmt::Display for ClientOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClientOperation::StartRun => "start run",
            ClientOperation::FinishRun => "finish run",
            ClientOperation::StartSuites => "start suites",
            ClientOperation::StartTest => "start test",
            ClientOperation::FinishTest => "finish test",
            ClientOperation::SendLog => "send log",
            ClientOperation::SendAttachment => "send attachment",
        };
        f.write_str(s)
    }
}

/// An error produced by a [`ReportClient`](crate::client::ReportClient) implementation.
///
/// The reporter treats these as opaque: they carry a message and, optionally, the underlying
/// transport error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ClientError {
    message: String,
    #[source]
    source: Option<Box<dyn error::Error + Send + Sync>>,
}

impl ClientError {
    /// Creates a new client error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new client error with the given message and underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An error returned by a [`Reporter`](crate::reporter::Reporter) lifecycle callback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// A call to the remote reporting service failed.
    #[error("error calling reporting service to {operation}")]
    Client {
        /// The operation that was attempted.
        operation: ClientOperation,

        /// The underlying error.
        #[source]
        error: ClientError,
    },

    /// The suite hierarchy for a test could not be resolved.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl ReportError {
    pub(crate) fn client(operation: ClientOperation) -> impl FnOnce(ClientError) -> Self {
        move |error| ReportError::Client { operation, error }
    }
}

/// An error that occurred while resolving the suite hierarchy for a test.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum HierarchyError {
    /// The test resolved to an empty suite path: every test must belong to at least one suite.
    #[error("test `{test_name}` does not belong to any suite (suite path is empty)")]
    EmptySuitePath {
        /// The name of the test.
        test_name: String,
    },
}

/// An error that occurred while waiting for an artifact file to stop changing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FileWaitError {
    /// The file did not stabilize within the allotted window.
    #[error("file `{path}` did not stabilize within {timeout:?}")]
    Timeout {
        /// The file being waited on.
        path: Utf8PathBuf,

        /// The overall timeout.
        timeout: Duration,
    },

    /// Reading metadata for the file failed.
    #[error("error reading metadata for `{path}`")]
    Metadata {
        /// The file being waited on.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while uploading an artifact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UploadError {
    /// The artifact file never became stable.
    #[error("error waiting for artifact file")]
    Wait(#[from] FileWaitError),

    /// Reading the artifact file failed.
    #[error("error reading artifact `{path}`")]
    Read {
        /// The artifact path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The reporting service rejected the attachment.
    #[error("error sending attachment to reporting service")]
    Client(#[source] ClientError),

    /// The upload task panicked or was aborted.
    #[error("upload task did not complete")]
    Join(#[source] tokio::task::JoinError),
}

/// An error that occurred while extracting a source excerpt around a failing line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnippetError {
    /// The source file could not be read.
    #[error("error reading source file `{path}`")]
    Read {
        /// The source path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The reported line is not within the file.
    #[error("line {line} is out of range for `{path}` ({line_count} lines)")]
    LineOutOfRange {
        /// The source path.
        path: Utf8PathBuf,

        /// The 1-based line that was requested.
        line: u32,

        /// The number of lines in the file.
        line_count: usize,
    },
}

/// Displays an error along with its chain of causes.
///
/// Used for local diagnostics, where the full chain is more useful than the top-level message.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut cause = self.error.source();
        if cause.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(error) = cause {
            write!(f, "\n  - {error}")?;
            cause = error.source();
        }

        Ok(())
    }
}
