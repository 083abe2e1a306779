// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps runner lifecycle events onto the reporting service's run/suite/test model.
//!
//! The main structure in this module is [`Reporter`].

use super::{
    classify::classify_test_type,
    helpers::{ansi_to_markdown, fenced_code_block, strip_ansi},
    hierarchy::{SuiteResolver, suite_path},
    log_buffer::ConsoleLogBuffer,
    snippet::source_snippet,
    status::status_for_state,
    uploads::{PendingUploads, UploadRequest},
};
use crate::{
    client::{
        Attribute, FinishTest, LogEntry, LogFormat, LogId, LogLevel, ReportClient, RunId,
        StartRun, StartTest, TestItemId, TestStatus, TestType,
    },
    config::ReporterConfig,
    coverage::CoverageSnapshot,
    errors::{ClientOperation, DisplayErrorChain, ReportError},
    events::{
        Artifact, ConsoleLog, ConsoleStream, RunnerEvent, RunnerTestId, SourceLocation, TestCase,
        TestCaseResult, TestError,
    },
    helpers::{current_dir_utf8, display_path_relative_to, plural},
    time::{Clock, SystemClock, format_timestamp},
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

/// The name of the top-level suite holding the coverage report.
pub const COVERAGE_SUITE_NAME: &str = "Coverage";

/// The name of the synthetic test carrying the coverage table.
pub const COVERAGE_TEST_NAME: &str = "Coverage report";

/// Reporter builder.
#[derive(Debug, Default)]
pub struct ReporterBuilder {
    config: ReporterConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl ReporterBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(config: ReporterConfig) -> Self {
        Self {
            config,
            clock: None,
        }
    }

    /// Sets the clock used for start and end timestamps. Defaults to [`SystemClock`].
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) -> &mut Self {
        self.clock = Some(clock);
        self
    }

    /// Creates a new reporter that sends everything to `client`.
    pub fn build<C: ReportClient>(&self, client: Arc<C>) -> Reporter<C> {
        let cwd = current_dir_utf8();
        let root_dir = self
            .config
            .root_dir()
            .map(Utf8Path::to_path_buf)
            .or_else(|| cwd.clone());

        Reporter {
            client,
            clock: self
                .clock
                .clone()
                .unwrap_or_else(|| Arc::new(SystemClock)),
            config: self.config.clone(),
            root_dir,
            cwd,
            run: None,
            suites: SuiteResolver::default(),
            tests: HashMap::new(),
            log_buffer: ConsoleLogBuffer::default(),
            uploads: PendingUploads::default(),
            coverage: None,
        }
    }
}

#[derive(Clone, Debug)]
struct ActiveRun {
    id: RunId,
    start_time: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct ActiveTest {
    id: TestItemId,
    name: String,
}

/// Relays the lifecycle events of one test run to a reporting service.
///
/// A reporter is constructed through [`ReporterBuilder`] and receives one call per runner event,
/// either through the individual `on_*` methods or through [`Self::report_event`]. It owns every
/// piece of per-run state: the remote run, the memoized suite hierarchy, the tests currently open,
/// console logs waiting for their test, artifact uploads in flight and the latest coverage
/// snapshot.
///
/// Callbacks must not be invoked concurrently; each one takes `&mut self`.
pub struct Reporter<C> {
    client: Arc<C>,
    clock: Arc<dyn Clock>,
    config: ReporterConfig,
    root_dir: Option<Utf8PathBuf>,
    cwd: Option<Utf8PathBuf>,
    run: Option<ActiveRun>,
    suites: SuiteResolver,
    tests: HashMap<RunnerTestId, ActiveTest>,
    log_buffer: ConsoleLogBuffer,
    uploads: PendingUploads,
    coverage: Option<CoverageSnapshot>,
}

impl<C: ReportClient> Reporter<C> {
    /// Dispatches a single runner event to the matching callback.
    pub async fn report_event(&mut self, event: RunnerEvent) -> Result<(), ReportError> {
        match event {
            RunnerEvent::RunStarted => self.on_run_started().await,
            RunnerEvent::TestCaseReady(test) => self.on_test_case_ready(&test).await.map(|_| ()),
            RunnerEvent::TestCaseResult { test, result } => {
                self.on_test_case_result(&test, &result).await
            }
            RunnerEvent::ConsoleLog(log) => self.on_console_log(log).await,
            RunnerEvent::ArtifactRecorded { test_id, artifact } => {
                self.on_artifact_recorded(&test_id, artifact).await
            }
            RunnerEvent::CoverageObserved(snapshot) => {
                self.on_coverage(snapshot);
                Ok(())
            }
            RunnerEvent::RunEnded => self.on_run_ended().await,
        }
    }

    /// Returns false: the reporter never takes over standard output.
    pub fn prints_to_stdio(&self) -> bool {
        false
    }

    /// Returns the identifier of the open run, if any.
    pub fn run_id(&self) -> Option<&RunId> {
        self.run.as_ref().map(|run| &run.id)
    }

    /// Returns the start time of the open run, if any.
    pub fn run_start_time(&self) -> Option<DateTime<Utc>> {
        self.run.as_ref().map(|run| run.start_time)
    }

    /// Returns the number of artifact uploads that have not been joined yet.
    pub fn pending_uploads(&self) -> usize {
        self.uploads.len()
    }

    /// Opens the remote run. Does nothing if a run is already open.
    pub async fn on_run_started(&mut self) -> Result<(), ReportError> {
        self.ensure_run().await.map(|_| ())
    }

    /// Makes `test` known to the reporting service, creating its suite chain and the test entity
    /// if necessary, then forwards any console output buffered for it.
    ///
    /// Returns the remote test identifier. Repeated calls for the same test return the same
    /// identifier without further remote calls.
    pub async fn on_test_case_ready(&mut self, test: &TestCase) -> Result<TestItemId, ReportError> {
        if let Some(active) = self.tests.get(&test.id) {
            return Ok(active.id.clone());
        }

        let run_id = self.ensure_run().await?;
        let path = suite_path(test, self.root_dir.as_deref());
        let start_time = self.clock.now();
        let suite_id = self
            .suites
            .resolve(&*self.client, &run_id, &path, &test.name, start_time)
            .await?;

        let test_type = classify_test_type(&test.name);
        let description = test
            .location
            .as_ref()
            .map(|location| self.display_location(location));
        let test_item_id = self
            .client
            .start_test(StartTest {
                run_id: run_id.clone(),
                suite_id,
                name: test.name.clone(),
                test_type,
                start_time,
                description,
                attributes: test.tags.iter().map(Attribute::tag).collect(),
            })
            .await
            .map_err(ReportError::client(ClientOperation::StartTest))?;
        debug!(test = %test.name, id = %test_item_id, ?test_type, "started test");

        self.tests.insert(
            test.id.clone(),
            ActiveTest {
                id: test_item_id.clone(),
                name: test.name.clone(),
            },
        );

        let buffered = self.log_buffer.take(&test.id);
        if !buffered.is_empty() {
            debug!(
                test = %test.name,
                "flushing {} buffered console {}",
                buffered.len(),
                plural::logs_str(buffered.len()),
            );
        }
        for log in buffered {
            self.send_console_log(&run_id, &test_item_id, log).await?;
        }

        Ok(test_item_id)
    }

    /// Reports the errors of a finished test and closes it with the mapped status.
    ///
    /// If the test was never reported ready, it is created first. If the runner state does not
    /// map to a status, the test is left open.
    pub async fn on_test_case_result(
        &mut self,
        test: &TestCase,
        result: &TestCaseResult,
    ) -> Result<(), ReportError> {
        let test_item_id = self.on_test_case_ready(test).await?;
        let run_id = self.ensure_run().await?;

        for error in &result.errors {
            self.report_test_error(&run_id, &test_item_id, error).await?;
        }

        let Some(status) = status_for_state(result.state) else {
            debug!(
                test = %test.name,
                state = ?result.state,
                "runner state is not terminal, leaving test open"
            );
            return Ok(());
        };

        self.client
            .finish_test(FinishTest {
                run_id,
                test_id: test_item_id,
                status,
                end_time: self.clock.now(),
            })
            .await
            .map_err(ReportError::client(ClientOperation::FinishTest))?;
        self.tests.remove(&test.id);
        debug!(test = %test.name, %status, "finished test");

        Ok(())
    }

    /// Forwards a chunk of console output to its test, or buffers it until the test is known.
    ///
    /// Output that does not name a test cannot be attributed and is dropped.
    pub async fn on_console_log(&mut self, log: ConsoleLog) -> Result<(), ReportError> {
        let Some(test_id) = log.test_id.clone() else {
            debug!(
                stream = ?log.stream,
                "dropping console output that is not associated with a test"
            );
            return Ok(());
        };

        let active = self.tests.get(&test_id).map(|active| active.id.clone());
        match (active, self.run.as_ref().map(|run| run.id.clone())) {
            (Some(test_item_id), Some(run_id)) => {
                self.send_console_log(&run_id, &test_item_id, log).await
            }
            _ => {
                self.log_buffer.push(test_id, log);
                Ok(())
            }
        }
    }

    /// Describes an artifact in a log entry on its test and starts uploading the artifact file.
    ///
    /// Artifacts for tests that are not currently open are ignored. The upload runs in the
    /// background and is joined in [`Self::on_run_ended`].
    pub async fn on_artifact_recorded(
        &mut self,
        test_id: &RunnerTestId,
        artifact: Artifact,
    ) -> Result<(), ReportError> {
        let (Some(active), Some(run)) = (self.tests.get(test_id), self.run.as_ref()) else {
            debug!(%test_id, path = %artifact.path, "ignoring artifact for unknown test");
            return Ok(());
        };
        let run_id = run.id.clone();
        let test_item_id = active.id.clone();
        let test_name = active.name.clone();

        let path = self.resolve_path(&artifact.path);
        let message = artifact.message.clone().unwrap_or_else(|| {
            format!(
                "Artifact ({}): {}",
                artifact.kind,
                display_path_relative_to(&path, self.root_dir.as_deref()),
            )
        });
        let log_id = self
            .send_log(&run_id, &test_item_id, LogLevel::Info, LogFormat::Text, message)
            .await?;

        debug!(test = %test_name, %path, "scheduling artifact upload");
        self.uploads.spawn(
            self.client.clone(),
            UploadRequest {
                run_id,
                test_id: test_item_id,
                log_id,
                path,
                content_type: artifact.content_type,
                wait: self.config.artifact_wait(),
            },
        );
        Ok(())
    }

    /// Stores the latest coverage snapshot, replacing any earlier one.
    pub fn on_coverage(&mut self, snapshot: CoverageSnapshot) {
        if self.coverage.replace(snapshot).is_some() {
            debug!("replacing earlier coverage snapshot");
        }
    }

    /// Joins pending uploads, reports coverage, and closes the run.
    ///
    /// Upload and coverage failures are logged, never returned. The reporter can be reused for a
    /// new run afterwards.
    pub async fn on_run_ended(&mut self) -> Result<(), ReportError> {
        self.uploads.join_all().await;

        let (tests, logs) = self.log_buffer.clear();
        if logs > 0 {
            warn!(
                "dropping {logs} console {} buffered for {tests} {} that never started",
                plural::logs_str(logs),
                plural::tests_str(tests),
            );
        }
        if !self.tests.is_empty() {
            debug!(
                "{} {} still open at run end",
                self.tests.len(),
                plural::tests_str(self.tests.len()),
            );
        }

        let Some(run) = self.run.clone() else {
            warn!("run ended without having been started, nothing to finish");
            if self.coverage.take().is_some() {
                warn!("discarding coverage snapshot: no run to attach it to");
            }
            self.reset();
            return Ok(());
        };

        if let Some(snapshot) = self.coverage.take() {
            if let Err(error) = self.report_coverage(&run.id, &snapshot).await {
                warn!(
                    "failed to report coverage: {}",
                    DisplayErrorChain::new(error)
                );
            }
        }

        self.reset();
        let end_time = self.clock.now();
        self.client
            .finish_run(run.id.clone(), end_time)
            .await
            .map_err(ReportError::client(ClientOperation::FinishRun))?;
        debug!(
            run = %run.id,
            start_time = %format_timestamp(run.start_time),
            end_time = %format_timestamp(end_time),
            "finished run"
        );

        Ok(())
    }

    // ---
    // Helper methods
    // ---

    async fn ensure_run(&mut self) -> Result<RunId, ReportError> {
        if let Some(run) = &self.run {
            return Ok(run.id.clone());
        }

        let start_time = self.clock.now();
        let id = self
            .client
            .start_run(StartRun {
                name: self.config.test_set_name().to_owned(),
                description: self.config.description().map(str::to_owned),
                attributes: self.config.attributes().to_vec(),
                start_time,
            })
            .await
            .map_err(ReportError::client(ClientOperation::StartRun))?;
        debug!(run = %id, start_time = %format_timestamp(start_time), "started run");

        self.run = Some(ActiveRun {
            id: id.clone(),
            start_time,
        });
        Ok(id)
    }

    fn reset(&mut self) {
        self.run = None;
        self.suites = SuiteResolver::default();
        self.tests.clear();
    }

    async fn report_test_error(
        &self,
        run_id: &RunId,
        test_id: &TestItemId,
        error: &TestError,
    ) -> Result<(), ReportError> {
        self.send_log(
            run_id,
            test_id,
            LogLevel::Error,
            LogFormat::Markdown,
            ansi_to_markdown(&error.message),
        )
        .await?;

        if let Some(stack) = &error.stack {
            self.send_log(
                run_id,
                test_id,
                LogLevel::Error,
                LogFormat::Markdown,
                fenced_code_block(strip_ansi(stack).trim_end(), ""),
            )
            .await?;
        }

        if let Some(location) = &error.location {
            let location = SourceLocation {
                file: self.resolve_path(&location.file),
                ..location.clone()
            };
            match source_snippet(&location, self.config.snippet_context_lines()).await {
                Ok(snippet) => {
                    let sent = self
                        .send_log(run_id, test_id, LogLevel::Info, LogFormat::Markdown, snippet)
                        .await;
                    if let Err(error) = sent {
                        warn!("failed to send source snippet: {}", DisplayErrorChain::new(error));
                    }
                }
                Err(error) => {
                    warn!(
                        "omitting source snippet for {location}: {}",
                        DisplayErrorChain::new(error)
                    );
                }
            }
        }

        Ok(())
    }

    async fn send_console_log(
        &self,
        run_id: &RunId,
        test_id: &TestItemId,
        log: ConsoleLog,
    ) -> Result<(), ReportError> {
        let level = match log.stream {
            ConsoleStream::Stdout => LogLevel::Info,
            ConsoleStream::Stderr => LogLevel::Warn,
        };
        let message = strip_ansi(&log.content);
        let message = message.trim_end_matches(['\r', '\n']);
        if message.is_empty() {
            return Ok(());
        }

        self.client
            .send_log(LogEntry {
                run_id: run_id.clone(),
                test_id: test_id.clone(),
                format: LogFormat::Text,
                level,
                timestamp: log.time.unwrap_or_else(|| self.clock.now()),
                message: message.to_owned(),
            })
            .await
            .map_err(ReportError::client(ClientOperation::SendLog))?;
        Ok(())
    }

    async fn send_log(
        &self,
        run_id: &RunId,
        test_id: &TestItemId,
        level: LogLevel,
        format: LogFormat,
        message: String,
    ) -> Result<LogId, ReportError> {
        self.client
            .send_log(LogEntry {
                run_id: run_id.clone(),
                test_id: test_id.clone(),
                format,
                level,
                timestamp: self.clock.now(),
                message,
            })
            .await
            .map_err(ReportError::client(ClientOperation::SendLog))
    }

    async fn report_coverage(
        &mut self,
        run_id: &RunId,
        snapshot: &CoverageSnapshot,
    ) -> Result<(), ReportError> {
        let start_time = self.clock.now();
        let suite_id = self
            .suites
            .resolve(
                &*self.client,
                run_id,
                &[COVERAGE_SUITE_NAME.to_owned()],
                COVERAGE_TEST_NAME,
                start_time,
            )
            .await?;

        let test_id = self
            .client
            .start_test(StartTest {
                run_id: run_id.clone(),
                suite_id,
                name: COVERAGE_TEST_NAME.to_owned(),
                test_type: TestType::After,
                start_time,
                description: None,
                attributes: Vec::new(),
            })
            .await
            .map_err(ReportError::client(ClientOperation::StartTest))?;

        let table = snapshot.render_table(self.cwd.as_deref());
        self.send_log(run_id, &test_id, LogLevel::Info, LogFormat::Markdown, table)
            .await?;

        self.client
            .finish_test(FinishTest {
                run_id: run_id.clone(),
                test_id,
                status: TestStatus::Passed,
                end_time: self.clock.now(),
            })
            .await
            .map_err(ReportError::client(ClientOperation::FinishTest))
    }

    /// Resolves relative paths against the root directory.
    fn resolve_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        match &self.root_dir {
            Some(root_dir) if path.is_relative() => root_dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn display_location(&self, location: &SourceLocation) -> String {
        SourceLocation {
            file: display_path_relative_to(&location.file, self.root_dir.as_deref()),
            ..location.clone()
        }
        .to_string()
    }
}
