// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Duration, TimeZone, Utc};
use report_relay::{
    client::{
        Attachment, FinishTest, LogEntry, LogId, ReportClient, RunId, StartRun, StartSuites,
        StartTest, SuiteId, TestItemId,
    },
    config::{ArtifactWaitConfig, ReporterConfig},
    errors::ClientError,
    events::{ConsoleLog, ConsoleStream, RunnerTestId, TestCase},
    reporter::{Reporter, ReporterBuilder},
    time::Clock,
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration as StdDuration,
};

/// One call received by [`RecordingClient`], in a form that is easy to compare.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Call {
    StartRun(StartRun),
    FinishRun(RunId, DateTime<Utc>),
    StartSuites(StartSuites),
    StartTest(StartTest),
    FinishTest(FinishTest),
    SendLog(LogEntry),
    SendAttachment(Attachment),
}

impl Call {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Call::StartRun(_) => "start_run",
            Call::FinishRun(..) => "finish_run",
            Call::StartSuites(_) => "start_suites",
            Call::StartTest(_) => "start_test",
            Call::FinishTest(_) => "finish_test",
            Call::SendLog(_) => "send_log",
            Call::SendAttachment(_) => "send_attachment",
        }
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    next_id: usize,
}

/// A [`ReportClient`] that records calls in order and returns identifiers `id-1`, `id-2`, ...
#[derive(Debug, Default)]
pub(crate) struct RecordingClient {
    state: Mutex<State>,
    fail_attachments: bool,
    attachment_delay: Option<StdDuration>,
}

impl RecordingClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_failing_attachments(mut self) -> Self {
        self.fail_attachments = true;
        self
    }

    pub(crate) fn with_attachment_delay(mut self, delay: StdDuration) -> Self {
        self.attachment_delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn kinds(&self) -> Vec<&'static str> {
        self.calls().iter().map(Call::kind).collect()
    }

    pub(crate) fn count(&self, kind: &str) -> usize {
        self.calls().iter().filter(|call| call.kind() == kind).count()
    }

    pub(crate) fn log_messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendLog(entry) => Some(entry.message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> String {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state.next_id += 1;
        format!("id-{}", state.next_id)
    }
}

impl ReportClient for RecordingClient {
    async fn start_run(&self, request: StartRun) -> Result<RunId, ClientError> {
        Ok(RunId::new(self.record(Call::StartRun(request))))
    }

    async fn finish_run(&self, run_id: RunId, end_time: DateTime<Utc>) -> Result<(), ClientError> {
        self.record(Call::FinishRun(run_id, end_time));
        Ok(())
    }

    async fn start_suites(&self, request: StartSuites) -> Result<Vec<SuiteId>, ClientError> {
        let id = self.record(Call::StartSuites(request));
        Ok(vec![SuiteId::new(id)])
    }

    async fn start_test(&self, request: StartTest) -> Result<TestItemId, ClientError> {
        Ok(TestItemId::new(self.record(Call::StartTest(request))))
    }

    async fn finish_test(&self, request: FinishTest) -> Result<(), ClientError> {
        self.record(Call::FinishTest(request));
        Ok(())
    }

    async fn send_log(&self, entry: LogEntry) -> Result<LogId, ClientError> {
        Ok(LogId::new(self.record(Call::SendLog(entry))))
    }

    async fn send_attachment(&self, attachment: Attachment) -> Result<(), ClientError> {
        if let Some(delay) = self.attachment_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Call::SendAttachment(attachment));
        if self.fail_attachments {
            Err(ClientError::new("attachment storage is full"))
        } else {
            Ok(())
        }
    }
}

/// A clock that advances by one second every time it is read.
#[derive(Debug, Default)]
pub(crate) struct StepClock {
    ticks: AtomicI64,
}

impl StepClock {
    pub(crate) fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid epoch")
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        Self::epoch() + Duration::seconds(tick)
    }
}

pub(crate) const ROOT_DIR: &str = "/project";

pub(crate) fn test_config() -> ReporterConfig {
    let mut config = ReporterConfig::default();
    config
        .set_test_set_name("integration run")
        .set_description("relay integration tests")
        .set_root_dir(ROOT_DIR)
        .set_artifact_wait(ArtifactWaitConfig {
            poll_interval: StdDuration::from_millis(10),
            timeout: StdDuration::from_millis(500),
        });
    config
}

pub(crate) fn make_reporter(client: &Arc<RecordingClient>) -> Reporter<RecordingClient> {
    ReporterBuilder::new(test_config())
        .set_clock(Arc::new(StepClock::default()))
        .build(client.clone())
}

pub(crate) fn make_test(id: &str, name: &str, scopes: &[&str]) -> TestCase {
    TestCase::new(id, name, format!("{ROOT_DIR}/src/cart.test.ts"))
        .with_ancestors(scopes.iter().copied())
}

pub(crate) fn console(test_id: &str, stream: ConsoleStream, content: &str) -> ConsoleLog {
    ConsoleLog {
        test_id: Some(RunnerTestId::new(test_id)),
        content: content.to_owned(),
        stream,
        time: None,
    }
}
