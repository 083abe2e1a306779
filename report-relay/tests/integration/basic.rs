// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use pretty_assertions::assert_eq;
use report_relay::{
    client::{LogFormat, LogLevel, SuiteId, TestStatus, TestType},
    errors::{HierarchyError, ReportError},
    events::{
        ConsoleStream, RunnerEvent, SourceLocation, TestCase, TestCaseResult, TestError,
        TestState,
    },
};
use std::sync::Arc;
use test_case::test_case;

fn finished(state: TestState) -> TestCaseResult {
    TestCaseResult {
        state,
        errors: Vec::new(),
    }
}

#[tokio::test]
async fn failing_test_scenario() {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);
    let test = make_test("t1", "computes total", &["Cart"]);

    reporter
        .report_event(RunnerEvent::RunStarted)
        .await
        .expect("run started");
    reporter
        .report_event(RunnerEvent::TestCaseReady(test.clone()))
        .await
        .expect("test ready");
    reporter
        .report_event(RunnerEvent::TestCaseResult {
            test,
            result: TestCaseResult {
                state: TestState::Failed,
                errors: vec![TestError::new("Expected failure")],
            },
        })
        .await
        .expect("result reported");
    reporter
        .report_event(RunnerEvent::RunEnded)
        .await
        .expect("run ended");

    assert_eq!(
        client.kinds(),
        vec![
            "start_run",
            "start_suites",
            "start_suites",
            "start_test",
            "send_log",
            "finish_test",
            "finish_run",
        ]
    );

    let calls = client.calls();
    let Call::StartRun(run) = &calls[0] else {
        panic!("expected start_run first");
    };
    assert_eq!(run.name, "integration run");
    assert_eq!(run.description.as_deref(), Some("relay integration tests"));
    assert_eq!(run.start_time, StepClock::epoch());

    let Call::StartTest(start) = &calls[3] else {
        panic!("expected start_test, found {:?}", calls[3]);
    };
    assert_eq!(start.name, "computes total");
    assert_eq!(start.test_type, TestType::Test);
    assert_eq!(start.suite_id, SuiteId::new("id-3"));

    let Call::SendLog(log) = &calls[4] else {
        panic!("expected send_log, found {:?}", calls[4]);
    };
    assert_eq!(log.level, LogLevel::Error);
    assert_eq!(log.format, LogFormat::Markdown);
    assert_eq!(log.message, "Expected failure");

    let Call::FinishTest(finish) = &calls[5] else {
        panic!("expected finish_test, found {:?}", calls[5]);
    };
    assert_eq!(finish.status, TestStatus::Failed);
    assert_eq!(finish.test_id.as_str(), "id-4");
    assert_eq!(client.count("finish_run"), 1);
}

#[tokio::test]
async fn suites_are_created_once_per_prefix() {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);

    for (id, scopes) in [
        ("t1", &["Cart", "totals"][..]),
        ("t2", &["Cart", "totals"][..]),
        ("t3", &["Cart", "discounts"][..]),
        ("t4", &["Cart"][..]),
    ] {
        reporter
            .on_test_case_ready(&make_test(id, "works", scopes))
            .await
            .expect("test ready");
    }

    let suites: Vec<_> = client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::StartSuites(request) => Some((
                request.parent.map(|parent| parent.to_string()),
                request.names.join("/"),
            )),
            _ => None,
        })
        .collect();
    assert_eq!(
        suites,
        vec![
            (None, "src/cart.test.ts".to_owned()),
            (Some("id-2".to_owned()), "Cart".to_owned()),
            (Some("id-3".to_owned()), "totals".to_owned()),
            (Some("id-3".to_owned()), "discounts".to_owned()),
        ]
    );
    assert_eq!(client.count("start_test"), 4);
}

#[tokio::test]
async fn console_output_keeps_relative_order() {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);
    let test = make_test("t1", "logs things", &["Cart"]);

    reporter.on_run_started().await.expect("run started");
    for line in ["one\n", "two\n"] {
        reporter
            .on_console_log(console("t1", ConsoleStream::Stdout, line))
            .await
            .expect("buffered");
    }
    assert_eq!(client.count("send_log"), 0, "nothing forwarded before ready");

    reporter.on_test_case_ready(&test).await.expect("test ready");
    reporter
        .on_console_log(console("t1", ConsoleStream::Stderr, "three\n"))
        .await
        .expect("forwarded");
    reporter
        .on_test_case_result(&test, &finished(TestState::Passed))
        .await
        .expect("result");

    assert_eq!(client.log_messages(), vec!["one", "two", "three"]);
    let levels: Vec<_> = client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::SendLog(entry) => Some(entry.level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![LogLevel::Info, LogLevel::Info, LogLevel::Warn]);
}

#[tokio::test]
async fn console_output_for_unstarted_tests_is_dropped_at_run_end() {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);

    reporter.on_run_started().await.expect("run started");
    reporter
        .on_console_log(console("ghost", ConsoleStream::Stdout, "boo"))
        .await
        .expect("buffered");
    reporter.on_run_ended().await.expect("run ended");

    assert_eq!(client.kinds(), vec!["start_run", "finish_run"]);
}

#[test_case(TestState::Passed, Some(TestStatus::Passed) ; "passed")]
#[test_case(TestState::Failed, Some(TestStatus::Failed) ; "failed")]
#[test_case(TestState::Skipped, Some(TestStatus::Skipped) ; "skipped")]
#[test_case(TestState::Pending, Some(TestStatus::Skipped) ; "pending")]
#[test_case(TestState::Queued, None ; "queued")]
#[test_case(TestState::Running, None ; "running")]
#[tokio::test]
async fn result_status_mapping(state: TestState, expected: Option<TestStatus>) {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);

    reporter
        .on_test_case_result(&make_test("t1", "mapped", &[]), &finished(state))
        .await
        .expect("result reported");

    let statuses: Vec<_> = client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::FinishTest(request) => Some(request.status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, expected.into_iter().collect::<Vec<_>>());
    // A result without a prior ready event still creates the test.
    assert_eq!(client.count("start_test"), 1);
}

#[test_case("beforeEach hook", TestType::Before ; "before each")]
#[test_case("afterAll cleanup", TestType::After ; "after all")]
#[test_case("computes total", TestType::Test ; "ordinary")]
#[tokio::test]
async fn hook_names_set_test_type(name: &str, expected: TestType) {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);
    reporter
        .on_test_case_ready(&make_test("t1", name, &["Cart"]))
        .await
        .expect("test ready");

    let test_types: Vec<_> = client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::StartTest(request) => Some(request.test_type),
            _ => None,
        })
        .collect();
    assert_eq!(test_types, vec![expected]);
}

#[tokio::test]
async fn error_snippet_is_logged_when_source_is_readable() {
    let dir = camino_tempfile::Utf8TempDir::new().expect("created temp dir");
    let source = dir.path().join("cart.test.ts");
    std::fs::write(
        &source,
        "it('totals', () => {\n  expect(total()).toBe(3)\n})\n",
    )
    .expect("wrote source");

    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);
    let test = TestCase::new("t1", "totals", source.clone());
    let mut error = TestError::new("\x1b[1mexpected\x1b[22m 2 to be 3");
    error.stack = Some("AssertionError: expected 2 to be 3".to_owned());
    error.location = Some(SourceLocation {
        file: source.clone(),
        line: 2,
        column: Some(19),
    });

    reporter
        .on_test_case_result(
            &test,
            &TestCaseResult {
                state: TestState::Failed,
                errors: vec![error],
            },
        )
        .await
        .expect("result reported");

    let messages = client.log_messages();
    assert_eq!(messages.len(), 3, "messages: {messages:#?}");
    assert_eq!(messages[0], "**expected** 2 to be 3");
    assert_eq!(messages[1], "```\nAssertionError: expected 2 to be 3\n```");
    assert!(
        messages[2].contains("> 2 |   expect(total()).toBe(3)"),
        "snippet: {}",
        messages[2]
    );
    assert!(messages[2].contains("```ts\n"), "snippet: {}", messages[2]);
}

#[tokio::test]
async fn test_outside_any_suite_is_rejected() {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);
    let error = reporter
        .report_event(RunnerEvent::TestCaseReady(TestCase::new("t1", "lost", "  ")))
        .await
        .expect_err("empty suite path");
    assert!(
        matches!(
            error,
            ReportError::Hierarchy(HierarchyError::EmptySuitePath { .. })
        ),
        "unexpected error: {error}"
    );
    assert_eq!(client.kinds(), vec!["start_run"]);
}
