// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use pretty_assertions::assert_eq;
use report_relay::events::{Artifact, RunnerEvent, RunnerTestId, TestCaseResult, TestState};
use std::{sync::Arc, time::Duration};

fn screenshot(path: impl Into<camino::Utf8PathBuf>) -> Artifact {
    Artifact {
        kind: "screenshot".to_owned(),
        path: path.into(),
        content_type: None,
        message: None,
    }
}

#[tokio::test]
async fn uploads_finish_before_run_closes() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    let path = dir.path().join("failure.png");
    std::fs::write(&path, b"\x89PNG").expect("wrote artifact");

    let client = Arc::new(RecordingClient::new().with_attachment_delay(Duration::from_millis(50)));
    let mut reporter = make_reporter(&client);
    let test = make_test("t1", "renders cart", &["Cart"]);

    reporter.on_test_case_ready(&test).await.expect("test ready");
    reporter
        .report_event(RunnerEvent::ArtifactRecorded {
            test_id: RunnerTestId::new("t1"),
            artifact: screenshot(path.clone()),
        })
        .await
        .expect("artifact recorded");
    assert_eq!(reporter.pending_uploads(), 1);

    reporter
        .on_test_case_result(
            &test,
            &TestCaseResult {
                state: TestState::Passed,
                errors: Vec::new(),
            },
        )
        .await
        .expect("result reported");
    reporter.on_run_ended().await.expect("run ended");
    assert_eq!(reporter.pending_uploads(), 0);

    let kinds = client.kinds();
    let attachment_pos = kinds
        .iter()
        .position(|kind| *kind == "send_attachment")
        .expect("attachment was sent");
    assert_eq!(kinds.last(), Some(&"finish_run"));
    assert!(attachment_pos < kinds.len() - 1);

    let calls = client.calls();
    let log = calls
        .iter()
        .find_map(|call| match call {
            Call::SendLog(entry) => Some(entry.clone()),
            _ => None,
        })
        .expect("artifact log was sent");
    assert_eq!(log.message, format!("Artifact (screenshot): {path}"));

    let Call::SendAttachment(attachment) = &calls[attachment_pos] else {
        panic!("expected send_attachment");
    };
    assert_eq!(attachment.file_name, "failure.png");
    assert_eq!(attachment.content_type, "image/png");
    assert_eq!(attachment.log_id.as_str(), "id-5");
    assert_eq!(&attachment.contents[..], b"\x89PNG");
}

#[tokio::test]
async fn failed_uploads_do_not_block_run_end() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    let present = dir.path().join("trace.zip");
    std::fs::write(&present, b"PK").expect("wrote artifact");

    let client = Arc::new(RecordingClient::new().with_failing_attachments());
    let mut reporter = make_reporter(&client);
    reporter
        .on_test_case_ready(&make_test("t1", "uploads", &[]))
        .await
        .expect("test ready");

    for artifact in [
        Artifact {
            kind: "trace".to_owned(),
            content_type: Some("application/x-trace".to_owned()),
            message: Some("Playwright trace".to_owned()),
            ..screenshot(present.clone())
        },
        // Never written: the wait for a stable file times out.
        screenshot(dir.path().join("missing.png")),
    ] {
        reporter
            .on_artifact_recorded(&RunnerTestId::new("t1"), artifact)
            .await
            .expect("artifact recorded");
    }
    assert_eq!(reporter.pending_uploads(), 2);

    reporter.on_run_ended().await.expect("run ended");
    assert_eq!(reporter.pending_uploads(), 0);
    assert_eq!(client.count("send_attachment"), 1);
    assert_eq!(client.count("finish_run"), 1);
    assert!(
        client
            .log_messages()
            .contains(&"Playwright trace".to_owned())
    );

    let content_types: Vec<_> = client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::SendAttachment(attachment) => Some(attachment.content_type),
            _ => None,
        })
        .collect();
    assert_eq!(content_types, vec!["application/x-trace".to_owned()]);
}

#[tokio::test]
async fn artifacts_for_unknown_tests_are_ignored() {
    let client = Arc::new(RecordingClient::new());
    let mut reporter = make_reporter(&client);
    reporter.on_run_started().await.expect("run started");
    reporter
        .on_artifact_recorded(&RunnerTestId::new("missing"), screenshot("/tmp/a.png"))
        .await
        .expect("artifact ignored");
    reporter.on_run_ended().await.expect("run ended");
    assert_eq!(client.kinds(), vec!["start_run", "finish_run"]);
}
