// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    artifact::{guess_content_type, wait_for_stable_file},
    client::{Attachment, LogId, ReportClient, RunId, TestItemId},
    config::ArtifactWaitConfig,
    errors::{DisplayErrorChain, UploadError},
    helpers::plural,
};
use bytes::Bytes;
use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// An attachment upload waiting to be sent.
#[derive(Clone, Debug)]
pub(super) struct UploadRequest {
    pub(super) run_id: RunId,
    pub(super) test_id: TestItemId,
    pub(super) log_id: LogId,
    pub(super) path: Utf8PathBuf,
    pub(super) content_type: Option<String>,
    pub(super) wait: ArtifactWaitConfig,
}

/// Attachment uploads that have been started but not yet joined.
#[derive(Debug, Default)]
pub(super) struct PendingUploads {
    tasks: JoinSet<Result<(), UploadError>>,
}

impl PendingUploads {
    /// Starts uploading `request` in the background.
    pub(super) fn spawn<C: ReportClient>(&mut self, client: Arc<C>, request: UploadRequest) {
        self.tasks.spawn(upload_artifact(client, request));
    }

    pub(super) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every pending upload to settle. Failures are logged and counted, never
    /// propagated.
    ///
    /// Returns the number of uploads that failed.
    pub(super) async fn join_all(&mut self) -> usize {
        let total = self.tasks.len();
        if total == 0 {
            return 0;
        }
        debug!("waiting for {total} pending {}", plural::uploads_str(total));

        let mut failed = 0;
        while let Some(result) = self.tasks.join_next().await {
            let error = match result {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(error) => UploadError::Join(error),
            };
            failed += 1;
            warn!("artifact upload failed: {}", DisplayErrorChain::new(error));
        }

        if failed > 0 {
            warn!(
                "{failed} of {total} artifact {} failed",
                plural::uploads_str(total)
            );
        }
        failed
    }
}

/// Waits for the artifact file to stop changing, then sends its contents as an attachment.
async fn upload_artifact<C: ReportClient>(
    client: Arc<C>,
    request: UploadRequest,
) -> Result<(), UploadError> {
    let UploadRequest {
        run_id,
        test_id,
        log_id,
        path,
        content_type,
        wait,
    } = request;

    wait_for_stable_file(&path, wait).await?;
    let contents = tokio::fs::read(&path)
        .await
        .map_err(|error| UploadError::Read {
            path: path.clone(),
            error,
        })?;

    let file_name = path
        .file_name()
        .map_or_else(|| path.to_string(), str::to_owned);
    let content_type = content_type.unwrap_or_else(|| guess_content_type(&path).to_owned());
    debug!(%path, len = contents.len(), %content_type, "uploading artifact");

    client
        .send_attachment(Attachment {
            run_id,
            test_id,
            log_id,
            file_name,
            content_type,
            contents: Bytes::from(contents),
        })
        .await
        .map_err(UploadError::Client)
}
