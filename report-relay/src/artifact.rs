// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support for reading artifact files recorded by tests.
//!
//! Runners frequently announce an artifact (a screenshot, a video) while the file is still being
//! written. Before reading it, [`wait_for_stable_file`] polls the file's metadata until two
//! samples taken one poll interval apart agree on size and modification time.

use crate::{config::ArtifactWaitConfig, errors::FileWaitError};
use camino::Utf8Path;
use std::{io, time::SystemTime};
use tracing::debug;

/// The content type used when nothing better is known.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Waits until the file at `path` stops changing.
///
/// A file that does not exist yet is treated as still changing. Fails with
/// [`FileWaitError::Timeout`] if the file does not stabilize within `settings.timeout`.
pub async fn wait_for_stable_file(
    path: &Utf8Path,
    settings: ArtifactWaitConfig,
) -> Result<(), FileWaitError> {
    let wait = async {
        let mut previous = FileStamp::sample(path).await?;
        loop {
            tokio::time::sleep(settings.poll_interval).await;
            let current = FileStamp::sample(path).await?;
            match (&previous, &current) {
                (Some(previous), Some(current)) if previous == current => {
                    debug!(%path, len = current.len, "artifact file is stable");
                    return Ok(());
                }
                _ => previous = current,
            }
        }
    };

    match tokio::time::timeout(settings.timeout, wait).await {
        Ok(result) => result,
        Err(_) => Err(FileWaitError::Timeout {
            path: path.to_owned(),
            timeout: settings.timeout,
        }),
    }
}

/// Returns a content type for `path`, based on its extension.
pub fn guess_content_type(path: &Utf8Path) -> &'static str {
    let Some(extension) = path.extension() else {
        return DEFAULT_CONTENT_TYPE;
    };
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "json" => "application/json",
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "zip" => "application/zip",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    async fn sample(path: &Utf8Path) -> Result<Option<Self>, FileWaitError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(Some(Self {
                modified: metadata.modified().ok(),
                len: metadata.len(),
            })),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(FileWaitError::Metadata {
                path: path.to_owned(),
                error,
            }),
        }
    }
}
