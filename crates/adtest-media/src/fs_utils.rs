//! Temporary media file ownership.
//!
//! Every file the pipeline touches is held as a [`TempPath`], so dropping it
//! on any exit path removes it from disk. The only file that outlives a run
//! is the one wrapped in [`ProcessedVideo`], and that one is removed when the
//! caller drops it.

use adtest_models::MediaMetadata;
use std::path::Path;
use tempfile::TempPath;
use tracing::debug;

use crate::error::MediaResult;

/// File suffix for all pipeline temp files.
pub const MEDIA_SUFFIX: &str = ".mp4";

fn reserve(work_dir: &Path, prefix: &str) -> MediaResult<TempPath> {
    std::fs::create_dir_all(work_dir)?;
    let path = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(MEDIA_SUFFIX)
        .tempfile_in(work_dir)?
        .into_temp_path();
    Ok(path)
}

/// Write downloaded bytes to a fresh `.mp4` temp file.
pub async fn materialize_input(bytes: &[u8], work_dir: &Path) -> MediaResult<TempPath> {
    let path = reserve(work_dir, "adtest-input-")?;
    tokio::fs::write(&path, bytes).await?;
    debug!(path = %path.display(), size = bytes.len(), "Saved input to temp file");
    Ok(path)
}

/// Reserve a fresh, empty `.mp4` temp path for transform output.
pub fn reserve_output_path(work_dir: &Path) -> MediaResult<TempPath> {
    reserve(work_dir, "adtest-output-")
}

/// A compliant video on disk, deleted when dropped.
#[derive(Debug)]
pub struct ProcessedVideo {
    path: TempPath,
    metadata: MediaMetadata,
    transformed: bool,
}

impl ProcessedVideo {
    pub(crate) fn new(path: TempPath, metadata: MediaMetadata, transformed: bool) -> Self {
        Self {
            path,
            metadata,
            transformed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata of the file as last probed.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Whether the pipeline had to transcode the input.
    pub fn was_transformed(&self) -> bool {
        self.transformed
    }

}
