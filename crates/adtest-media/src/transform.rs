//! FFmpeg transform execution.

use adtest_models::compliance::policy::MAX_FILE_SIZE_BYTES;
use adtest_models::TransformPlan;
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::command::{
    check_tool, output_with_timeout, stderr_tail, FfmpegCommand, TOOL_CHECK_TIMEOUT,
};
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Default timeout for one transform run.
pub const DEFAULT_TRANSFORM_TIMEOUT: Duration = Duration::from_secs(300);

/// Output encoding settings; fixed for every transform.
pub mod encoding {
    pub const VIDEO_CODEC: &str = "libx264";
    pub const PRESET: &str = "medium";
    pub const CRF: u8 = 23;
    pub const AUDIO_CODEC: &str = "aac";
    pub const AUDIO_BITRATE: &str = "128k";
}

/// Applies a transform plan to a media file.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Write a transformed copy of `input` to `output`.
    async fn transform(&self, input: &Path, output: &Path, plan: &TransformPlan) -> MediaResult<()>;
}

/// Scale-to-fit then letterbox to exactly `width`x`height`.
///
/// Scaling runs first so the pad offsets are computed on the scaled frame.
pub fn letterbox_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black",
        w = width,
        h = height
    )
}

/// Build the FFmpeg invocation for a plan.
pub fn build_transform_command(input: &Path, output: &Path, plan: &TransformPlan) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(input, output)
        .video_codec(encoding::VIDEO_CODEC)
        .preset(encoding::PRESET)
        .crf(encoding::CRF)
        .audio_codec(encoding::AUDIO_CODEC)
        .audio_bitrate(encoding::AUDIO_BITRATE);

    if let Some(max_duration) = plan.max_duration_seconds {
        cmd = cmd.trim_to(max_duration);
    }

    if let Some((width, height)) = plan.target_resolution {
        cmd = cmd.video_filter(letterbox_filter(width, height));
    }

    cmd
}

/// Transcoder backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: String,
    timeout: Duration,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", DEFAULT_TRANSFORM_TIMEOUT)
    }
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

/// Check the transform output exists, is non-empty and fits the size policy.
pub async fn verify_output(output: &Path) -> MediaResult<u64> {
    let size = match tokio::fs::metadata(output).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e.into()),
    };

    if size == 0 {
        return Err(MediaError::transform_failed(
            "FFmpeg did not produce output file",
            None,
            None,
        ));
    }

    if size > MAX_FILE_SIZE_BYTES {
        return Err(MediaError::OutputTooLarge { size_bytes: size });
    }

    Ok(size)
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        plan: &TransformPlan,
    ) -> MediaResult<()> {
        let tool = check_tool(&self.binary, TOOL_CHECK_TIMEOUT).await?;

        let cmd = build_transform_command(input, output, plan);
        let args = cmd.build_args();

        if let Some(seconds) = plan.max_duration_seconds {
            info!(max_duration = seconds, "Trimming video");
        }
        if let Some((width, height)) = plan.target_resolution {
            info!(width, height, "Scaling with padding");
        }
        debug!("Running FFmpeg: {} {}", self.binary, args.join(" "));

        let mut command = Command::new(tool);
        command.args(&args);

        let started = Instant::now();
        let result = output_with_timeout(command, self.timeout).await?;
        metrics::record_transform_duration(started.elapsed());

        let output_status = match result {
            Some(out) => out,
            None => {
                warn!(timeout_secs = self.timeout.as_secs(), "FFmpeg timed out, process killed");
                return Err(MediaError::TransformTimeout(self.timeout.as_secs()));
            }
        };

        if !output_status.status.success() {
            return Err(MediaError::transform_failed(
                "FFmpeg exited with non-zero status",
                stderr_tail(&output_status.stderr),
                output_status.status.code(),
            ));
        }

        let size = verify_output(output).await?;
        info!(
            size_mb = size as f64 / (1024.0 * 1024.0),
            "Video transformed successfully"
        );

        Ok(())
    }
}
