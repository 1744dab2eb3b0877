//! FFprobe metadata extraction.

use adtest_models::compliance::NO_AUDIO_CODEC;
use adtest_models::MediaMetadata;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use crate::command::{check_tool, output_with_timeout, stderr_tail, TOOL_CHECK_TIMEOUT};
use crate::compliance::aspect_ratio_label;
use crate::error::{MediaError, MediaResult};

/// Default timeout for a single ffprobe run.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

const UNKNOWN_CODEC: &str = "unknown";

/// Reads media metadata from a file on disk.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Probe `path`. Either returns fully populated metadata or fails.
    async fn extract(&self, path: &Path) -> MediaResult<MediaMetadata>;
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl FfprobeStream {
    fn is(&self, codec_type: &str) -> bool {
        self.codec_type.as_deref() == Some(codec_type)
    }
}

fn parse_number<T: std::str::FromStr>(
    field: &str,
    value: Option<&String>,
) -> MediaResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| {
                MediaError::probe_failed(format!("invalid {} value '{}'", field, raw), None)
            }),
    }
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
///
/// The first video stream and the first audio stream win. Missing numeric
/// fields read as zero; malformed ones fail the probe.
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<MediaMetadata> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::probe_failed(format!("unparsable output: {}", e), None))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.is("video"))
        .ok_or(MediaError::NoVideoStream)?;
    let audio = probe.streams.iter().find(|s| s.is("audio"));

    let duration = parse_number::<f64>("duration", probe.format.duration.as_ref())?.unwrap_or(0.0);
    let file_size_bytes = parse_number::<u64>("size", probe.format.size.as_ref())?.unwrap_or(0);

    let width = video.width.unwrap_or(0);
    let height = video.height.unwrap_or(0);

    let video_codec = video
        .codec_name
        .clone()
        .unwrap_or_else(|| UNKNOWN_CODEC.to_string());
    let audio_codec = match audio {
        Some(stream) => stream
            .codec_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_CODEC.to_string()),
        None => NO_AUDIO_CODEC.to_string(),
    };

    Ok(MediaMetadata {
        width,
        height,
        duration,
        file_size_bytes,
        video_codec,
        audio_codec,
        aspect_ratio: aspect_ratio_label(width, height),
    })
}

/// Prober backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: String,
    timeout: Duration,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe", DEFAULT_PROBE_TIMEOUT)
    }
}

impl FfprobeProber {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn extract(&self, path: &Path) -> MediaResult<MediaMetadata> {
        let tool = check_tool(&self.binary, TOOL_CHECK_TIMEOUT).await?;

        let mut command = Command::new(tool);
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path);

        debug!(path = %path.display(), "Running ffprobe");

        let output = output_with_timeout(command, self.timeout)
            .await?
            .ok_or_else(|| {
                MediaError::probe_failed(
                    format!("timed out after {} seconds", self.timeout.as_secs()),
                    None,
                )
            })?;

        if !output.status.success() {
            return Err(MediaError::probe_failed(
                format!("ffprobe exited with status {:?}", output.status.code()),
                stderr_tail(&output.stderr),
            ));
        }

        let metadata = parse_probe_output(&output.stdout)?;

        info!(
            width = metadata.width,
            height = metadata.height,
            duration = metadata.duration,
            aspect_ratio = %metadata.aspect_ratio,
            "Video metadata extracted"
        );

        Ok(metadata)
    }
}
