//! FFmpeg command builder and subprocess helpers.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Timeout for the `-version` presence check.
pub const TOOL_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of stderr lines kept on failure.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Limit output duration (output option, applied after decoding).
    pub fn trim_to(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.extend(self.input_args.iter().cloned());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Run a command to completion, capturing its output.
///
/// Returns `Ok(None)` when the timeout elapses; the child is killed when the
/// wait future is dropped.
pub async fn output_with_timeout(
    mut command: Command,
    limit: Duration,
) -> std::io::Result<Option<Output>> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn()?;

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(output) => output.map(Some),
        Err(_) => Ok(None),
    }
}

/// Check that an external tool is installed and answers `-version`.
pub async fn check_tool(binary: &str, limit: Duration) -> MediaResult<PathBuf> {
    let path = which::which(binary).map_err(|_| MediaError::tool_unavailable(binary))?;

    let mut command = Command::new(&path);
    command.arg("-version");

    match output_with_timeout(command, limit).await {
        Ok(Some(output)) if output.status.success() => {
            debug!(tool = %binary, path = %path.display(), "Tool available");
            Ok(path)
        }
        Ok(Some(output)) => {
            warn!(tool = %binary, exit_code = ?output.status.code(), "Tool version check failed");
            Err(MediaError::tool_unavailable(binary))
        }
        Ok(None) => {
            warn!(tool = %binary, timeout_secs = limit.as_secs(), "Tool version check timed out");
            Err(MediaError::tool_unavailable(binary))
        }
        Err(e) => {
            warn!(tool = %binary, error = %e, "Tool could not be started");
            Err(MediaError::tool_unavailable(binary))
        }
    }
}

/// Last lines of a tool's stderr, for error reporting.
pub fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines[start..].join("\n"))
}
