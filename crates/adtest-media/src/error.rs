//! Error types for media operations.

use adtest_models::compliance::join_messages;
use adtest_models::ComplianceIssue;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn gib(bytes: &u64) -> f64 {
    *bytes as f64 / BYTES_PER_GIB
}

/// Errors that can occur while probing, validating or transforming a video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{tool} not found in PATH. Please install FFmpeg")]
    ToolUnavailable { tool: String },

    #[error("FFprobe failed to read video: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("No video stream found in file")]
    NoVideoStream,

    #[error("FFmpeg transformation failed: {message}")]
    TransformFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFmpeg transformation timed out after {0} seconds")]
    TransformTimeout(u64),

    #[error("Transformed video size ({:.2}GB) exceeds 2GB limit. Video cannot be processed", gib(.size_bytes))]
    OutputTooLarge { size_bytes: u64 },

    #[error("Video has unfixable issues: {}", join_messages(.issues))]
    UnfixableIssue { issues: Vec<ComplianceIssue> },

    #[error("Video still non-compliant after transformation: {}", join_messages(.issues))]
    StillNonCompliant { issues: Vec<ComplianceIssue> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a tool-unavailable error.
    pub fn tool_unavailable(tool: impl Into<String>) -> Self {
        Self::ToolUnavailable { tool: tool.into() }
    }

    /// Create a probe failure error.
    pub fn probe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create a transform failure error.
    pub fn transform_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::TransformFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Whether the video was rejected for its content. Every other failure,
    /// probing included, is the service's.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MediaError::UnfixableIssue { .. })
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::ToolUnavailable { .. } => "tool_unavailable",
            MediaError::ProbeFailed { .. } => "probe_failed",
            MediaError::NoVideoStream => "no_video_stream",
            MediaError::TransformFailed { .. } => "transform_failed",
            MediaError::TransformTimeout(_) => "transform_timeout",
            MediaError::OutputTooLarge { .. } => "output_too_large",
            MediaError::UnfixableIssue { .. } => "unfixable_issue",
            MediaError::StillNonCompliant { .. } => "still_non_compliant",
            MediaError::Io(_) => "io",
        }
    }
}
