//! Video compliance types and ingestion policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Video ingestion policy of the video understanding service.
pub mod policy {
    /// An allowed aspect ratio, `numerator:denominator` in lowest terms.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AspectRatioSpec {
        pub label: &'static str,
        pub numerator: u32,
        pub denominator: u32,
    }

    impl AspectRatioSpec {
        const fn new(label: &'static str, numerator: u32, denominator: u32) -> Self {
            Self {
                label,
                numerator,
                denominator,
            }
        }

        /// Width/height quotient.
        pub fn quotient(&self) -> f64 {
            self.numerator as f64 / self.denominator as f64
        }
    }

    /// Allowed aspect ratios. Order matters: closest-ratio ties go to the
    /// earliest entry.
    pub const ALLOWED_ASPECT_RATIOS: &[AspectRatioSpec] = &[
        AspectRatioSpec::new("1:1", 1, 1),
        AspectRatioSpec::new("4:3", 4, 3),
        AspectRatioSpec::new("4:5", 4, 5),
        AspectRatioSpec::new("5:4", 5, 4),
        AspectRatioSpec::new("16:9", 16, 9),
        AspectRatioSpec::new("9:16", 9, 16),
        AspectRatioSpec::new("17:9", 17, 9),
    ];

    /// Minimum resolution (width, height)
    pub const MIN_RESOLUTION: (u32, u32) = (360, 360);
    /// Maximum resolution (width, height)
    pub const MAX_RESOLUTION: (u32, u32) = (3840, 2160);
    /// Minimum duration in seconds (strictly-less-than is rejected)
    pub const MIN_DURATION_SECS: f64 = 4.0;
    /// Maximum duration in seconds (2 hours)
    pub const MAX_DURATION_SECS: f64 = 7200.0;
    /// Maximum file size (2 GiB)
    pub const MAX_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024 * 1024;

    /// Look up an allowed ratio by its `W:H` label.
    pub fn allowed_ratio(label: &str) -> Option<(u32, u32)> {
        ALLOWED_ASPECT_RATIOS
            .iter()
            .find(|r| r.label == label)
            .map(|r| (r.numerator, r.denominator))
    }

    /// Comma-separated list of allowed ratio labels.
    pub fn allowed_ratio_labels() -> String {
        ALLOWED_ASPECT_RATIOS
            .iter()
            .map(|r| r.label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Aspect ratio label used when a dimension is zero.
pub const UNKNOWN_ASPECT_RATIO: &str = "unknown";

/// Audio codec label used when the file has no audio stream.
pub const NO_AUDIO_CODEC: &str = "none";

/// Metadata extracted from a media file by the prober.
///
/// Always fully populated; a fresh value is produced by every probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MediaMetadata {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Duration in seconds
    pub duration: f64,
    /// File size in bytes
    pub file_size_bytes: u64,
    /// Video codec name
    pub video_codec: String,
    /// Audio codec name, or "none"
    pub audio_codec: String,
    /// "W:H" in lowest terms, or "unknown"
    pub aspect_ratio: String,
}

impl MediaMetadata {
    /// Whether the file carries an audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio_codec != NO_AUDIO_CODEC
    }
}

/// Kind of compliance issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ResolutionTooLow,
    ResolutionTooHigh,
    InvalidAspectRatio,
    DurationTooShort,
    DurationTooLong,
    FileTooLarge,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ResolutionTooLow => "resolution_too_low",
            IssueKind::ResolutionTooHigh => "resolution_too_high",
            IssueKind::InvalidAspectRatio => "invalid_aspect_ratio",
            IssueKind::DurationTooShort => "duration_too_short",
            IssueKind::DurationTooLong => "duration_too_long",
            IssueKind::FileTooLarge => "file_too_large",
        }
    }

    /// Whether a transform can correct this kind of issue.
    pub fn is_fixable(&self) -> bool {
        !matches!(self, IssueKind::DurationTooShort | IssueKind::FileTooLarge)
    }

    /// Whether correcting this issue requires a scale/pad pass.
    pub fn needs_resize(&self) -> bool {
        matches!(
            self,
            IssueKind::ResolutionTooLow
                | IssueKind::ResolutionTooHigh
                | IssueKind::InvalidAspectRatio
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single deviation from the ingestion policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComplianceIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
    pub fixable: bool,
}

impl ComplianceIssue {
    /// Create an issue; fixability follows the kind.
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fixable: kind.is_fixable(),
        }
    }
}

/// Result of validating metadata against the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub compliant: bool,
    pub issues: Vec<ComplianceIssue>,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ComplianceIssue>) -> Self {
        Self {
            compliant: issues.is_empty(),
            issues,
        }
    }

    /// Issues that no transform can correct.
    pub fn unfixable(&self) -> Vec<ComplianceIssue> {
        self.issues.iter().filter(|i| !i.fixable).cloned().collect()
    }

    pub fn needs_resize(&self) -> bool {
        self.issues.iter().any(|i| i.kind.needs_resize())
    }

    /// Issue messages joined with "; ".
    pub fn joined_messages(&self) -> String {
        join_messages(&self.issues)
    }
}

/// Join issue messages with "; ".
pub fn join_messages(issues: &[ComplianceIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Corrections to apply in a single transcoder pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TransformPlan {
    /// Scale-and-letterbox to exactly this (width, height)
    pub target_resolution: Option<(u32, u32)>,
    /// Trim output to this many seconds
    pub max_duration_seconds: Option<f64>,
}

impl TransformPlan {
    pub fn is_noop(&self) -> bool {
        self.target_resolution.is_none() && self.max_duration_seconds.is_none()
    }
}

/// Stages of a compliance pipeline run, used in structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Probing,
    Validating,
    Transforming,
    Reprobing,
    Revalidating,
    Done,
    Rejected,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Probing => "probing",
            PipelineStage::Validating => "validating",
            PipelineStage::Transforming => "transforming",
            PipelineStage::Reprobing => "reprobing",
            PipelineStage::Revalidating => "revalidating",
            PipelineStage::Done => "done",
            PipelineStage::Rejected => "rejected",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
