//! Checks probed metadata against the ingestion policy.

use adtest_models::compliance::policy::{
    allowed_ratio, allowed_ratio_labels, MAX_DURATION_SECS, MAX_FILE_SIZE_BYTES, MAX_RESOLUTION,
    MIN_DURATION_SECS, MIN_RESOLUTION,
};
use adtest_models::{ComplianceIssue, IssueKind, MediaMetadata, ValidationResult};
use tracing::{info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Validate metadata against the policy.
///
/// Issues are always listed in the same order: resolution-low,
/// resolution-high, aspect ratio, duration-low, duration-high, file size.
pub fn validate(metadata: &MediaMetadata) -> ValidationResult {
    let MediaMetadata {
        width,
        height,
        duration,
        file_size_bytes,
        ref aspect_ratio,
        ..
    } = *metadata;

    let mut issues = Vec::new();

    if width < MIN_RESOLUTION.0 || height < MIN_RESOLUTION.1 {
        issues.push(ComplianceIssue::new(
            IssueKind::ResolutionTooLow,
            format!(
                "Resolution {}x{} below minimum {}x{}",
                width, height, MIN_RESOLUTION.0, MIN_RESOLUTION.1
            ),
        ));
    }

    if width > MAX_RESOLUTION.0 || height > MAX_RESOLUTION.1 {
        issues.push(ComplianceIssue::new(
            IssueKind::ResolutionTooHigh,
            format!(
                "Resolution {}x{} exceeds maximum {}x{}",
                width, height, MAX_RESOLUTION.0, MAX_RESOLUTION.1
            ),
        ));
    }

    if allowed_ratio(aspect_ratio).is_none() {
        issues.push(ComplianceIssue::new(
            IssueKind::InvalidAspectRatio,
            format!(
                "Aspect ratio {} not in allowed list: {}",
                aspect_ratio,
                allowed_ratio_labels()
            ),
        ));
    }

    if duration < MIN_DURATION_SECS {
        issues.push(ComplianceIssue::new(
            IssueKind::DurationTooShort,
            format!(
                "Duration {:?}s below minimum {}s (cannot be fixed)",
                duration, MIN_DURATION_SECS
            ),
        ));
    }

    if duration > MAX_DURATION_SECS {
        issues.push(ComplianceIssue::new(
            IssueKind::DurationTooLong,
            format!(
                "Duration {:?}s exceeds maximum {}s (will trim)",
                duration, MAX_DURATION_SECS
            ),
        ));
    }

    if file_size_bytes > MAX_FILE_SIZE_BYTES {
        issues.push(ComplianceIssue::new(
            IssueKind::FileTooLarge,
            format!(
                "File size {:.1}MB exceeds maximum {:.1}MB",
                file_size_bytes as f64 / BYTES_PER_MB,
                MAX_FILE_SIZE_BYTES as f64 / BYTES_PER_MB
            ),
        ));
    }

    let result = ValidationResult::from_issues(issues);

    if result.compliant {
        info!(
            width,
            height,
            aspect_ratio = %aspect_ratio,
            duration,
            "Video validation passed"
        );
    } else {
        warn!(
            issue_count = result.issues.len(),
            issues = %result.joined_messages(),
            "Video validation failed"
        );
        for issue in &result.issues {
            warn!(kind = %issue.kind, fixable = issue.fixable, "{}", issue.message);
        }
    }

    result
}
