//! Transform planning from validation results.

use adtest_models::compliance::policy::{allowed_ratio, MAX_DURATION_SECS};
use adtest_models::{MediaMetadata, TransformPlan, ValidationResult};
use tracing::info;

use super::resolver::{closest_ratio, scaled_resolution};
use crate::error::{MediaError, MediaResult};

/// Build the corrections needed to make a video compliant.
///
/// A resize keeps the current ratio when it is allowed and otherwise moves to
/// the closest allowed ratio. Durations over the maximum are trimmed to it.
pub fn build_plan(
    metadata: &MediaMetadata,
    validation: &ValidationResult,
) -> MediaResult<TransformPlan> {
    let mut plan = TransformPlan::default();

    if validation.needs_resize() {
        let target = match allowed_ratio(&metadata.aspect_ratio) {
            Some((numerator, denominator)) => scaled_resolution(numerator, denominator),
            None => {
                let (label, target) = closest_ratio(metadata.width, metadata.height).ok_or_else(|| {
                    MediaError::probe_failed("video stream reports zero dimensions", None)
                })?;
                info!(
                    from = %metadata.aspect_ratio,
                    to = label,
                    "Converting aspect ratio"
                );
                target
            }
        };
        plan.target_resolution = Some(target);
    }

    if metadata.duration > MAX_DURATION_SECS {
        plan.max_duration_seconds = Some(MAX_DURATION_SECS);
    }

    Ok(plan)
}
