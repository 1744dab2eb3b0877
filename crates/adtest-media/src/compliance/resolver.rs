//! Aspect-ratio arithmetic and closest allowed ratio selection.

use adtest_models::compliance::policy::{ALLOWED_ASPECT_RATIOS, MAX_RESOLUTION, MIN_RESOLUTION};
use adtest_models::compliance::UNKNOWN_ASPECT_RATIO;

/// Greatest common divisor.
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Reduce `width:height` to lowest terms. `None` when either side is zero.
pub fn reduce_ratio(width: u32, height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let divisor = gcd(width, height);
    Some((width / divisor, height / divisor))
}

/// `"W:H"` label in lowest terms, or `"unknown"`.
pub fn aspect_ratio_label(width: u32, height: u32) -> String {
    match reduce_ratio(width, height) {
        Some((w, h)) => format!("{}:{}", w, h),
        None => UNKNOWN_ASPECT_RATIO.to_string(),
    }
}

/// Smallest resolution with ratio `numerator:denominator` inside the policy bounds.
///
/// Scales up to reach the minimum on both axes, never below 1x, then caps at
/// the maximum. Dimensions are floored and rounded down to even.
pub fn scaled_resolution(numerator: u32, denominator: u32) -> (u32, u32) {
    let n = numerator as f64;
    let d = denominator as f64;

    let scale = (MIN_RESOLUTION.0 as f64 / n)
        .max(MIN_RESOLUTION.1 as f64 / d)
        .max(1.0);
    let scale = scale
        .min(MAX_RESOLUTION.0 as f64 / n)
        .min(MAX_RESOLUTION.1 as f64 / d);

    let width = (n * scale).floor() as u32;
    let height = (d * scale).floor() as u32;

    (width - width % 2, height - height % 2)
}

/// Allowed ratio nearest to `width / height` and its scaled target resolution.
///
/// Ties go to the earlier table entry. `None` when `height` is zero.
pub fn closest_ratio(width: u32, height: u32) -> Option<(&'static str, (u32, u32))> {
    if height == 0 {
        return None;
    }
    let current = width as f64 / height as f64;

    let mut best = None;
    let mut best_diff = f64::INFINITY;
    for spec in ALLOWED_ASPECT_RATIOS {
        let diff = (current - spec.quotient()).abs();
        if diff < best_diff {
            best_diff = diff;
            best = Some(spec);
        }
    }

    best.map(|spec| (spec.label, scaled_resolution(spec.numerator, spec.denominator)))
}
