//! Confidence → severity band.

use super::catalog::{HEALTHY_LABEL, UNKNOWN_LABEL};
use crate::models::enums::Severity;

/// Lower edge (inclusive) of the `High` band.
pub const HIGH_THRESHOLD: f64 = 0.80;
/// Lower edge (inclusive) of the `Moderate` band.
pub const MODERATE_THRESHOLD: f64 = 0.50;

/// Map a confidence to its severity band.
///
/// `Healthy` and `Unknown` are always `Low`. Otherwise the confidence is
/// clamped to `[0, 1]` and compared against the band edges. NaN lands in
/// `Low`.
pub fn classify(confidence: f64, disease: &str) -> Severity {
    if disease == HEALTHY_LABEL || disease == UNKNOWN_LABEL {
        return Severity::Low;
    }
    let pct = confidence.clamp(0.0, 1.0);
    if pct >= HIGH_THRESHOLD {
        Severity::High
    } else if pct >= MODERATE_THRESHOLD {
        Severity::Moderate
    } else {
        Severity::Low
    }
}
