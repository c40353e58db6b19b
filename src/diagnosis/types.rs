use serde::{Deserialize, Serialize};

use crate::models::enums::Severity;

// ---------------------------------------------------------------------------
// DiseaseRule
// ---------------------------------------------------------------------------

/// One entry of the disease catalog.
///
/// `patterns` are lowercase substrings searched for in the uploaded
/// filename. `recommendations` are returned verbatim for any severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiseaseRule {
    pub patterns: &'static [&'static str],
    pub label: &'static str,
    pub base_confidence: f64,
    pub recommendations: &'static [&'static str],
}

// ---------------------------------------------------------------------------
// Diagnosis
// ---------------------------------------------------------------------------

/// Result of one diagnosis, serialized as-is in API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub treatment: Vec<String>,
}

// ---------------------------------------------------------------------------
// BatchRequest
// ---------------------------------------------------------------------------

/// Parameters of a batch (multi-variant) diagnosis.
///
/// `size` is clamped to `[MIN_BATCH_SIZE, MAX_BATCH_SIZE]`; `None` and
/// non-positive values yield a single variant. `seed`, when present,
/// drives both rule scoring and every variant jitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BatchRequest {
    pub size: Option<i64>,
    pub seed: Option<i64>,
}

/// Clamp a combined score into `[0, 1]`.
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
