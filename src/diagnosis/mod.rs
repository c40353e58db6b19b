//! Deterministic rule-based leaf diagnosis.
//!
//! Pipeline: content bytes → SHA-256 seed → per-rule jitter + filename
//! boost → winning rule → confidence (filename length nudge + runtime
//! jitter) → severity band → adjusted treatment plan.
//!
//! No image analysis happens here. Confidence is synthetic and only
//! guaranteed to be reproducible for identical bytes and filename, up to
//! the runtime jitter.

pub mod catalog;
pub mod engine;
pub mod scoring;
pub mod seed;
pub mod severity;
pub mod treatment;
pub mod types;

pub use catalog::{Catalog, CatalogError, CATALOG_VERSION};
pub use engine::{batch_size, DiagnosisEngine, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
pub use scoring::{FilenameKey, Selection};
pub use severity::classify;
pub use treatment::{adjust_for_severity, treatment_plan};
pub use types::{BatchRequest, Diagnosis, DiseaseRule};
