//! Diagnosis engine: content-seeded scoring, confidence assembly and
//! batch variants.
//!
//! The engine never owns a non-deterministic generator. Callers pass the
//! runtime generator explicitly so tests (and the service) decide where
//! the variation comes from.

use rand::Rng;

use super::catalog::Catalog;
use super::scoring::{filename_adjustment, select, FilenameKey, Selection};
use super::seed::{content_rng, seeded_rng};
use super::severity::classify;
use super::treatment::treatment_plan;
use super::types::{clamp01, BatchRequest, Diagnosis};

/// Half-width of the non-seeded jitter added to a single diagnosis.
pub const RUNTIME_JITTER: f64 = 0.03;
/// Half-width of the per-variant jitter in batch mode.
pub const VARIANT_JITTER: f64 = 0.05;

pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 50;

/// Clamp a requested variant count into `[MIN_BATCH_SIZE, MAX_BATCH_SIZE]`.
/// Missing and non-positive counts give `MIN_BATCH_SIZE`.
pub fn batch_size(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n > 0 => usize::try_from(n)
            .unwrap_or(MAX_BATCH_SIZE)
            .clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE),
        _ => MIN_BATCH_SIZE,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosisEngine<'c> {
    catalog: &'c Catalog,
}

impl DiagnosisEngine<'static> {
    /// Engine over the shared built-in catalog.
    pub fn builtin() -> Self {
        Self::new(Catalog::builtin())
    }
}

impl<'c> DiagnosisEngine<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Reproducible part of a diagnosis: the winning rule and its score.
    ///
    /// Identical `content` and `filename` always give the same selection.
    pub fn score(&self, content: &[u8], filename: &str) -> Selection {
        let key = FilenameKey::new(filename);
        let mut rng = content_rng(content);
        select(self.catalog, &key, &mut rng)
    }

    /// Diagnose one upload.
    ///
    /// `runtime` supplies the single non-seeded jitter draw; the rest is a
    /// pure function of `content` and `filename`.
    pub fn diagnose<R: Rng + ?Sized>(
        &self,
        content: &[u8],
        filename: &str,
        runtime: &mut R,
    ) -> Diagnosis {
        let key = FilenameKey::new(filename);
        let selection = select(self.catalog, &key, &mut content_rng(content));
        let runtime_jitter = runtime.gen_range(-RUNTIME_JITTER..=RUNTIME_JITTER);
        let confidence = clamp01(selection.score + filename_adjustment(&key) + runtime_jitter);

        tracing::debug!(
            disease = selection.disease,
            score = selection.score,
            confidence,
            filename_match = selection.filename_match,
            "Diagnosis assembled"
        );

        self.assemble(&selection, confidence)
    }

    /// Produce jittered variants of one diagnosis.
    ///
    /// The winning rule is selected once. With `request.seed` set, a
    /// request-local generator seeded from it drives scoring and every
    /// variant draw; otherwise scoring is content-seeded and variants draw
    /// from `runtime`.
    pub fn diagnose_batch<R: Rng + ?Sized>(
        &self,
        content: &[u8],
        filename: &str,
        request: &BatchRequest,
        runtime: &mut R,
    ) -> Vec<Diagnosis> {
        let key = FilenameKey::new(filename);
        let count = batch_size(request.size);

        match request.seed {
            Some(seed) => {
                // Negative seeds keep their bit pattern.
                let mut rng = seeded_rng(seed as u64);
                let selection = select(self.catalog, &key, &mut rng);
                self.variants(&selection, &key, count, &mut rng)
            }
            None => {
                let selection = select(self.catalog, &key, &mut content_rng(content));
                self.variants(&selection, &key, count, runtime)
            }
        }
    }

    fn variants<R: Rng + ?Sized>(
        &self,
        selection: &Selection,
        key: &FilenameKey,
        count: usize,
        rng: &mut R,
    ) -> Vec<Diagnosis> {
        let adjustment = filename_adjustment(key);
        (0..count)
            .map(|_| {
                let jitter = rng.gen_range(-VARIANT_JITTER..=VARIANT_JITTER);
                let confidence = clamp01(selection.score + adjustment + jitter);
                self.assemble(selection, confidence)
            })
            .collect()
    }

    fn assemble(&self, selection: &Selection, confidence: f64) -> Diagnosis {
        let severity = classify(confidence, selection.disease);
        Diagnosis {
            disease: selection.disease.to_string(),
            confidence,
            severity,
            recommendations: selection
                .recommendations
                .iter()
                .map(|s| s.to_string())
                .collect(),
            treatment: treatment_plan(self.catalog, selection.disease, severity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::catalog::{FALLBACK_RECOMMENDATIONS, UNKNOWN_TREATMENT};
    use crate::diagnosis::seed::seeded_rng;
    use crate::models::enums::Severity;

    const LEAF: &[u8] = b"\x89PNG\r\n\x1a\n fake leaf pixels";

    fn runtime(seed: u64) -> impl Rng {
        seeded_rng(seed)
    }

    #[test]
    fn scoring_is_reproducible() {
        let engine = DiagnosisEngine::builtin();
        let a = engine.score(LEAF, "field_photo.jpg");
        let b = engine.score(LEAF, "field_photo.jpg");
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_diagnoses_differ_only_by_runtime_jitter() {
        let engine = DiagnosisEngine::builtin();
        let mut rt = runtime(99);
        let first = engine.diagnose(LEAF, "field_photo.jpg", &mut rt);
        let second = engine.diagnose(LEAF, "field_photo.jpg", &mut rt);
        assert_eq!(first.disease, second.disease);
        assert_eq!(first.recommendations, second.recommendations);
        assert!((first.confidence - second.confidence).abs() <= 2.0 * RUNTIME_JITTER + 1e-12);
    }

    #[test]
    fn identical_runtime_seed_gives_identical_diagnosis() {
        let engine = DiagnosisEngine::builtin();
        let a = engine.diagnose(LEAF, "field_photo.jpg", &mut runtime(5));
        let b = engine.diagnose(LEAF, "field_photo.jpg", &mut runtime(5));
        assert_eq!(a, b);
    }

    #[test]
    fn confidence_stays_within_runtime_window_of_score() {
        let engine = DiagnosisEngine::builtin();
        let name = "field_photo.jpg";
        let selection = engine.score(LEAF, name);
        let adjustment = filename_adjustment(&FilenameKey::new(name));
        let mut rt = runtime(1);
        for _ in 0..50 {
            let diagnosis = engine.diagnose(LEAF, name, &mut rt);
            let unclamped = selection.score + adjustment;
            assert!(diagnosis.confidence >= clamp01(unclamped - RUNTIME_JITTER) - 1e-12);
            assert!(diagnosis.confidence <= clamp01(unclamped + RUNTIME_JITTER) + 1e-12);
        }
    }

    #[test]
    fn confidence_always_in_unit_interval() {
        let engine = DiagnosisEngine::builtin();
        let mut rt = runtime(42);
        for i in 0..200u32 {
            let content = i.to_be_bytes();
            let name = format!("healthy_{i}.png");
            let diagnosis = engine.diagnose(&content, &name, &mut rt);
            assert!((0.0..=1.0).contains(&diagnosis.confidence));
        }
    }

    #[test]
    fn late_blight_example() {
        let engine = DiagnosisEngine::builtin();
        let diagnosis = engine.diagnose(b"any bytes", "tomato_late_blight_sample.jpg", &mut runtime(3));
        assert_eq!(diagnosis.disease, "Late Blight");
        assert_eq!(diagnosis.recommendations[0], "Apply fungicides effective against late blight.");
    }

    #[test]
    fn healthy_example_is_always_low() {
        let engine = DiagnosisEngine::builtin();
        let mut rt = runtime(8);
        for i in 0..50u32 {
            let diagnosis = engine.diagnose(&i.to_le_bytes(), "healthy_leaf.png", &mut rt);
            assert_eq!(diagnosis.disease, "Healthy");
            assert_eq!(diagnosis.severity, Severity::Low);
            assert_eq!(
                diagnosis.treatment,
                vec![
                    "Maintain good agronomy; continue monitoring.".to_string(),
                    "Monitor weekly; no drastic actions needed.".to_string(),
                ]
            );
        }
    }

    #[test]
    fn severity_and_treatment_are_consistent() {
        let engine = DiagnosisEngine::builtin();
        let mut rt = runtime(17);
        for i in 0..100u32 {
            let diagnosis = engine.diagnose(&i.to_be_bytes(), "leaf.jpg", &mut rt);
            assert_eq!(diagnosis.severity, classify(diagnosis.confidence, &diagnosis.disease));
            let base = engine.catalog().treatment_steps(&diagnosis.disease).len();
            let expected = match diagnosis.severity {
                Severity::High => base + 2,
                Severity::Moderate | Severity::Low => base + 1,
            };
            assert_eq!(diagnosis.treatment.len(), expected);
        }
    }

    #[test]
    fn empty_catalog_yields_unknown() {
        let catalog = Catalog::new("empty", Vec::new(), &[]);
        let engine = DiagnosisEngine::new(&catalog);
        let diagnosis = engine.diagnose(LEAF, "", &mut runtime(1));
        assert_eq!(diagnosis.disease, "Unknown");
        assert_eq!(diagnosis.severity, Severity::Low);
        assert_eq!(diagnosis.recommendations, FALLBACK_RECOMMENDATIONS);
        assert_eq!(diagnosis.treatment.len(), UNKNOWN_TREATMENT.len() + 1);
        // 0.5 - 0.03 (empty name) ± 0.03
        assert!(diagnosis.confidence >= 0.44 - 1e-12 && diagnosis.confidence <= 0.50 + 1e-12);
    }

    #[test]
    fn batch_size_clamping() {
        assert_eq!(batch_size(None), 1);
        assert_eq!(batch_size(Some(0)), 1);
        assert_eq!(batch_size(Some(-5)), 1);
        assert_eq!(batch_size(Some(10)), 10);
        assert_eq!(batch_size(Some(50)), 50);
        assert_eq!(batch_size(Some(1000)), 50);
        assert_eq!(batch_size(Some(i64::MAX)), 50);
    }

    #[test]
    fn batch_produces_clamped_variant_counts() {
        let engine = DiagnosisEngine::builtin();
        let mut rt = runtime(4);
        for (size, expected) in [(Some(0), 1), (Some(-5), 1), (Some(1000), 50), (Some(10), 10)] {
            let request = BatchRequest { size, seed: None };
            let variants = engine.diagnose_batch(LEAF, "rust_leaf.jpg", &request, &mut rt);
            assert_eq!(variants.len(), expected);
        }
    }

    #[test]
    fn batch_holds_disease_and_recommendations_fixed() {
        let engine = DiagnosisEngine::builtin();
        let request = BatchRequest { size: Some(30), seed: None };
        let variants = engine.diagnose_batch(LEAF, "rust_leaf.jpg", &request, &mut runtime(6));
        let first = &variants[0];
        assert_eq!(first.disease, "Rust");
        for v in &variants {
            assert_eq!(v.disease, first.disease);
            assert_eq!(v.recommendations, first.recommendations);
            assert!((0.0..=1.0).contains(&v.confidence));
            assert_eq!(v.severity, classify(v.confidence, &v.disease));
        }
    }

    #[test]
    fn batch_variants_stay_within_window() {
        let engine = DiagnosisEngine::builtin();
        let name = "rust_leaf.jpg";
        let selection = engine.score(LEAF, name);
        let centre = selection.score + filename_adjustment(&FilenameKey::new(name));
        let request = BatchRequest { size: Some(50), seed: None };
        for v in engine.diagnose_batch(LEAF, name, &request, &mut runtime(2)) {
            assert!(v.confidence >= clamp01(centre - VARIANT_JITTER) - 1e-12);
            assert!(v.confidence <= clamp01(centre + VARIANT_JITTER) + 1e-12);
        }
    }

    #[test]
    fn seeded_batch_is_fully_reproducible() {
        let engine = DiagnosisEngine::builtin();
        let request = BatchRequest { size: Some(12), seed: Some(1234) };
        let a = engine.diagnose_batch(LEAF, "leaf.jpg", &request, &mut runtime(1));
        let b = engine.diagnose_batch(LEAF, "leaf.jpg", &request, &mut runtime(2));
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_batch_ignores_content() {
        let engine = DiagnosisEngine::builtin();
        let request = BatchRequest { size: Some(5), seed: Some(-77) };
        let a = engine.diagnose_batch(b"one image", "leaf.jpg", &request, &mut runtime(1));
        let b = engine.diagnose_batch(b"other image", "leaf.jpg", &request, &mut runtime(1));
        assert_eq!(a, b);
    }

    #[test]
    fn unseeded_batch_uses_content_selection() {
        let engine = DiagnosisEngine::builtin();
        let selection = engine.score(LEAF, "leaf.jpg");
        let request = BatchRequest { size: Some(3), seed: None };
        let variants = engine.diagnose_batch(LEAF, "leaf.jpg", &request, &mut runtime(9));
        assert!(variants.iter().all(|v| v.disease == selection.disease));
    }
}
