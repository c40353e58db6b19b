//! Rule scoring and winner selection.
//!
//! Every rule draws exactly one jitter sample, in catalog order, whether
//! or not it can win. A rule whose patterns hit the filename outranks any
//! rule that missed; within the same class the strictly greater score
//! wins and the earlier rule keeps ties.

use rand::Rng;

use super::catalog::{Catalog, FALLBACK_CONFIDENCE, FALLBACK_RECOMMENDATIONS, UNKNOWN_LABEL};
use super::types::{clamp01, DiseaseRule};

/// Half-width of the per-rule jitter window.
pub const RULE_JITTER: f64 = 0.1;
/// Added to a rule's score when one of its patterns hits the filename.
pub const FILENAME_BOOST: f64 = 0.1;

// ---------------------------------------------------------------------------
// FilenameKey
// ---------------------------------------------------------------------------

/// Lowercased filename prepared for pattern matching.
///
/// Patterns are searched in the raw lowercased name and in a variant with
/// `_`, `-` and `.` turned into spaces, so `late_blight.jpg` hits
/// `"late blight"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameKey {
    raw: String,
    spaced: String,
}

impl FilenameKey {
    pub fn new(filename: &str) -> Self {
        let raw = filename.to_lowercase();
        let spaced = raw
            .chars()
            .map(|c| if matches!(c, '_' | '-' | '.') { ' ' } else { c })
            .collect();
        Self { raw, spaced }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, patterns: &[&str]) -> bool {
        patterns
            .iter()
            .any(|p| self.raw.contains(p) || self.spaced.contains(p))
    }

    /// Length in characters of the lowercased filename.
    pub fn char_len(&self) -> usize {
        self.raw.chars().count()
    }
}

/// Length-keyed nudge in `{-0.03, ..., +0.03}`.
pub fn filename_adjustment(key: &FilenameKey) -> f64 {
    ((key.char_len() % 7) as f64 - 3.0) * 0.01
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleScore<'a> {
    pub rule: &'a DiseaseRule,
    pub score: f64,
    pub filename_match: bool,
}

impl RuleScore<'_> {
    fn outranks(&self, other: &RuleScore<'_>) -> bool {
        match (self.filename_match, other.filename_match) {
            (true, false) => true,
            (false, true) => false,
            _ => self.score > other.score,
        }
    }
}

/// The winning rule of one scoring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub disease: &'static str,
    pub score: f64,
    pub recommendations: &'static [&'static str],
    pub filename_match: bool,
}

impl Selection {
    /// Selection used when the catalog has no rules.
    pub fn fallback() -> Self {
        Self {
            disease: UNKNOWN_LABEL,
            score: FALLBACK_CONFIDENCE,
            recommendations: FALLBACK_RECOMMENDATIONS,
            filename_match: false,
        }
    }
}

/// Score a single rule, consuming one jitter draw.
pub fn score_rule<'a, R: Rng + ?Sized>(
    rule: &'a DiseaseRule,
    key: &FilenameKey,
    rng: &mut R,
) -> RuleScore<'a> {
    let jitter = rng.gen_range(-RULE_JITTER..=RULE_JITTER);
    let filename_match = key.matches(rule.patterns);
    let boost = if filename_match { FILENAME_BOOST } else { 0.0 };
    RuleScore {
        rule,
        score: clamp01(rule.base_confidence + jitter + boost),
        filename_match,
    }
}

/// Score every rule in catalog order.
pub fn score_all<'a, R: Rng + ?Sized>(
    catalog: &'a Catalog,
    key: &FilenameKey,
    rng: &mut R,
) -> Vec<RuleScore<'a>> {
    catalog
        .rules()
        .iter()
        .map(|rule| score_rule(rule, key, &mut *rng))
        .collect()
}

/// Score all rules and pick the winner.
pub fn select<R: Rng + ?Sized>(catalog: &Catalog, key: &FilenameKey, rng: &mut R) -> Selection {
    let mut best: Option<RuleScore<'_>> = None;
    for candidate in score_all(catalog, key, rng) {
        if best.as_ref().map_or(true, |b| candidate.outranks(b)) {
            best = Some(candidate);
        }
    }

    match best {
        Some(winner) => Selection {
            disease: winner.rule.label,
            score: winner.score,
            recommendations: winner.rule.recommendations,
            filename_match: winner.filename_match,
        },
        None => Selection::fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::seed::{content_rng, seeded_rng};

    fn rule(label: &'static str, base: f64, patterns: &'static [&'static str]) -> DiseaseRule {
        DiseaseRule {
            patterns,
            label,
            base_confidence: base,
            recommendations: &[],
        }
    }

    fn catalog(rules: Vec<DiseaseRule>) -> Catalog {
        Catalog::new("test", rules, &[])
    }

    #[test]
    fn filename_key_matches_underscored_names() {
        let key = FilenameKey::new("Tomato_Late_Blight_Sample.JPG");
        assert_eq!(key.as_str(), "tomato_late_blight_sample.jpg");
        assert!(key.matches(&["late blight"]));
        assert!(!key.matches(&["early blight"]));
    }

    #[test]
    fn filename_key_matches_raw_substrings() {
        let key = FilenameKey::new("IMG_rust_01.png");
        assert!(key.matches(&["rust"]));
        assert!(key.matches(&["img_rust"]));
    }

    #[test]
    fn empty_filename_matches_nothing() {
        let key = FilenameKey::new("");
        assert!(!key.matches(&["healthy", "rust"]));
        assert_eq!(key.char_len(), 0);
    }

    #[test]
    fn filename_adjustment_cycles_with_length() {
        assert!((filename_adjustment(&FilenameKey::new("")) + 0.03).abs() < 1e-12);
        assert!((filename_adjustment(&FilenameKey::new("abc")) - 0.0).abs() < 1e-12);
        assert!((filename_adjustment(&FilenameKey::new("abcdef")) - 0.03).abs() < 1e-12);
        assert!((filename_adjustment(&FilenameKey::new("abcdefg")) + 0.03).abs() < 1e-12);
    }

    #[test]
    fn filename_adjustment_counts_characters_not_bytes() {
        // 3 chars, 6 bytes
        let key = FilenameKey::new("éèà");
        assert!((filename_adjustment(&key) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn score_is_clamped_and_boosted() {
        let r = rule("Ceiling", 0.98, &["ceiling"]);
        let key = FilenameKey::new("ceiling.jpg");
        let mut rng = seeded_rng(7);
        let scored = score_rule(&r, &key, &mut rng);
        assert!(scored.filename_match);
        // 0.98 - 0.1 + 0.1 >= 0.98, capped at 1.0
        assert!(scored.score >= 0.98 - 1e-12);
        assert!(scored.score <= 1.0);
    }

    #[test]
    fn score_never_below_zero() {
        let r = rule("Floor", 0.0, &["floor"]);
        let key = FilenameKey::new("x.jpg");
        let mut rng = seeded_rng(3);
        for _ in 0..100 {
            let scored = score_rule(&r, &key, &mut rng);
            assert!((0.0..=0.1).contains(&scored.score));
        }
    }

    #[test]
    fn one_draw_per_rule() {
        let c = catalog(vec![rule("A", 0.5, &[]), rule("B", 0.5, &[]), rule("C", 0.5, &[])]);
        let key = FilenameKey::new("leaf.png");

        let mut scored_rng = seeded_rng(11);
        let _ = select(&c, &key, &mut scored_rng);

        let mut manual_rng = seeded_rng(11);
        for _ in 0..3 {
            let _: f64 = manual_rng.gen_range(-RULE_JITTER..=RULE_JITTER);
        }
        assert_eq!(scored_rng.gen::<u64>(), manual_rng.gen::<u64>());
    }

    #[test]
    fn best_score_wins_without_filename_hint() {
        // Jitter is at most 0.1, so a 0.3 gap is decisive.
        let c = catalog(vec![rule("Low", 0.2, &["low"]), rule("High", 0.9, &["high"])]);
        let selection = select(&c, &FilenameKey::new("leaf.png"), &mut seeded_rng(5));
        assert_eq!(selection.disease, "High");
        assert!(!selection.filename_match);
    }

    #[test]
    fn filename_hit_outranks_higher_score() {
        let c = catalog(vec![rule("Weak", 0.3, &["weak"]), rule("Strong", 0.95, &["strong"])]);
        let selection = select(&c, &FilenameKey::new("weak_leaf.png"), &mut seeded_rng(5));
        assert_eq!(selection.disease, "Weak");
        assert!(selection.filename_match);
    }

    #[test]
    fn first_rule_keeps_ties() {
        // Both clamp to 1.0 regardless of jitter.
        let c = catalog(vec![rule("First", 1.0, &["x"]), rule("Second", 1.0, &["x"])]);
        let selection = select(&c, &FilenameKey::new("x.png"), &mut seeded_rng(1));
        assert_eq!(selection.disease, "First");
        assert!((selection.score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_catalog_falls_back_to_unknown() {
        let c = catalog(Vec::new());
        let selection = select(&c, &FilenameKey::new("rust.png"), &mut seeded_rng(1));
        assert_eq!(selection, Selection::fallback());
        assert_eq!(selection.disease, "Unknown");
        assert_eq!(selection.recommendations.len(), 2);
    }

    #[test]
    fn builtin_late_blight_example() {
        let catalog = Catalog::builtin();
        let key = FilenameKey::new("tomato_late_blight_sample.jpg");
        for content in [&b""[..], b"abc", b"\xff\xd8\xff\xe0 jpeg", b"another leaf"] {
            let selection = select(catalog, &key, &mut content_rng(content));
            assert_eq!(selection.disease, "Late Blight");
            assert!(selection.filename_match);
            assert!(selection.score >= 0.88 - 1e-12);
        }
    }

    #[test]
    fn builtin_healthy_example() {
        let catalog = Catalog::builtin();
        let key = FilenameKey::new("healthy_leaf.png");
        for content in [&b""[..], b"abc", b"green"] {
            let selection = select(catalog, &key, &mut content_rng(content));
            assert_eq!(selection.disease, "Healthy");
        }
    }
}
