//! Disease and treatment catalog.
//!
//! One versioned structure shared by single and batch diagnosis. Rule
//! order is part of the determinism contract: the content-seeded
//! generator is drawn once per rule, in this order.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use thiserror::Error;

use super::types::DiseaseRule;

/// Catalog revision. Bump whenever rules are added, removed or reordered.
pub const CATALOG_VERSION: &str = "2024.06";

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const HEALTHY_LABEL: &str = "Healthy";

/// Base confidence used when no rule can be selected.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

pub const FALLBACK_RECOMMENDATIONS: &[&str] = &[
    "Unable to confidently classify. Re-take a clear, well-lit image.",
    "Scout for additional symptoms and consult a local expert if needed.",
];

pub const UNKNOWN_TREATMENT: &[&str] = &[
    "Re-take a clear, well-lit image for better diagnosis.",
    "Consult local extension for ambiguous symptoms.",
];

#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Duplicate disease label: {0}")]
    DuplicateLabel(String),

    #[error("No treatment entry for disease: {0}")]
    MissingTreatment(String),

    #[error("Missing fallback treatment entry for '{UNKNOWN_LABEL}'")]
    MissingFallback,

    #[error("Base confidence {value} for {label} is outside [0, 1]")]
    ConfidenceOutOfRange { label: String, value: f64 },

    #[error("Pattern '{pattern}' for {label} is not lowercase")]
    PatternNotLowercase { label: String, pattern: String },
}

/// Normalize a disease label for treatment lookup (trimmed, lowercased).
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

// ═══════════════════════════════════════════════════════════
// Catalog
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Catalog {
    version: &'static str,
    rules: Vec<DiseaseRule>,
    treatments: HashMap<String, &'static [&'static str]>,
}

static BUILTIN: LazyLock<Catalog> =
    LazyLock::new(|| Catalog::new(CATALOG_VERSION, DISEASE_RULES.to_vec(), TREATMENTS));

impl Catalog {
    pub fn new(
        version: &'static str,
        rules: Vec<DiseaseRule>,
        treatments: &[(&'static str, &'static [&'static str])],
    ) -> Self {
        let treatments = treatments
            .iter()
            .map(|(label, steps)| (normalize_label(label), *steps))
            .collect();
        Self {
            version,
            rules,
            treatments,
        }
    }

    /// The shared built-in catalog.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn rules(&self) -> &[DiseaseRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, label: &str) -> Option<&DiseaseRule> {
        let wanted = normalize_label(label);
        self.rules.iter().find(|r| normalize_label(r.label) == wanted)
    }

    /// Base treatment steps for a disease label.
    ///
    /// A miss resolves to the `Unknown` entry, and to `UNKNOWN_TREATMENT`
    /// if the catalog was built without one.
    pub fn treatment_steps(&self, label: &str) -> &'static [&'static str] {
        self.treatments
            .get(&normalize_label(label))
            .or_else(|| self.treatments.get(&normalize_label(UNKNOWN_LABEL)))
            .copied()
            .unwrap_or(UNKNOWN_TREATMENT)
    }

    /// Check catalog consistency. Returns the first problem found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !self.treatments.contains_key(&normalize_label(UNKNOWN_LABEL)) {
            return Err(CatalogError::MissingFallback);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            let key = normalize_label(rule.label);
            if !seen.insert(key.clone()) {
                return Err(CatalogError::DuplicateLabel(rule.label.into()));
            }
            if !self.treatments.contains_key(&key) {
                return Err(CatalogError::MissingTreatment(rule.label.into()));
            }
            if !(0.0..=1.0).contains(&rule.base_confidence) {
                return Err(CatalogError::ConfidenceOutOfRange {
                    label: rule.label.into(),
                    value: rule.base_confidence,
                });
            }
            if let Some(pattern) = rule.patterns.iter().find(|p| p.to_lowercase() != **p) {
                return Err(CatalogError::PatternNotLowercase {
                    label: rule.label.into(),
                    pattern: (*pattern).into(),
                });
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Built-in data
// ═══════════════════════════════════════════════════════════

const fn rule(
    patterns: &'static [&'static str],
    label: &'static str,
    base_confidence: f64,
    recommendations: &'static [&'static str],
) -> DiseaseRule {
    DiseaseRule {
        patterns,
        label,
        base_confidence,
        recommendations,
    }
}

const DISEASE_RULES: &[DiseaseRule] = &[
    rule(&["late blight", "phytophthora"], "Late Blight", 0.88, &[
        "Apply fungicides effective against late blight.",
        "Remove and destroy infected plant debris.",
        "Avoid leaf wetness; ensure good field drainage.",
    ]),
    rule(&["early blight", "alternaria"], "Early Blight", 0.84, &[
        "Rotate crops and avoid nightshade volunteers.",
        "Use protectant fungicides as per label.",
        "Prune lower leaves to improve airflow.",
    ]),
    rule(&["rust", "orange pustule", "pustule", "orange", "brown"], "Rust", 0.80, &[
        "Apply rust-targeted fungicide.",
        "Reduce overhead irrigation; minimize leaf wetness.",
        "Scout nearby fields for spread and volunteer hosts.",
    ]),
    rule(&["leaf spot", "spot", "cercospora"], "Leaf Spot", 0.78, &[
        "Remove severely spotted leaves.",
        "Use a broad-spectrum fungicide if pressure is high.",
        "Increase spacing to improve airflow.",
    ]),
    rule(&["downy", "downy mildew", "peronospora"], "Downy Mildew", 0.82, &[
        "Use labeled fungicides effective on downy mildew.",
        "Reduce leaf wetness; water early in the day.",
        "Improve airflow and remove infected material.",
    ]),
    rule(&["anthracnose"], "Anthracnose", 0.79, &[
        "Prune and destroy infected tissues.",
        "Apply recommended fungicides preventively.",
        "Avoid overhead irrigation.",
    ]),
    rule(&["septoria"], "Septoria Leaf Spot", 0.77, &[
        "Remove infected leaves and debris.",
        "Rotate crops; avoid volunteer hosts.",
        "Use protectant fungicides where needed.",
    ]),
    rule(&["mildew", "powdery"], "Powdery Mildew", 0.83, &[
        "Apply sulfur or other labeled fungicides.",
        "Avoid excessive nitrogen fertilization.",
        "Ensure sunlight penetration and airflow.",
    ]),
    rule(&["mosaic", "virus"], "Viral Mosaic", 0.76, &[
        "Remove infected plants to reduce spread.",
        "Control vectors (aphids/whiteflies).",
        "Use certified disease-free seed/planting material.",
    ]),
    rule(&["leaf curl", "curl"], "Leaf Curl Virus", 0.75, &[
        "Rogue infected plants.",
        "Control whitefly/aphid vectors.",
        "Use virus-free transplants.",
    ]),
    rule(&["fusarium", "wilt"], "Fusarium Wilt", 0.74, &[
        "Remove infected plants; sanitize soil-contact tools.",
        "Improve drainage; avoid waterlogging.",
        "Use resistant cultivars and rotate crops.",
    ]),
    rule(&["verticillium"], "Verticillium Wilt", 0.72, &[
        "Rotate out of susceptible hosts for multiple seasons.",
        "Improve soil health; solarize where feasible.",
        "Use resistant rootstocks/cultivars.",
    ]),
    rule(&["canker"], "Canker", 0.70, &[
        "Prune cankered tissue; disinfect tools.",
        "Apply copper-based protectants after pruning.",
        "Avoid injuries and water stress.",
    ]),
    rule(&["leaf miner", "miner trails", "mining"], "Leaf Miner Damage", 0.68, &[
        "Remove mined leaves.",
        "Use labeled insecticides if pressure high.",
        "Promote natural enemies.",
    ]),
    rule(&["aphid", "aphids"], "Aphid Infestation", 0.66, &[
        "Use insecticidal soap or labeled aphicides.",
        "Control ants; encourage predators.",
        "Remove heavily infested shoots.",
    ]),
    rule(&["nitrogen deficiency", "chlorosis", "pale"], "Nitrogen Deficiency", 0.65, &[
        "Apply recommended nitrogen fertilizer.",
        "Mulch and add organic matter.",
        "Confirm via soil test.",
    ]),
    rule(&["potassium deficiency", "leaf edge burn", "scorch"], "Potassium Deficiency", 0.64, &[
        "Apply K fertilizer per soil test.",
        "Avoid drought stress.",
        "Balance N:K ratio.",
    ]),
    rule(&["magnesium deficiency", "interveinal chlorosis"], "Magnesium Deficiency", 0.64, &[
        "Apply Mg (e.g., Epsom salt) per recommendation.",
        "Manage soil pH.",
        "Avoid excess K competing with Mg.",
    ]),
    rule(&["iron deficiency", "iron chlorosis"], "Iron Chlorosis", 0.63, &[
        "Apply chelated iron as foliar or soil drench.",
        "Adjust pH to optimal range.",
        "Improve drainage.",
    ]),
    rule(&["phosphorus deficiency", "purpling"], "Phosphorus Deficiency", 0.62, &[
        "Apply P fertilizer per soil test.",
        "Maintain warm, well-drained soil.",
        "Avoid over-liming.",
    ]),
    rule(&["scab"], "Scab", 0.74, &[
        "Maintain proper soil moisture and pH.",
        "Use resistant varieties when available.",
        "Practice crop rotation.",
    ]),
    rule(&["black rot"], "Black Rot", 0.78, &[
        "Remove mummified fruit and cankered wood.",
        "Apply fungicides during susceptible periods.",
        "Promote canopy airflow.",
    ]),
    rule(&["bacterial spot", "xanthomonas"], "Bacterial Leaf Spot", 0.75, &[
        "Use certified disease-free seed/transplants.",
        "Apply copper-based bactericides per label.",
        "Avoid handling when foliage is wet.",
    ]),
    rule(&["bacterial", "ooze"], "Bacterial Infection", 0.72, &[
        "Remove infected tissue and sanitize tools.",
        "Avoid working in fields when foliage is wet.",
        "Consider copper-based bactericides per label.",
    ]),
    rule(&["sunscald", "sun burn", "sunburn", "heat stress"], "Sunscald / Heat Stress", 0.68, &[
        "Provide shade or reduce heat exposure.",
        "Avoid midday spraying to prevent burn.",
        "Ensure adequate irrigation.",
    ]),
    rule(&["sooty mold", "sooty"], "Sooty Mold", 0.66, &[
        "Control sap-sucking insects (aphids/whiteflies).",
        "Wash foliage to remove soot where practical.",
        "Improve airflow and reduce honeydew sources.",
    ]),
    rule(&["healthy", "normal"], HEALTHY_LABEL, 0.90, &[
        "No action required.",
        "Continue routine scouting and good agronomy.",
    ]),
];

const TREATMENTS: &[(&str, &[&str])] = &[
    (UNKNOWN_LABEL, UNKNOWN_TREATMENT),
    (HEALTHY_LABEL, &["Maintain good agronomy; continue monitoring."]),
    ("Late Blight", &[
        "Destroy infected debris and volunteer hosts.",
        "Apply systemic+contact fungicide rotation as labeled.",
        "Improve drainage; avoid prolonged leaf wetness.",
    ]),
    ("Early Blight", &[
        "Remove lower infected leaves to reduce inoculum.",
        "Use protectant fungicides; rotate modes of action.",
        "Maintain balanced nutrition; avoid overhead irrigation.",
    ]),
    ("Rust", &[
        "Scout and remove heavily infected leaves.",
        "Apply rust-targeted fungicides per label.",
        "Reduce leaf wetness; increase airflow.",
    ]),
    ("Leaf Spot", &[
        "Prune affected foliage and dispose away from field.",
        "Use broad-spectrum protectants if pressure is high.",
        "Improve canopy airflow and sanitation.",
    ]),
    ("Downy Mildew", &[
        "Use effective downy mildew fungicides.",
        "Irrigate early; minimize night-time leaf wetness.",
        "Remove infected material; enhance airflow.",
    ]),
    ("Anthracnose", &[
        "Prune and destroy infected twigs/fruit.",
        "Preventive fungicide sprays during wet periods.",
        "Avoid overhead irrigation; sanitize tools.",
    ]),
    ("Septoria Leaf Spot", &[
        "Remove infected leaves and debris.",
        "Rotate crops; use clean seed/transplants.",
        "Apply protectants; improve airflow.",
    ]),
    ("Powdery Mildew", &[
        "Apply sulfur or labeled PM fungicides.",
        "Avoid excess nitrogen; improve sunlight and airflow.",
        "Remove severely infected leaves.",
    ]),
    ("Viral Mosaic", &[
        "Rogue infected plants to limit spread.",
        "Control vectors (aphids/whiteflies).",
        "Use virus-free seed/planting material.",
    ]),
    ("Leaf Curl Virus", &[
        "Rogue infected plants.",
        "Control whitefly/aphid vectors.",
        "Use virus-free transplants.",
    ]),
    ("Fusarium Wilt", &[
        "Remove infected plants; sanitize tools.",
        "Improve drainage; avoid waterlogging.",
        "Use resistant cultivars and rotate crops.",
    ]),
    ("Verticillium Wilt", &[
        "Rotate out of susceptible hosts.",
        "Improve soil health; solarize where feasible.",
        "Use resistant rootstocks/cultivars.",
    ]),
    ("Canker", &[
        "Prune cankered tissue 10–15 cm below symptoms; disinfect tools.",
        "Copper-based sprays after pruning.",
        "Avoid injuries and water stress.",
    ]),
    ("Leaf Miner Damage", &[
        "Remove mined leaves.",
        "Use labeled insecticides if pressure high.",
        "Promote natural enemies.",
    ]),
    ("Aphid Infestation", &[
        "Use insecticidal soap or aphicides as labeled.",
        "Control ants; encourage predators.",
        "Remove heavily infested shoots.",
    ]),
    ("Scab", &[
        "Maintain moisture and pH; avoid injuries.",
        "Use resistant varieties when available.",
        "Rotate out of susceptible hosts.",
    ]),
    ("Black Rot", &[
        "Remove mummified fruit and cankered wood.",
        "Fungicide program during susceptible stages.",
        "Open canopy to improve drying.",
    ]),
    ("Bacterial Leaf Spot", &[
        "Use certified disease-free seed/transplants.",
        "Copper-based bactericides; avoid handling wet foliage.",
        "Sanitize tools and manage splash dispersal.",
    ]),
    ("Bacterial Infection", &[
        "Prune infected tissue; sanitize equipment.",
        "Avoid working when foliage is wet.",
        "Consider copper products as labeled.",
    ]),
    ("Sunscald / Heat Stress", &[
        "Provide shade; stagger irrigation to reduce stress.",
        "Avoid midday sprays; use mulch to conserve moisture.",
        "Plan for heat-tolerant varieties.",
    ]),
    ("Nitrogen Deficiency", &[
        "Apply recommended nitrogen; avoid over-application.",
        "Incorporate organic matter; mulch.",
        "Verify with soil test; re-evaluate in 10–14 days.",
    ]),
    ("Potassium Deficiency", &[
        "Apply K fertilizer per soil test.",
        "Avoid drought stress.",
        "Balance N:K ratio.",
    ]),
    ("Magnesium Deficiency", &[
        "Apply Mg (e.g., Epsom salt) per recommendation.",
        "Manage soil pH.",
        "Avoid excess K competing with Mg.",
    ]),
    ("Iron Chlorosis", &[
        "Apply chelated iron.",
        "Adjust pH to optimal range.",
        "Improve drainage.",
    ]),
    ("Phosphorus Deficiency", &[
        "Apply P fertilizer per soil test.",
        "Maintain warm, well-drained soil.",
        "Avoid over-liming.",
    ]),
    ("Sooty Mold", &[
        "Control sap-sucking pests (aphids/whiteflies).",
        "Wash affected leaves where practical.",
        "Improve airflow; remove honeydew sources.",
    ]),
];
