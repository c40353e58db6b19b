//! Severity-adjusted treatment plans.

use super::catalog::Catalog;
use crate::models::enums::Severity;

pub const URGENT_STEP: &str = "Urgent: Act within 24–48 hours.";
pub const DAILY_SCOUTING_STEP: &str = "Increase scouting frequency (daily) until stabilized.";
pub const MODERATE_MONITORING_STEP: &str = "Monitor twice per week and reassess in 7 days.";
pub const LOW_MONITORING_STEP: &str = "Monitor weekly; no drastic actions needed.";

/// Wrap base steps with severity-specific urgency and monitoring lines.
///
/// Always returns a new list; `steps` is borrowed from the shared catalog.
pub fn adjust_for_severity(steps: &[&str], severity: Severity) -> Vec<String> {
    let mut plan = Vec::with_capacity(steps.len() + 2);
    if severity == Severity::High {
        plan.push(URGENT_STEP.to_string());
    }
    plan.extend(steps.iter().map(|s| s.to_string()));
    plan.push(
        match severity {
            Severity::High => DAILY_SCOUTING_STEP,
            Severity::Moderate => MODERATE_MONITORING_STEP,
            Severity::Low => LOW_MONITORING_STEP,
        }
        .to_string(),
    );
    plan
}

/// Look up the base steps for `disease` and adjust them for `severity`.
pub fn treatment_plan(catalog: &Catalog, disease: &str, severity: Severity) -> Vec<String> {
    adjust_for_severity(catalog.treatment_steps(disease), severity)
}
