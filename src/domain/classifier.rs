//! Criticality classifier: keyword precedence over description text.
//!
//! Runs exactly once, at ticket creation. Pure and deterministic so the
//! derived SLA deadline is reproducible for the same input.

use super::ticket::{Category, Criticality};

/// Keywords that force [`Criticality::Critical`] regardless of category.
const CRITICAL_KEYWORDS: &[&str] = &[
    "emergency",
    "urgent",
    "danger",
    "critical",
    "immediate",
    "burst",
    "overflow",
    "accident",
];

/// Keywords that raise the tier to [`Criticality::High`] when no
/// critical keyword matched.
const HIGH_KEYWORDS: &[&str] = &[
    "major",
    "serious",
    "important",
    "significant",
    "blockage",
    "leakage",
];

/// Derives the criticality tier from category and description.
///
/// Precedence, first match wins:
/// 1. description contains a critical keyword → `Critical`;
/// 2. description contains a high keyword → `High`;
/// 3. category is infrastructure-essential → `Medium`;
/// 4. otherwise → `Low`.
///
/// Matching is case-insensitive substring matching against the
/// lower-cased description.
#[must_use]
pub fn classify(category: Category, description: &str) -> Criticality {
    let description = description.to_lowercase();

    if CRITICAL_KEYWORDS.iter().any(|kw| description.contains(kw)) {
        Criticality::Critical
    } else if HIGH_KEYWORDS.iter().any(|kw| description.contains(kw)) {
        Criticality::High
    } else if category.is_infrastructure_essential() {
        Criticality::Medium
    } else {
        Criticality::Low
    }
}
