//! Post-transform validation and data-quality scoring.

use serde::{Deserialize, Serialize};

use crate::model::{in_scale, CognitiveModel};

/// Number of fields counted towards completeness.
const REQUIRED_FIELD_COUNT: f64 = 12.0;

/// Validation outcome of a normalized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// No issues.
    Valid,
    /// Missing structural fields; the model is still usable.
    Warning,
    /// A scalar is outside the 0-10 scale.
    Error,
}

impl ValidationStatus {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of [`validate_model`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Overall status.
    pub status: ValidationStatus,
    /// Human-readable notes for every warning and error found.
    pub notes: Vec<String>,
}

/// Three independent 0-1 data-quality metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Fraction of the twelve required fields that are filled.
    pub completeness: f64,
    /// Lexical agreement between belief domains and emotion triggers.
    pub consistency: f64,
    /// Penalised plausibility of the profile.
    pub clinical_validity: f64,
}

/// Check a normalized model for warnings and hard errors.
///
/// Warnings never downgrade an error status.
pub fn validate_model(model: &CognitiveModel) -> ValidationReport {
    let mut status = ValidationStatus::Valid;
    let mut notes = Vec::new();

    let mut warn = |note: String, status: &mut ValidationStatus| {
        if *status == ValidationStatus::Valid {
            *status = ValidationStatus::Warning;
        }
        notes.push(note);
    };

    if model.name.trim().is_empty() {
        warn("Missing patient name".to_string(), &mut status);
    }
    if model.core_beliefs.is_empty() {
        warn("No core beliefs identified".to_string(), &mut status);
    }
    if model.presenting_issues.is_empty() {
        warn("No presenting issues identified".to_string(), &mut status);
    }

    for belief in &model.core_beliefs {
        if !in_scale(belief.strength) {
            status = ValidationStatus::Error;
            notes.push(format!(
                "Belief strength out of range (0-10): '{}' has {}",
                belief.belief, belief.strength
            ));
        }
    }
    for emotion in &model.emotional_patterns {
        if !in_scale(emotion.intensity) {
            status = ValidationStatus::Error;
            notes.push(format!(
                "Emotion intensity out of range (0-10): '{}' has {}",
                emotion.emotion, emotion.intensity
            ));
        }
    }

    ValidationReport { status, notes }
}

/// Score completeness, consistency and clinical validity.
pub fn assess_quality(model: &CognitiveModel) -> DataQuality {
    DataQuality {
        completeness: completeness(model),
        consistency: consistency(model),
        clinical_validity: clinical_validity(model),
    }
}

fn completeness(model: &CognitiveModel) -> f64 {
    let checks = [
        !model.name.trim().is_empty(),
        !model.presenting_issues.is_empty(),
        !model.core_beliefs.is_empty(),
        !model.distortion_patterns.is_empty(),
        !model.behavioral_patterns.is_empty(),
        !model.emotional_patterns.is_empty(),
        !model.relationship_patterns.is_empty(),
        !model.formative_experiences.is_empty(),
        !model.goals_for_therapy.is_empty(),
        model.demographic_info.age > 0,
        model.diagnosis_info.is_known(),
        model.conversational_style.verbosity > 0.0,
    ];
    let filled = checks.iter().filter(|c| **c).count() as f64;
    filled / REQUIRED_FIELD_COUNT
}

fn consistency(model: &CognitiveModel) -> f64 {
    if model.core_beliefs.is_empty() || model.emotional_patterns.is_empty() {
        return 1.0;
    }

    let domains: Vec<String> = model
        .core_beliefs
        .iter()
        .flat_map(|b| b.related_domains.iter().map(|d| d.to_lowercase()))
        .collect();
    let triggers: Vec<String> = model
        .emotional_patterns
        .iter()
        .flat_map(|e| e.triggers.iter().map(|t| t.to_lowercase()))
        .collect();

    let total = domains.len() * triggers.len();
    if total == 0 {
        return 1.0;
    }

    let overlapping = domains
        .iter()
        .flat_map(|d| triggers.iter().map(move |t| (d, t)))
        .filter(|(d, t)| lexical_overlap(d, t))
        .count();

    overlapping as f64 / total as f64
}

/// Two texts overlap when one contains the other or they share a word of
/// three or more characters.
fn lexical_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.contains(b) || b.contains(a) {
        return true;
    }
    let words = |s: &str| -> Vec<String> {
        s.split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() >= 3)
            .map(str::to_string)
            .collect()
    };
    let b_words = words(b);
    words(a).iter().any(|w| b_words.contains(w))
}

fn clinical_validity(model: &CognitiveModel) -> f64 {
    let mut score: f64 = 1.0;

    let emotions = model.emotional_patterns.len();
    if emotions > 0 {
        let maxed = model
            .emotional_patterns
            .iter()
            .filter(|e| e.intensity == 10.0)
            .count();
        if maxed as f64 / emotions as f64 > 0.5 {
            score -= 0.2;
        }
    }

    if model.core_beliefs.len() > 20 {
        score -= 0.1;
    }

    score.max(0.0)
}
