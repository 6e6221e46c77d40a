//! Raw patient records as produced by upstream dataset parsers.
//!
//! Every field is optional. Both `camelCase` and `snake_case` keys are
//! accepted so records exported from different tools deserialize alike.
//! Ids and names may be strings or numbers; numeric scalars may be numbers
//! or numeric strings, and unparseable values read as absent.
//!
//! [`RawPatientRecord::from_value`] parses one record of a batch, turning a
//! shape mismatch into a [`NormalizationError::Malformed`] for that record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::NormalizationError;

/// A loosely-typed simulated-patient record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPatientRecord {
    /// Source identifier.
    #[serde(deserialize_with = "lenient_text")]
    pub id: Option<String>,
    /// Display name.
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    /// Demographics.
    pub demographics: Option<RawDemographics>,
    /// Diagnosis.
    pub diagnosis: Option<RawDiagnosis>,
    /// Presenting issues.
    #[serde(alias = "presentingIssues", alias = "presenting_problems")]
    pub presenting_issues: Vec<String>,
    /// Explicit core beliefs.
    #[serde(alias = "coreBeliefs")]
    pub core_beliefs: Vec<RawCoreBelief>,
    /// Intermediate beliefs (rules, attitudes, assumptions).
    #[serde(alias = "intermediateBeliefs")]
    pub intermediate_beliefs: Vec<RawIntermediateBelief>,
    /// Free-text automatic thoughts.
    #[serde(alias = "automaticThoughts")]
    pub automatic_thoughts: Vec<String>,
    /// Emotions.
    pub emotions: Vec<RawEmotion>,
    /// Behaviours.
    pub behaviors: Vec<RawBehavior>,
    /// Coping strategies.
    #[serde(alias = "copingStrategies")]
    pub coping_strategies: Vec<String>,
    /// Relationships.
    pub relationships: Vec<RawRelationship>,
    /// Generic history items.
    pub history: Vec<String>,
    /// Conversational style label and difficulty.
    #[serde(alias = "conversationalStyle")]
    pub conversational_style: Option<RawConversationalStyle>,
    /// Goals for therapy.
    pub goals: Vec<String>,
    /// Prior therapy.
    #[serde(alias = "therapyHistory")]
    pub therapy_history: Option<RawTherapyHistory>,
    /// Session context.
    #[serde(alias = "sessionContext")]
    pub session_context: Option<RawSessionContext>,
}

/// Raw demographics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDemographics {
    /// Age in years.
    #[serde(deserialize_with = "lenient_count")]
    pub age: Option<u32>,
    /// Gender.
    pub gender: Option<String>,
    /// Occupation.
    pub occupation: Option<String>,
    /// Family status.
    #[serde(alias = "familyStatus")]
    pub family_status: Option<String>,
    /// Cultural factors.
    #[serde(alias = "culturalFactors")]
    pub cultural_factors: Option<Vec<String>>,
    /// Socioeconomic status.
    #[serde(alias = "socioeconomicStatus")]
    pub socioeconomic_status: Option<String>,
}

/// Raw diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDiagnosis {
    /// Primary diagnosis.
    #[serde(alias = "primaryDiagnosis")]
    pub primary: Option<String>,
    /// Secondary diagnoses.
    #[serde(alias = "secondaryDiagnoses")]
    pub secondary: Option<Vec<String>>,
    /// Severity label.
    pub severity: Option<String>,
    /// Duration of symptoms.
    pub duration: Option<String>,
    /// Previous treatments.
    #[serde(alias = "previousTreatments")]
    pub previous_treatments: Vec<String>,
}

/// Raw explicit core belief.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCoreBelief {
    /// Belief statement.
    pub belief: String,
    /// Domain/category tag.
    pub category: Option<String>,
    /// Strength, 0-10.
    #[serde(deserialize_with = "lenient_number")]
    pub strength: Option<f64>,
    /// Evidence.
    pub evidence: Vec<String>,
    /// Formation context.
    #[serde(alias = "formationContext")]
    pub formation_context: Option<String>,
}

/// Raw intermediate belief.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIntermediateBelief {
    /// Belief statement.
    pub belief: String,
    /// Strength, 0-10.
    #[serde(deserialize_with = "lenient_number")]
    pub strength: Option<f64>,
    /// Evidence.
    pub evidence: Vec<String>,
}

/// Raw emotion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEmotion {
    /// Emotion label.
    pub emotion: String,
    /// Intensity, 0-10.
    #[serde(deserialize_with = "lenient_number")]
    pub intensity: Option<f64>,
    /// Triggers.
    pub triggers: Vec<String>,
    /// Physical manifestations.
    #[serde(alias = "physicalManifestations")]
    pub physical_manifestations: Vec<String>,
    /// Coping mechanisms.
    #[serde(alias = "copingMechanisms")]
    pub coping_mechanisms: Vec<String>,
}

/// Raw behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBehavior {
    /// Behaviour description.
    pub behavior: String,
    /// Triggers.
    pub triggers: Vec<String>,
    /// Frequency label.
    pub frequency: Option<String>,
    /// Consequences.
    pub consequences: Vec<String>,
}

/// Raw relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRelationship {
    /// Relationship type.
    #[serde(rename = "type", alias = "relationship_type")]
    pub relationship_type: String,
    /// Expectations.
    pub expectations: Vec<String>,
    /// Fears.
    pub fears: Vec<String>,
    /// Patterns.
    pub patterns: Vec<String>,
}

/// Raw conversational style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConversationalStyle {
    /// Style label (plain, upset, verbose, reserved, tangent, pleasing).
    pub style: Option<String>,
    /// Difficulty tag (easy, medium, hard).
    pub difficulty: Option<String>,
}

/// Raw therapy history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTherapyHistory {
    /// Approaches tried before.
    #[serde(alias = "previousApproaches")]
    pub previous_approaches: Vec<String>,
    /// Interventions that helped.
    #[serde(alias = "helpfulInterventions")]
    pub helpful_interventions: Vec<String>,
    /// Interventions that did not help.
    #[serde(alias = "unhelpfulInterventions")]
    pub unhelpful_interventions: Vec<String>,
    /// Insights gained.
    #[serde(alias = "insightsGained")]
    pub insights_gained: Vec<String>,
    /// Progress summary.
    #[serde(alias = "progressMade")]
    pub progress_made: Option<String>,
}

/// Raw session context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSessionContext {
    /// Situation under discussion.
    pub situation: Option<String>,
    /// Setting.
    pub setting: Option<String>,
    /// Session number.
    #[serde(alias = "sessionNumber", deserialize_with = "lenient_count")]
    pub session_number: Option<u32>,
}

impl RawPatientRecord {
    /// Parse one record of a batch.
    ///
    /// On failure the error carries the record's `id` when one can be read,
    /// else `record[<position>]`.
    pub fn from_value(value: &Value, position: usize) -> Result<Self, NormalizationError> {
        Self::deserialize(value).map_err(|e| NormalizationError::Malformed {
            source_id: value
                .get("id")
                .and_then(scalar_text)
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("record[{}]", position)),
            message: e.to_string(),
        })
    }
}

// ============================================================================
// Lenient scalars
// ============================================================================

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(&Value::deserialize(deserializer)?))
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(scalar_number(&Value::deserialize(deserializer)?))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(scalar_number(&Value::deserialize(deserializer)?)
        .filter(|n| (0.0..=f64::from(u32::MAX)).contains(n))
        .map(|n| n.round() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_deserializes() {
        let record: RawPatientRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(record, RawPatientRecord::default());
    }

    #[test]
    fn test_camel_case_aliases() {
        let record: RawPatientRecord = serde_json::from_value(json!({
            "id": "p-1",
            "coreBeliefs": [{"belief": "I am unlovable", "formationContext": "parents divorced"}],
            "automaticThoughts": ["Nobody will ever call me back"],
            "conversationalStyle": {"style": "reserved"},
            "demographics": {"age": 41, "familyStatus": "divorced"}
        }))
        .unwrap();

        assert_eq!(record.core_beliefs.len(), 1);
        assert_eq!(
            record.core_beliefs[0].formation_context.as_deref(),
            Some("parents divorced")
        );
        assert_eq!(record.automatic_thoughts.len(), 1);
        assert_eq!(
            record.conversational_style.unwrap().style.as_deref(),
            Some("reserved")
        );
        assert_eq!(record.demographics.unwrap().family_status.as_deref(), Some("divorced"));
    }

    #[test]
    fn test_loose_scalars() {
        let record: RawPatientRecord = serde_json::from_value(json!({
            "id": 42,
            "demographics": {"age": "35"},
            "coreBeliefs": [
                {"belief": "I am weak", "strength": "7.5"},
                {"belief": "I am alone", "strength": "high"}
            ],
            "emotions": [{"emotion": "fear", "intensity": null}],
            "sessionContext": {"sessionNumber": 3.0}
        }))
        .unwrap();

        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.demographics.unwrap().age, Some(35));
        assert_eq!(record.core_beliefs[0].strength, Some(7.5));
        assert_eq!(record.core_beliefs[1].strength, None);
        assert_eq!(record.emotions[0].intensity, None);
        assert_eq!(record.session_context.unwrap().session_number, Some(3));
    }

    #[test]
    fn test_fractional_and_negative_ages() {
        let age = |value: Value| {
            let record: RawPatientRecord =
                serde_json::from_value(json!({"demographics": {"age": value}})).unwrap();
            record.demographics.unwrap().age
        };
        assert_eq!(age(json!(35.5)), Some(36));
        assert_eq!(age(json!(-4)), None);
        assert_eq!(age(json!("unknown")), None);
    }

    #[test]
    fn test_from_value_reports_shape_errors() {
        let err = RawPatientRecord::from_value(&json!({"id": "bad", "coreBeliefs": "none"}), 3)
            .unwrap_err();
        assert_eq!(err.source_id(), "bad");
        assert!(matches!(err, NormalizationError::Malformed { .. }));

        let err = RawPatientRecord::from_value(&json!("just text"), 3).unwrap_err();
        assert_eq!(err.source_id(), "record[3]");
    }
}
