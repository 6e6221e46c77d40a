//! Canonical cognitive-model types.
//!
//! Everything the indexer and the insight engine consume is expressed in
//! these types. All `strength` / `intensity` scalars live on a 0-10 scale.

use serde::{Deserialize, Serialize};

/// Lowest permitted value for strength and intensity scalars.
pub const SCALE_MIN: f64 = 0.0;
/// Highest permitted value for strength and intensity scalars.
pub const SCALE_MAX: f64 = 10.0;

/// Placeholder diagnosis used when a record does not carry one.
pub const UNKNOWN_DIAGNOSIS: &str = "To be determined";
/// Placeholder for missing demographic strings.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Check that a scalar is finite and inside the inclusive 0-10 scale.
pub fn in_scale(value: f64) -> bool {
    value.is_finite() && (SCALE_MIN..=SCALE_MAX).contains(&value)
}

// ============================================================================
// Cognitive Model
// ============================================================================

/// Canonical simulated-patient profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveModel {
    /// Stable model identifier.
    pub id: String,
    /// Display name of the simulated patient.
    pub name: String,
    /// Demographic information.
    pub demographic_info: DemographicInfo,
    /// Issues the patient presents with.
    #[serde(default)]
    pub presenting_issues: Vec<String>,
    /// Diagnostic information.
    pub diagnosis_info: DiagnosisInfo,
    /// Core and intermediate beliefs.
    #[serde(default)]
    pub core_beliefs: Vec<CoreBelief>,
    /// Detected cognitive distortions.
    #[serde(default)]
    pub distortion_patterns: Vec<DistortionPattern>,
    /// Behavioural patterns and coping strategies.
    #[serde(default)]
    pub behavioral_patterns: Vec<BehavioralPattern>,
    /// Emotional patterns.
    #[serde(default)]
    pub emotional_patterns: Vec<EmotionalPattern>,
    /// Relationship patterns.
    #[serde(default)]
    pub relationship_patterns: Vec<RelationshipPattern>,
    /// Experiences that shaped the belief system.
    #[serde(default)]
    pub formative_experiences: Vec<FormativeExperience>,
    /// Prior therapy.
    #[serde(default)]
    pub therapy_history: TherapyHistory,
    /// Numeric conversational style.
    #[serde(default)]
    pub conversational_style: ConversationalStyle,
    /// Goals the patient brings to therapy.
    #[serde(default)]
    pub goals_for_therapy: Vec<String>,
    /// Progress so far.
    #[serde(default)]
    pub therapeutic_progress: TherapeuticProgress,
}

impl CognitiveModel {
    /// Highest emotion intensity in the model, or 0 when there are no emotions.
    pub fn max_emotion_intensity(&self) -> f64 {
        self.emotional_patterns
            .iter()
            .map(|e| e.intensity)
            .fold(0.0, f64::max)
    }

    /// Lower-cased primary diagnosis.
    pub fn diagnosis_lower(&self) -> String {
        self.diagnosis_info.primary_diagnosis.to_lowercase()
    }
}

/// Demographic information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicInfo {
    /// Age in years.
    pub age: u32,
    /// Gender as reported.
    pub gender: String,
    /// Occupation.
    pub occupation: String,
    /// Family status.
    pub family_status: String,
    /// Cultural factors, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_factors: Option<Vec<String>>,
    /// Socioeconomic status, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socioeconomic_status: Option<String>,
}

impl Default for DemographicInfo {
    fn default() -> Self {
        Self {
            age: 30,
            gender: NOT_SPECIFIED.to_string(),
            occupation: NOT_SPECIFIED.to_string(),
            family_status: NOT_SPECIFIED.to_string(),
            cultural_factors: None,
            socioeconomic_status: None,
        }
    }
}

/// Diagnostic information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisInfo {
    /// Primary diagnosis.
    pub primary_diagnosis: String,
    /// Secondary diagnoses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_diagnoses: Option<Vec<String>>,
    /// Severity label.
    pub severity: String,
    /// How long the condition has been present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_of_symptoms: Option<String>,
    /// Treatments tried before.
    #[serde(default)]
    pub previous_treatments: Vec<String>,
}

impl DiagnosisInfo {
    /// Whether the primary diagnosis is something other than the placeholder.
    pub fn is_known(&self) -> bool {
        let primary = self.primary_diagnosis.trim();
        !primary.is_empty() && primary != UNKNOWN_DIAGNOSIS
    }
}

impl Default for DiagnosisInfo {
    fn default() -> Self {
        Self {
            primary_diagnosis: UNKNOWN_DIAGNOSIS.to_string(),
            secondary_diagnoses: None,
            severity: "moderate".to_string(),
            duration_of_symptoms: None,
            previous_treatments: Vec::new(),
        }
    }
}

// ============================================================================
// Beliefs and Distortions
// ============================================================================

/// A strongly-held belief with its strength and evidentiary basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreBelief {
    /// Belief statement.
    pub belief: String,
    /// Strength on the 0-10 scale.
    pub strength: f64,
    /// Evidence the patient cites.
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Where the belief came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation_context: Option<String>,
    /// Domain tags.
    #[serde(default)]
    pub related_domains: Vec<String>,
}

/// How often a distortion shows up, bucketed from its example count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistortionFrequency {
    /// Fewer than 2 examples.
    Rare,
    /// 2-4 examples.
    Occasional,
    /// 5-9 examples.
    Frequent,
    /// 10 or more examples.
    #[serde(alias = "persistent")]
    Pervasive,
}

impl DistortionFrequency {
    /// Bucket an example count.
    pub fn from_example_count(count: usize) -> Self {
        match count {
            0..=1 => DistortionFrequency::Rare,
            2..=4 => DistortionFrequency::Occasional,
            5..=9 => DistortionFrequency::Frequent,
            _ => DistortionFrequency::Pervasive,
        }
    }

    /// Numeric severity used when averaging over trigger themes.
    pub fn severity(&self) -> f64 {
        match self {
            DistortionFrequency::Rare => 1.0,
            DistortionFrequency::Occasional => 3.0,
            DistortionFrequency::Frequent => 6.0,
            DistortionFrequency::Pervasive => 9.0,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistortionFrequency::Rare => "rare",
            DistortionFrequency::Occasional => "occasional",
            DistortionFrequency::Frequent => "frequent",
            DistortionFrequency::Pervasive => "pervasive",
        }
    }
}

impl std::fmt::Display for DistortionFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cognitive distortion category with supporting examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistortionPattern {
    /// Distortion category name.
    #[serde(rename = "type")]
    pub distortion_type: String,
    /// Statements that exhibit the distortion.
    #[serde(default)]
    pub examples: Vec<String>,
    /// Themes that trigger the distortion.
    #[serde(default)]
    pub trigger_themes: Vec<String>,
    /// Frequency bucket.
    pub frequency: DistortionFrequency,
}

// ============================================================================
// Behaviour, Emotion, Relationships
// ============================================================================

/// Kind of behavioural pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    /// A behaviour the patient falls into.
    #[default]
    Reactive,
    /// A coping strategy the patient uses.
    Coping,
}

/// A recurring behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralPattern {
    /// Behaviour description.
    pub behavior: String,
    /// Situations that trigger it.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Frequency label.
    pub frequency: String,
    /// Consequences of the behaviour.
    #[serde(default)]
    pub consequences: Vec<String>,
    /// Reactive behaviour or coping strategy.
    #[serde(default)]
    pub kind: BehaviorKind,
}

/// A recurring emotional response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalPattern {
    /// Emotion label.
    pub emotion: String,
    /// Intensity on the 0-10 scale.
    pub intensity: f64,
    /// Triggers.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Physical manifestations.
    #[serde(default)]
    pub physical_manifestations: Vec<String>,
    /// Coping mechanisms.
    #[serde(default)]
    pub coping_mechanisms: Vec<String>,
}

/// How the patient relates to a class of people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipPattern {
    /// Relationship type (family, romantic, work, ...).
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// Expectations.
    #[serde(default)]
    pub expectations: Vec<String>,
    /// Fears.
    #[serde(default)]
    pub fears: Vec<String>,
    /// Observed patterns.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// An experience that shaped the belief system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormativeExperience {
    /// Life stage ("childhood", "unknown age", ...).
    pub age: String,
    /// What happened.
    pub event: String,
    /// Impact on the patient.
    pub impact: String,
    /// Beliefs the experience formed.
    #[serde(default)]
    pub beliefs_formed: Vec<String>,
    /// Inferred emotional response.
    pub emotional_response: String,
}

// ============================================================================
// Therapy
// ============================================================================

/// Prior therapy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TherapyHistory {
    /// Approaches tried before.
    #[serde(default)]
    pub previous_approaches: Vec<String>,
    /// Interventions that helped.
    #[serde(default)]
    pub helpful_interventions: Vec<String>,
    /// Interventions that did not help.
    #[serde(default)]
    pub unhelpful_interventions: Vec<String>,
    /// Insights gained.
    #[serde(default)]
    pub insights_gained: Vec<String>,
    /// Free-text progress summary.
    #[serde(default)]
    pub progress_made: String,
}

/// Four numeric conversational dimensions, each 1-10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversationalStyle {
    /// How much the patient talks.
    pub verbosity: f64,
    /// How openly emotion is expressed.
    pub emotional_expressiveness: f64,
    /// Resistance to the therapist.
    pub resistance: f64,
    /// Insight into their own patterns.
    pub insight_level: f64,
}

impl ConversationalStyle {
    /// The neutral style used when a record has no style data.
    pub fn neutral() -> Self {
        Self {
            verbosity: 5.0,
            emotional_expressiveness: 5.0,
            resistance: 5.0,
            insight_level: 5.0,
        }
    }
}

impl Default for ConversationalStyle {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Stage of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReadiness {
    /// Not yet considering change.
    Precontemplation,
    /// Ambivalent about change.
    #[default]
    Contemplation,
    /// Preparing to change.
    Preparation,
}

impl ChangeReadiness {
    /// Derive readiness from a resistance score.
    pub fn from_resistance(resistance: f64) -> Self {
        if resistance >= 7.0 {
            ChangeReadiness::Precontemplation
        } else if resistance >= 4.0 {
            ChangeReadiness::Contemplation
        } else {
            ChangeReadiness::Preparation
        }
    }
}

/// Therapeutic progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticProgress {
    /// Insights the patient has reached.
    #[serde(default)]
    pub insights: Vec<String>,
    /// Current resistance level.
    pub resistance_level: f64,
    /// Stage of change.
    pub change_readiness: ChangeReadiness,
    /// Sessions completed so far.
    #[serde(default)]
    pub sessions_completed: u32,
    /// Trust in the therapist (1-10).
    pub trust_level: f64,
}

impl Default for TherapeuticProgress {
    fn default() -> Self {
        Self {
            insights: Vec::new(),
            resistance_level: 5.0,
            change_readiness: ChangeReadiness::Contemplation,
            sessions_completed: 0,
            trust_level: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_scale_bounds_are_inclusive() {
        assert!(in_scale(0.0));
        assert!(in_scale(10.0));
        assert!(!in_scale(-0.1));
        assert!(!in_scale(10.5));
        assert!(!in_scale(f64::NAN));
    }

    #[test]
    fn test_frequency_buckets() {
        assert_eq!(DistortionFrequency::from_example_count(0), DistortionFrequency::Rare);
        assert_eq!(DistortionFrequency::from_example_count(1), DistortionFrequency::Rare);
        assert_eq!(DistortionFrequency::from_example_count(2), DistortionFrequency::Occasional);
        assert_eq!(DistortionFrequency::from_example_count(4), DistortionFrequency::Occasional);
        assert_eq!(DistortionFrequency::from_example_count(5), DistortionFrequency::Frequent);
        assert_eq!(DistortionFrequency::from_example_count(9), DistortionFrequency::Frequent);
        assert_eq!(DistortionFrequency::from_example_count(10), DistortionFrequency::Pervasive);
    }

    #[test]
    fn test_change_readiness_from_resistance() {
        assert_eq!(ChangeReadiness::from_resistance(8.0), ChangeReadiness::Precontemplation);
        assert_eq!(ChangeReadiness::from_resistance(5.0), ChangeReadiness::Contemplation);
        assert_eq!(ChangeReadiness::from_resistance(2.0), ChangeReadiness::Preparation);
    }

    #[test]
    fn test_diagnosis_placeholder_is_unknown() {
        assert!(!DiagnosisInfo::default().is_known());
        let info = DiagnosisInfo {
            primary_diagnosis: "Generalized Anxiety Disorder".to_string(),
            ..DiagnosisInfo::default()
        };
        assert!(info.is_known());
    }

    #[test]
    fn test_distortion_pattern_serializes_type_field() {
        let pattern = DistortionPattern {
            distortion_type: "labeling".to_string(),
            examples: vec!["I'm a failure".to_string()],
            trigger_themes: vec!["failure".to_string()],
            frequency: DistortionFrequency::Rare,
        };
        let json = serde_json::to_value(&pattern).unwrap();
        assert_eq!(json["type"], "labeling");
        assert_eq!(json["frequency"], "rare");
    }
}
