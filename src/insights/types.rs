//! Serializable insight snapshot types.
//!
//! Every section implements `Default`, which is its zero-valued form for an
//! empty collection or a disabled focus area.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Snapshot
// ============================================================================

/// Aggregate analysis of one model collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInsights {
    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
    /// Models analysed.
    pub model_count: usize,
    /// Belief statistics.
    pub belief_distribution: BeliefDistribution,
    /// Emotion statistics.
    pub emotional_patterns: EmotionalPatternInsight,
    /// Conversational style statistics.
    pub communication_styles: CommunicationStyleDistribution,
    /// Distortion statistics.
    pub distortion_patterns: DistortionPatternAnalysis,
    /// Rule-based recommendations.
    pub therapeutic_insights: TherapeuticInsights,
    /// Collection-level scores.
    pub dataset_metrics: DatasetMetrics,
}

// ============================================================================
// Beliefs
// ============================================================================

/// Belief counts by domain and strength.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeliefDistribution {
    /// Beliefs per related domain.
    pub by_domain: BTreeMap<String, usize>,
    /// Strength histogram.
    pub by_strength: StrengthHistogram,
    /// Ten most frequent belief statements.
    pub most_common: Vec<CommonBelief>,
}

/// Four-bucket belief strength histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthHistogram {
    /// Below 4.
    pub low: usize,
    /// 4 up to 7.
    pub moderate: usize,
    /// 7 up to 9.
    pub high: usize,
    /// 9 and above.
    pub extreme: usize,
}

impl StrengthHistogram {
    /// Sum of all buckets.
    pub fn total(&self) -> usize {
        self.low + self.moderate + self.high + self.extreme
    }
}

/// A belief statement shared across the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonBelief {
    /// Statement as first seen.
    pub belief: String,
    /// Occurrences.
    pub frequency: usize,
    /// Mean strength.
    pub average_strength: f64,
    /// Union of related domains.
    pub domains: Vec<String>,
}

// ============================================================================
// Emotions
// ============================================================================

/// Emotion frequency, triggers and co-occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionalPatternInsight {
    /// Per-emotion statistics.
    pub by_emotion: BTreeMap<String, EmotionStats>,
    /// Fifteen most frequent triggers.
    pub common_triggers: Vec<TriggerFrequency>,
    /// Twenty strongest co-occurrence chains.
    pub emotional_chains: Vec<EmotionalChain>,
}

/// Statistics for one emotion label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionStats {
    /// Occurrences.
    pub frequency: usize,
    /// Mean intensity.
    pub average_intensity: f64,
}

/// A trigger with the emotions it provokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerFrequency {
    /// Trigger text.
    pub trigger: String,
    /// Occurrences.
    pub frequency: usize,
    /// Emotions the trigger is attached to.
    pub emotions: Vec<String>,
}

/// Conditional co-occurrence of two emotions within one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalChain {
    /// Conditioning emotion.
    pub from: String,
    /// Co-occurring emotion.
    pub to: String,
    /// Models carrying both.
    pub co_occurrences: usize,
    /// `co_occurrences` over models carrying `from`.
    pub strength: f64,
}

// ============================================================================
// Communication
// ============================================================================

/// Inferred style distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunicationStyleDistribution {
    /// Models per inferred style.
    pub by_style: BTreeMap<String, usize>,
    /// Mean verbosity.
    pub average_verbosity: f64,
    /// Mean resistance.
    pub average_resistance: f64,
    /// Per-style domain and emotion correlation.
    pub correlations: Vec<StyleCorrelation>,
}

/// Tags seen alongside one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleCorrelation {
    /// Style label.
    pub style: String,
    /// Distinct belief domains.
    pub belief_domains: Vec<String>,
    /// Distinct emotions.
    pub emotions: Vec<String>,
    /// Distinct tag count over collection size, at most 1.
    pub strength: f64,
}

// ============================================================================
// Distortions
// ============================================================================

/// Distortion frequency, combinations and severity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionPatternAnalysis {
    /// Occurrences per distortion type.
    pub by_type: BTreeMap<String, usize>,
    /// Type sets recurring in more than one model.
    pub common_combinations: Vec<DistortionCombination>,
    /// Mean frequency severity per trigger theme.
    pub severity_by_theme: BTreeMap<String, f64>,
}

/// A set of distortion types found together in one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistortionCombination {
    /// Sorted types joined with `+`.
    pub combination: String,
    /// Sorted types.
    pub types: Vec<String>,
    /// Models with exactly this set.
    pub frequency: usize,
}

// ============================================================================
// Therapeutic
// ============================================================================

/// Trainee level a recommendation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    /// Suitable for new trainees.
    Beginner,
    /// Needs some experience.
    Intermediate,
    /// Needs an experienced clinician.
    Advanced,
}

/// Recommendations, resistance patterns and intervention estimates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticInsights {
    /// Triggered recommendations.
    pub recommendations: Vec<Recommendation>,
    /// Resistance patterns present in the collection.
    pub resistance_patterns: Vec<ResistancePattern>,
    /// Estimated effectiveness per intervention.
    pub intervention_effectiveness: Vec<InterventionEffectiveness>,
}

/// A structured treatment recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Condition that triggered it.
    pub condition: String,
    /// Suggested intervention.
    pub intervention: String,
    /// Why it applies.
    pub rationale: String,
    /// Expected outcome.
    pub expected_outcome: String,
    /// Trainee level.
    pub difficulty: DifficultyTier,
}

/// A named resistance heuristic and where it applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistancePattern {
    /// Pattern name.
    pub pattern: String,
    /// What it looks like.
    pub description: String,
    /// Affected models over collection size.
    pub prevalence: f64,
    /// Models matching the heuristic.
    pub affected_models: usize,
    /// Illustrative success rate of the suggested strategies.
    pub success_rate: f64,
    /// Suggested strategies.
    pub strategies: Vec<String>,
}

/// Estimated effectiveness of an intervention for this collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionEffectiveness {
    /// Intervention name.
    pub intervention: String,
    /// Estimated success rate, 0.3-0.9.
    pub success_rate: f64,
    /// Typical sessions before improvement.
    pub average_sessions: u32,
    /// Models that are good candidates.
    pub candidate_count: usize,
    /// Models with contraindications.
    pub contraindication_count: usize,
    /// Who is a good candidate.
    pub candidates: String,
    /// Who should not receive it.
    pub contraindications: String,
}

// ============================================================================
// Metrics
// ============================================================================

/// Collection-level scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    /// Mean weighted model complexity.
    pub average_complexity: f64,
    /// Distinct tags over the per-model ceiling, 0-1.
    pub diversity_score: f64,
    /// Mean structural completeness, 0-1.
    pub quality_score: f64,
}
