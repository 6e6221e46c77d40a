//! Rule-based therapeutic recommendations.
//!
//! Thresholds and success-rate constants are illustrative heuristics for
//! training-scenario planning, not clinical estimates.

use super::types::{
    DifficultyTier, InterventionEffectiveness, Recommendation, ResistancePattern,
    TherapeuticInsights,
};
use super::{ensure_finite, Phase};
use crate::error::InsightResult;
use crate::model::{BehaviorKind, CognitiveModel};

// ============================================================================
// Entry Point
// ============================================================================

/// Recommendations, resistance patterns and intervention effectiveness.
pub fn analyze_therapeutic(models: &[CognitiveModel]) -> InsightResult<TherapeuticInsights> {
    if models.is_empty() {
        return Ok(TherapeuticInsights::default());
    }

    for model in models {
        let style = &model.conversational_style;
        ensure_finite(Phase::TherapeuticInsights, "resistance", style.resistance)?;
        ensure_finite(Phase::TherapeuticInsights, "insight level", style.insight_level)?;
        ensure_finite(Phase::TherapeuticInsights, "verbosity", style.verbosity)?;
        ensure_finite(
            Phase::TherapeuticInsights,
            "emotional expressiveness",
            style.emotional_expressiveness,
        )?;
        for emotion in &model.emotional_patterns {
            ensure_finite(Phase::TherapeuticInsights, "emotion intensity", emotion.intensity)?;
        }
    }

    Ok(TherapeuticInsights {
        recommendations: recommendations(models),
        resistance_patterns: resistance_patterns(models),
        intervention_effectiveness: intervention_effectiveness(models),
    })
}

fn diagnosis_mentions(model: &CognitiveModel, keywords: &[&str]) -> bool {
    let primary = model.diagnosis_lower();
    let secondary = model
        .diagnosis_info
        .secondary_diagnoses
        .iter()
        .flatten()
        .map(|d| d.to_lowercase());
    std::iter::once(primary)
        .chain(secondary)
        .any(|d| keywords.iter().any(|k| d.contains(k)))
}

fn is_trauma(model: &CognitiveModel) -> bool {
    diagnosis_mentions(model, &["trauma", "ptsd"])
}

fn is_depression(model: &CognitiveModel) -> bool {
    diagnosis_mentions(model, &["depress"])
}

fn is_anxiety(model: &CognitiveModel) -> bool {
    diagnosis_mentions(model, &["anxiety", "panic", "phobia"])
}

fn count(models: &[CognitiveModel], predicate: impl Fn(&CognitiveModel) -> bool) -> usize {
    models.iter().filter(|&m| predicate(m)).count()
}

// ============================================================================
// Recommendations
// ============================================================================

fn recommendations(models: &[CognitiveModel]) -> Vec<Recommendation> {
    let n = models.len() as f64;
    let mut out = Vec::new();

    let high_resistance = count(models, |m| m.conversational_style.resistance >= 7.0);
    if high_resistance as f64 / n > 0.3 {
        out.push(Recommendation {
            condition: format!(
                "High resistance (7+) in {} of {} models",
                high_resistance,
                models.len()
            ),
            intervention: "Motivational interviewing".to_string(),
            rationale: "Resistant patients respond better to exploring ambivalence than to direct challenge"
                .to_string(),
            expected_outcome: "Improved engagement and readiness for change".to_string(),
            difficulty: DifficultyTier::Advanced,
        });
    }

    if models.iter().any(|m| {
        m.distortion_patterns.len() >= 3 && m.conversational_style.insight_level <= 4.0
    }) {
        out.push(Recommendation {
            condition: "Multiple cognitive distortions with limited insight".to_string(),
            intervention: "Cognitive restructuring with guided discovery".to_string(),
            rationale: "Socratic questioning builds awareness of distortions before challenging them"
                .to_string(),
            expected_outcome: "Recognition of thinking patterns and more balanced appraisals"
                .to_string(),
            difficulty: DifficultyTier::Intermediate,
        });
    }

    if models
        .iter()
        .any(|m| is_trauma(m) || m.max_emotion_intensity() >= 8.0)
    {
        out.push(Recommendation {
            condition: "Trauma history or intense emotional responses (8+)".to_string(),
            intervention: "Trauma-informed care with emotion regulation skills".to_string(),
            rationale: "Stabilisation and regulation skills come before processing difficult material"
                .to_string(),
            expected_outcome: "Reduced emotional overwhelm and safer engagement".to_string(),
            difficulty: DifficultyTier::Advanced,
        });
    }

    if models.iter().any(|m| is_depression(m) || is_anxiety(m)) {
        out.push(Recommendation {
            condition: "Depression or anxiety diagnosis".to_string(),
            intervention: "Cognitive behavioral therapy with behavioral activation".to_string(),
            rationale: "Structured CBT has a strong evidence base for mood and anxiety presentations"
                .to_string(),
            expected_outcome: "Symptom reduction and increased activity".to_string(),
            difficulty: DifficultyTier::Beginner,
        });
    }

    out
}

// ============================================================================
// Resistance Patterns
// ============================================================================

struct ResistanceRule {
    pattern: &'static str,
    description: &'static str,
    success_rate: f64,
    strategies: &'static [&'static str],
    matches: fn(&CognitiveModel) -> bool,
}

const BLAME_WORDS: [&str; 4] = ["others", "they", "people", "unfair"];

const RESISTANCE_RULES: [ResistanceRule; 5] = [
    ResistanceRule {
        pattern: "Blame externalization",
        description: "Attributes problems to other people or unfair circumstances",
        success_rate: 0.65,
        strategies: &["Validate frustration before exploring personal agency", "Focus on what is within the patient's control"],
        matches: |m| {
            m.conversational_style.resistance >= 7.0
                && m.core_beliefs.iter().any(|b| {
                    let text = b.belief.to_lowercase();
                    BLAME_WORDS.iter().any(|w| text.contains(w))
                })
        },
    },
    ResistanceRule {
        pattern: "Emotional overwhelm",
        description: "Intense, openly expressed emotion crowds out reflective work",
        success_rate: 0.72,
        strategies: &["Grounding and pacing", "Teach distress tolerance before cognitive work"],
        matches: |m| {
            m.max_emotion_intensity() >= 8.0
                && m.conversational_style.emotional_expressiveness >= 7.0
        },
    },
    ResistanceRule {
        pattern: "Intellectualization",
        description: "Talks at length about problems while keeping feelings at a distance",
        success_rate: 0.58,
        strategies: &["Gently redirect to present-moment feelings", "Use experiential exercises"],
        matches: |m| {
            m.conversational_style.verbosity >= 7.0
                && m.conversational_style.emotional_expressiveness <= 4.0
        },
    },
    ResistanceRule {
        pattern: "Perfectionism",
        description: "Rigid standards make change feel like another test to fail",
        success_rate: 0.61,
        strategies: &["Set deliberately imperfect behavioral experiments", "Examine the cost of rigid rules"],
        matches: |m| {
            m.distortion_patterns.iter().any(|d| {
                let kind = d.distortion_type.to_lowercase();
                kind.contains("should") || kind.contains("all-or-nothing")
            }) || m
                .core_beliefs
                .iter()
                .any(|b| b.belief.to_lowercase().contains("perfect"))
        },
    },
    ResistanceRule {
        pattern: "Trauma-protective resistance",
        description: "Avoidance that protects against re-experiencing painful memories",
        success_rate: 0.54,
        strategies: &["Prioritise safety and trust", "Let the patient control pacing of disclosure"],
        matches: |m| {
            is_trauma(m)
                || (m.conversational_style.resistance >= 6.0
                    && m.formative_experiences
                        .iter()
                        .any(|f| f.emotional_response.starts_with("Fear")))
        },
    },
];

fn resistance_patterns(models: &[CognitiveModel]) -> Vec<ResistancePattern> {
    let n = models.len() as f64;
    RESISTANCE_RULES
        .iter()
        .filter_map(|rule| {
            let affected = count(models, rule.matches);
            (affected > 0).then(|| ResistancePattern {
                pattern: rule.pattern.to_string(),
                description: rule.description.to_string(),
                prevalence: affected as f64 / n,
                affected_models: affected,
                success_rate: rule.success_rate,
                strategies: rule.strategies.iter().map(|s| s.to_string()).collect(),
            })
        })
        .collect()
}

// ============================================================================
// Intervention Effectiveness
// ============================================================================

struct InterventionRule {
    intervention: &'static str,
    average_sessions: u32,
    candidates: &'static str,
    contraindications: &'static str,
    is_candidate: fn(&CognitiveModel) -> bool,
    is_contraindicated: fn(&CognitiveModel) -> bool,
}

fn has_behavior(model: &CognitiveModel, words: &[&str]) -> bool {
    model
        .behavioral_patterns
        .iter()
        .filter(|b| b.kind == BehaviorKind::Reactive)
        .any(|b| {
            let text = b.behavior.to_lowercase();
            words.iter().any(|w| text.contains(w))
        })
}

const WITHDRAWAL_STEMS: [&str; 4] = ["withdraw", "isolat", "in bed", "bedridden"];

const INTERVENTION_RULES: [InterventionRule; 4] = [
    InterventionRule {
        intervention: "Cognitive Restructuring",
        average_sessions: 8,
        candidates: "Identifiable distortions with at least moderate insight",
        contraindications: "Very low insight or acute emotional overwhelm",
        is_candidate: |m| {
            !m.distortion_patterns.is_empty() && m.conversational_style.insight_level >= 4.0
        },
        is_contraindicated: |m| {
            m.conversational_style.insight_level <= 2.0 || m.max_emotion_intensity() >= 9.0
        },
    },
    InterventionRule {
        intervention: "Behavioral Activation",
        average_sessions: 6,
        candidates: "Depressive presentations with withdrawal or inactivity",
        contraindications: "Very high resistance to structured homework",
        is_candidate: |m| is_depression(m) || has_behavior(m, &WITHDRAWAL_STEMS),
        is_contraindicated: |m| m.conversational_style.resistance >= 8.0,
    },
    InterventionRule {
        intervention: "Exposure Therapy",
        average_sessions: 12,
        candidates: "Anxiety or trauma presentations maintained by avoidance",
        contraindications: "Overwhelming emotional intensity or high resistance",
        is_candidate: |m| is_anxiety(m) || is_trauma(m) || has_behavior(m, &["avoid"]),
        is_contraindicated: |m| {
            m.max_emotion_intensity() >= 9.0 || m.conversational_style.resistance >= 8.0
        },
    },
    InterventionRule {
        intervention: "Mindfulness-Based",
        average_sessions: 10,
        candidates: "Strong emotional reactivity",
        contraindications: "Very limited insight into internal states",
        is_candidate: |m| m.max_emotion_intensity() >= 7.0,
        is_contraindicated: |m| m.conversational_style.insight_level <= 3.0,
    },
];

/// `0.6 + 0.3 * (candidates - contraindications) / n`, kept within 0.3-0.9.
fn success_rate(candidates: usize, contraindications: usize, n: usize) -> f64 {
    let net = candidates as f64 - contraindications as f64;
    (0.6 + 0.3 * net / n as f64).clamp(0.3, 0.9)
}

fn intervention_effectiveness(models: &[CognitiveModel]) -> Vec<InterventionEffectiveness> {
    INTERVENTION_RULES
        .iter()
        .map(|rule| {
            let candidate_count = count(models, rule.is_candidate);
            let contraindication_count = count(models, rule.is_contraindicated);
            InterventionEffectiveness {
                intervention: rule.intervention.to_string(),
                success_rate: success_rate(candidate_count, contraindication_count, models.len()),
                average_sessions: rule.average_sessions,
                candidate_count,
                contraindication_count,
                candidates: rule.candidates.to_string(),
                contraindications: rule.contraindications.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::{belief, distortion, emotion, model, with_diagnosis, with_style};
    use crate::model::{BehavioralPattern, DistortionFrequency};

    #[test]
    fn test_behavior_stems_match_whole_phrases() {
        let reactive = |text: &str| {
            let mut m = model("a");
            m.behavioral_patterns = vec![BehavioralPattern {
                behavior: text.to_string(),
                triggers: vec![],
                frequency: "variable".to_string(),
                consequences: vec![],
                kind: BehaviorKind::Reactive,
            }];
            m
        };
        assert!(has_behavior(&reactive("Stays in bed all weekend"), &WITHDRAWAL_STEMS));
        assert!(has_behavior(&reactive("Isolates from friends"), &WITHDRAWAL_STEMS));
        assert!(!has_behavior(&reactive("Checks embedded reminders"), &WITHDRAWAL_STEMS));
    }

    #[test]
    fn test_success_rate_is_bounded() {
        assert_eq!(success_rate(10, 0, 1), 0.9);
        assert_eq!(success_rate(0, 10, 1), 0.3);
        assert!((success_rate(1, 0, 2) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_recommendation_rules() {
        let resistant = with_style(model("a"), 5.0, 8.0, 3.0);
        let depressed = with_diagnosis(model("b"), "Major Depressive Disorder");

        let insights = analyze_therapeutic(&[resistant, depressed]).unwrap();
        let interventions: Vec<_> = insights
            .recommendations
            .iter()
            .map(|r| r.intervention.as_str())
            .collect();
        assert_eq!(
            interventions,
            vec![
                "Motivational interviewing",
                "Cognitive behavioral therapy with behavioral activation"
            ]
        );
        assert_eq!(insights.recommendations[0].difficulty, DifficultyTier::Advanced);
    }

    #[test]
    fn test_restructuring_needs_three_distortions_and_low_insight() {
        let mut a = with_style(model("a"), 5.0, 5.0, 4.0);
        a.distortion_patterns = vec![
            distortion("labeling", &[], DistortionFrequency::Rare),
            distortion("catastrophizing", &[], DistortionFrequency::Rare),
            distortion("mind reading", &[], DistortionFrequency::Rare),
        ];
        let insights = analyze_therapeutic(&[a]).unwrap();
        assert!(insights
            .recommendations
            .iter()
            .any(|r| r.difficulty == DifficultyTier::Intermediate));
    }

    #[test]
    fn test_resistance_patterns_only_when_present() {
        let mut a = with_style(model("a"), 5.0, 8.0, 5.0);
        a.core_beliefs = vec![belief("People are unfair to me", 8.0, "others")];
        let mut b = model("b");
        b.emotional_patterns = vec![emotion("panic", 9.0, &[])];
        b.conversational_style.emotional_expressiveness = 8.0;

        let insights = analyze_therapeutic(&[a, b]).unwrap();
        let names: Vec<_> = insights
            .resistance_patterns
            .iter()
            .map(|p| p.pattern.as_str())
            .collect();
        assert_eq!(names, vec!["Blame externalization", "Emotional overwhelm"]);
        assert_eq!(insights.resistance_patterns[0].prevalence, 0.5);
        assert_eq!(insights.resistance_patterns[0].success_rate, 0.65);
        assert_eq!(insights.intervention_effectiveness.len(), 4);
    }

    #[test]
    fn test_non_finite_intensity_names_phase() {
        let mut a = model("a");
        a.emotional_patterns = vec![emotion("fear", f64::INFINITY, &[])];
        let err = analyze_therapeutic(&[a]).unwrap_err();
        assert!(err.to_string().contains("therapeutic_insights"));
    }
}
