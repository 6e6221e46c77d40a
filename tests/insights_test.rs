//! Integration tests for the insight engine

use chrono::{Duration, Utc};
use mcp_cognitive_models::config::{CacheStaleness, InsightsConfig, NormalizerConfig};
use mcp_cognitive_models::error::InsightError;
use mcp_cognitive_models::insights::{
    analyze_beliefs, analyze_communication, analyze_distortions, analyze_emotions,
    analyze_metrics, analyze_therapeutic, BeliefDistribution, CommunicationStyleDistribution,
    DatasetMetrics, DistortionPatternAnalysis, EmotionalPatternInsight, FocusArea,
    InsightEngine, InsightOptions, TherapeuticInsights,
};
use mcp_cognitive_models::model::{CognitiveModel, RawPatientRecord};
use mcp_cognitive_models::normalizer::Normalizer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn normalize(records: Vec<Value>) -> Vec<CognitiveModel> {
    let records: Vec<RawPatientRecord> = records
        .into_iter()
        .map(|r| serde_json::from_value(r).unwrap())
        .collect();
    let mut normalizer = Normalizer::new(NormalizerConfig {
        quality_threshold: 0.0,
        ..NormalizerConfig::default()
    });
    normalizer.normalize_models(&records).unwrap().models()
}

fn record(id: &str, belief: &str, strength: u32, thought: &str, style: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Patient {}", id),
        "diagnosis": { "primary": "Major Depressive Disorder" },
        "coreBeliefs": [{ "belief": belief, "strength": strength }],
        "automaticThoughts": [thought],
        "emotions": [
            { "emotion": "sadness", "intensity": 7, "triggers": ["criticism"] },
            { "emotion": "shame", "intensity": 5, "triggers": ["criticism"] }
        ],
        "conversationalStyle": { "style": style }
    })
}

fn collection() -> Vec<CognitiveModel> {
    normalize(vec![
        record("a", "I am incompetent", 9, "Everyone thinks I'm a failure", "upset"),
        record("b", "I am incompetent", 5, "Everyone thinks I'm a failure", "plain"),
        record("c", "I am unlovable", 3, "I should call more", "reserved"),
    ])
}

#[test]
fn test_empty_collection_yields_zero_values() {
    assert_eq!(analyze_beliefs(&[]).unwrap(), BeliefDistribution::default());
    assert_eq!(analyze_emotions(&[]).unwrap(), EmotionalPatternInsight::default());
    assert_eq!(
        analyze_communication(&[]).unwrap(),
        CommunicationStyleDistribution::default()
    );
    assert_eq!(analyze_distortions(&[]).unwrap(), DistortionPatternAnalysis::default());
    assert_eq!(analyze_therapeutic(&[]).unwrap(), TherapeuticInsights::default());
    assert_eq!(analyze_metrics(&[]).unwrap(), DatasetMetrics::default());
}

#[test]
fn test_histogram_counts_every_belief() {
    let models = collection();
    let beliefs: usize = models.iter().map(|m| m.core_beliefs.len()).sum();
    let distribution = analyze_beliefs(&models).unwrap();

    assert_eq!(distribution.by_strength.total(), beliefs);
    assert_eq!(distribution.by_strength.extreme, 1);
    assert_eq!(distribution.most_common[0].belief, "I am incompetent");
    assert_eq!(distribution.most_common[0].frequency, 2);
    assert!((distribution.most_common[0].average_strength - 7.0).abs() < 1e-9);
}

#[test]
fn test_combinations_need_more_than_one_model() {
    let analysis = analyze_distortions(&collection()).unwrap();

    assert!(analysis.common_combinations.iter().all(|c| c.frequency > 1));
    let combo = &analysis.common_combinations[0];
    assert_eq!(combo.types, vec!["labeling", "mind reading"]);
    assert_eq!(combo.frequency, 2);
    assert_eq!(combo.combination, "labeling+mind reading");
}

#[test]
fn test_shared_triggers_are_counted() {
    let insight = analyze_emotions(&collection()).unwrap();

    assert_eq!(insight.by_emotion["sadness"].frequency, 3);
    assert_eq!(insight.common_triggers[0].trigger, "criticism");
    assert!(insight
        .emotional_chains
        .iter()
        .all(|c| (0.0..=1.0).contains(&c.strength)));
}

#[test]
fn test_cached_snapshot_within_ttl() {
    let mut engine = InsightEngine::new(InsightsConfig {
        cache_ttl_secs: 3600,
        staleness: CacheStaleness::PerEntry,
    });
    let models = collection();
    let options = InsightOptions::default();
    let t0 = Utc::now();

    let first = engine.generate_insights_at(&models, &options, t0).unwrap();
    let second = engine
        .generate_insights_at(&models, &options, t0 + Duration::minutes(5))
        .unwrap();
    assert_eq!(second, first);

    engine.invalidate();
    let third = engine
        .generate_insights_at(&models, &options, t0 + Duration::minutes(6))
        .unwrap();
    assert_ne!(third.generated_at, first.generated_at);
    assert_eq!(third.belief_distribution, first.belief_distribution);
}

#[test]
fn test_non_finite_strength_fails_the_phase() {
    let mut models = collection();
    models[0].core_beliefs[0].strength = f64::NAN;

    let mut engine = InsightEngine::default();
    let err = engine
        .generate_insights(&models, &InsightOptions::default())
        .unwrap_err();

    match err {
        InsightError::Analysis { phase, .. } => assert_eq!(phase, "belief_distribution"),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(engine.cache_len(), 0);
}

#[test]
fn test_focus_areas_skip_disabled_sections() {
    let mut engine = InsightEngine::default();
    let insights = engine
        .generate_insights(
            &collection(),
            &InsightOptions::focused([FocusArea::Communication]),
        )
        .unwrap();

    assert_eq!(insights.model_count, 3);
    assert_eq!(insights.belief_distribution, BeliefDistribution::default());
    assert_eq!(insights.emotional_patterns, EmotionalPatternInsight::default());
    assert_eq!(insights.distortion_patterns, DistortionPatternAnalysis::default());
    assert_eq!(insights.therapeutic_insights, TherapeuticInsights::default());
    assert_eq!(insights.communication_styles.by_style.values().sum::<usize>(), 3);
}

#[test]
fn test_export_json_round_trips() {
    let mut engine = InsightEngine::default();
    let insights = engine
        .generate_insights(&collection(), &InsightOptions::default())
        .unwrap();

    let json = InsightEngine::export_json(&insights).unwrap();
    let parsed: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["model_count"], 3);
    assert!(parsed["dataset_metrics"]["quality_score"].is_number());
}
