//! Integration tests for the normalizer
//!
//! Raw records are written as JSON the way upstream dataset parsers emit them.

use mcp_cognitive_models::config::NormalizerConfig;
use mcp_cognitive_models::error::NormalizationError;
use mcp_cognitive_models::model::{DistortionFrequency, RawPatientRecord};
use mcp_cognitive_models::normalizer::{Normalizer, ValidationStatus};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn raw(value: Value) -> RawPatientRecord {
    serde_json::from_value(value).expect("raw record should deserialize")
}

/// A record that fills all twelve completeness fields.
fn full_record(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Jordan",
        "demographics": { "age": 29, "gender": "non-binary", "occupation": "nurse" },
        "diagnosis": { "primary": "Major Depressive Disorder", "severity": "severe" },
        "presentingIssues": ["low mood"],
        "coreBeliefs": [
            { "belief": "I am unlovable", "category": "relationships", "strength": 7,
              "formationContext": "Rejection by parents" }
        ],
        "intermediateBeliefs": [{ "belief": "If I ask for help I am weak" }],
        "automaticThoughts": ["I always ruin things"],
        "emotions": [{ "emotion": "sadness", "intensity": 6, "triggers": ["being alone"] }],
        "copingStrategies": ["going for a walk"],
        "relationships": [{ "type": "family", "fears": ["being a burden"] }],
        "history": ["Moved cities at fifteen"],
        "conversationalStyle": { "style": "plain" },
        "goals": ["reconnect with friends"],
        "sessionContext": { "sessionNumber": 4 }
    })
}

fn sparse_record(id: &str) -> Value {
    json!({ "id": id, "name": "Thin" })
}

#[test]
fn test_full_record_is_accepted_as_valid() {
    let mut normalizer = Normalizer::default();
    let result = normalizer.normalize_model(&raw(full_record("full"))).unwrap();

    assert_eq!(result.model.id, "full");
    assert_eq!(result.metadata.source_id, "full");
    assert_eq!(result.metadata.validation_status, ValidationStatus::Valid);
    assert_eq!(result.metadata.data_quality.completeness, 1.0);
    assert_eq!(result.model.therapeutic_progress.sessions_completed, 3);
}

#[test]
fn test_sparse_record_is_rejected_with_score() {
    let mut normalizer = Normalizer::default();
    let err = normalizer
        .normalize_model(&raw(sparse_record("thin")))
        .unwrap_err();

    match err {
        NormalizationError::QualityBelowThreshold {
            source_id,
            completeness,
            threshold,
        } => {
            assert_eq!(source_id, "thin");
            assert!(completeness < threshold);
            assert!((0.0..=1.0).contains(&completeness));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_lenient_batch_collects_every_record() {
    let records = vec![
        raw(full_record("a")),
        raw(sparse_record("b")),
        raw(full_record("c")),
    ];
    let mut normalizer = Normalizer::default();
    let batch = normalizer.normalize_models(&records).unwrap();

    assert_eq!(batch.successful.len() + batch.errors.len(), records.len());
    assert_eq!(batch.errors[0].source_id(), "b");
    let ids: Vec<String> = batch.models().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);

    let stats = normalizer.get_stats();
    assert_eq!(stats.total_processed, 3);
    assert_eq!(stats.successful + stats.failed, stats.total_processed);
    assert_eq!(stats.failed, 1);
}

#[test]
fn test_strict_batch_aborts_on_first_failure() {
    let records = vec![
        raw(full_record("a")),
        raw(sparse_record("b")),
        raw(full_record("c")),
    ];
    let mut normalizer = Normalizer::new(NormalizerConfig {
        strict_mode: true,
        ..NormalizerConfig::default()
    });

    let err = normalizer.normalize_models(&records).unwrap_err();
    assert_eq!(err.source_id(), "b");
    assert_eq!(normalizer.get_stats().total_processed, 2);
}

#[test]
fn test_out_of_range_intensity_is_rejected() {
    let mut record = full_record("hot");
    record["emotions"][0]["intensity"] = json!(11);

    let mut normalizer = Normalizer::default();
    let err = normalizer.normalize_model(&raw(record.clone())).unwrap_err();
    assert!(matches!(err, NormalizationError::Validation { ref source_id, .. } if source_id == "hot"));
    assert!(err.to_string().contains("Emotion intensity out of range"));

    let mut reporting = Normalizer::new(NormalizerConfig {
        reject_out_of_range: false,
        ..NormalizerConfig::default()
    });
    let result = reporting.normalize_model(&raw(record)).unwrap();
    assert_eq!(result.metadata.validation_status, ValidationStatus::Error);
}

#[test]
fn test_normalization_is_deterministic() {
    let record = raw(full_record("same"));
    let mut normalizer = Normalizer::default();

    let first = normalizer.normalize_model(&record).unwrap();
    let second = normalizer.normalize_model(&record).unwrap();
    assert_eq!(first.model, second.model);
    assert_eq!(first.metadata.conversion_notes, second.metadata.conversion_notes);
}

#[test]
fn test_missing_id_is_generated() {
    let mut record = full_record("ignored");
    record.as_object_mut().unwrap().remove("id");

    let mut normalizer = Normalizer::default();
    let result = normalizer.normalize_model(&raw(record)).unwrap();
    assert!(result.model.id.starts_with("patient_"));
    assert_eq!(result.metadata.source_id, result.model.id);
}

#[test]
fn test_beliefs_merge_with_default_strengths() {
    let mut record = full_record("beliefs");
    record["coreBeliefs"][0]
        .as_object_mut()
        .unwrap()
        .remove("strength");

    let mut normalizer = Normalizer::default();
    let model = normalizer.normalize_model(&raw(record)).unwrap().model;

    assert_eq!(model.core_beliefs.len(), 2);
    assert_eq!(model.core_beliefs[0].strength, 8.0);
    assert_eq!(model.core_beliefs[0].related_domains, vec!["relationships"]);
    assert_eq!(model.core_beliefs[1].strength, 6.0);
    assert_eq!(model.core_beliefs[1].related_domains, vec!["intermediate"]);
}

#[test]
fn test_repeated_thoughts_set_frequency_bucket() {
    let mut record = full_record("thoughts");
    record["automaticThoughts"] = json!([
        "I always forget my keys",
        "I always forget to call",
        "I always forget birthdays",
        "I always forget the time",
        "I always forget my lines"
    ]);

    let mut normalizer = Normalizer::default();
    let model = normalizer.normalize_model(&raw(record)).unwrap().model;

    assert_eq!(model.distortion_patterns.len(), 1);
    let pattern = &model.distortion_patterns[0];
    assert_eq!(pattern.distortion_type, "all-or-nothing thinking");
    assert_eq!(pattern.examples.len(), 5);
    assert_eq!(pattern.frequency, DistortionFrequency::Frequent);
}

#[test]
fn test_formative_experiences_from_both_sources() {
    let mut normalizer = Normalizer::default();
    let model = normalizer
        .normalize_model(&raw(full_record("history")))
        .unwrap()
        .model;

    let ages: Vec<&str> = model
        .formative_experiences
        .iter()
        .map(|f| f.age.as_str())
        .collect();
    assert_eq!(ages, vec!["childhood", "unknown age"]);
    assert_eq!(
        model.formative_experiences[0].emotional_response,
        "Fear, sadness, anger"
    );
    assert_eq!(model.formative_experiences[1].emotional_response, "Mixed emotions");
}

#[test]
fn test_missing_demographics_are_defaulted_and_noted() {
    let mut record = full_record("nodemo");
    record.as_object_mut().unwrap().remove("demographics");

    let mut normalizer = Normalizer::default();
    let result = normalizer.normalize_model(&raw(record)).unwrap();

    assert_eq!(result.model.demographic_info.age, 30);
    assert_eq!(result.model.demographic_info.gender, "Not specified");
    assert!(result
        .metadata
        .conversion_notes
        .iter()
        .any(|n| n.contains("Demographics missing")));
}

#[test]
fn test_reset_stats() {
    let mut normalizer = Normalizer::default();
    normalizer.normalize_model(&raw(full_record("a"))).unwrap();
    assert_eq!(normalizer.get_stats().successful, 1);

    normalizer.reset_stats();
    assert_eq!(normalizer.get_stats().total_processed, 0);
}

#[test]
fn test_untyped_batch_rejects_bad_records_individually() {
    let mut loose_scalars = full_record("stringly");
    loose_scalars["demographics"]["age"] = json!("29");
    loose_scalars["coreBeliefs"][0]["strength"] = json!("7");
    loose_scalars["sessionContext"]["sessionNumber"] = json!(4.0);

    let values = vec![
        full_record("good"),
        json!({ "id": "loose", "demographics": { "age": "35" } }),
        json!({ "id": 42 }),
        json!({ "id": "shape", "emotions": "sad" }),
        loose_scalars,
    ];
    let mut normalizer = Normalizer::default();
    let batch = normalizer.normalize_values(&values, false).unwrap();

    let accepted: Vec<&str> = batch
        .successful
        .iter()
        .map(|r| r.model.id.as_str())
        .collect();
    assert_eq!(accepted, vec!["good", "stringly"]);
    assert_eq!(batch.successful[1].model.demographic_info.age, 29);
    assert_eq!(batch.successful[1].model.core_beliefs[0].strength, 7.0);

    let rejected: Vec<&str> = batch.errors.iter().map(|e| e.source_id()).collect();
    assert_eq!(rejected, vec!["loose", "42", "shape"]);
    assert!(matches!(batch.errors[2], NormalizationError::Malformed { .. }));

    let stats = normalizer.get_stats();
    assert_eq!(stats.total_processed, 5);
    assert_eq!(stats.failed, 3);
}

#[test]
fn test_untyped_batch_strict_stops_at_malformed_record() {
    let values = vec![
        json!({ "id": "shape", "coreBeliefs": "none" }),
        full_record("good"),
    ];
    let mut normalizer = Normalizer::default();

    let err = normalizer.normalize_values(&values, true).unwrap_err();
    assert_eq!(err.source_id(), "shape");
    assert_eq!(normalizer.get_stats().total_processed, 1);
}
