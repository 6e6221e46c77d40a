//! Normalizer - raw patient records to canonical cognitive models.
//!
//! This module converts loosely-typed [`RawPatientRecord`]s into
//! [`CognitiveModel`]s:
//! - Beliefs: explicit and intermediate beliefs merged with default strengths
//! - Distortions: keyword rules over automatic thoughts, grouped per rule
//! - Conversational style: label/difficulty lookup tables
//! - Formative experiences: belief formation contexts and history items
//!
//! Each converted model is validated and scored for data quality. A record
//! is accepted when its completeness reaches the configured threshold.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_cognitive_models::normalizer::Normalizer;
//! use mcp_cognitive_models::config::NormalizerConfig;
//!
//! let mut normalizer = Normalizer::new(NormalizerConfig::default());
//! let batch = normalizer.normalize_models(&records)?;
//! println!("{} accepted, {} rejected", batch.successful.len(), batch.errors.len());
//! ```

pub mod classify;
mod quality;
mod stats;

pub use quality::{assess_quality, validate_model, DataQuality, ValidationReport, ValidationStatus};
pub use stats::ConversionStats;

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use self::classify::{
    detect_distortions, extract_themes, infer_emotional_response, map_conversational_style,
    DistortionType,
};
use self::stats::{Outcome, StatsAccumulator};
use crate::config::NormalizerConfig;
use crate::error::NormalizationError;
use crate::model::{
    BehaviorKind, BehavioralPattern, ChangeReadiness, CognitiveModel, ConversationalStyle,
    CoreBelief, DemographicInfo, DiagnosisInfo, DistortionFrequency, DistortionPattern,
    EmotionalPattern, FormativeExperience, RawPatientRecord, RelationshipPattern,
    TherapeuticProgress, TherapyHistory, NOT_SPECIFIED, UNKNOWN_DIAGNOSIS,
};

/// Default strength for explicit core beliefs without one.
pub const DEFAULT_CORE_BELIEF_STRENGTH: f64 = 8.0;
/// Default strength for intermediate beliefs without one.
pub const DEFAULT_INTERMEDIATE_BELIEF_STRENGTH: f64 = 6.0;
/// Default emotion intensity.
pub const DEFAULT_EMOTION_INTENSITY: f64 = 5.0;

// ============================================================================
// Results
// ============================================================================

/// Metadata attached to a normalized model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationMetadata {
    /// Id of the raw record (generated when absent).
    pub source_id: String,
    /// When normalization ran.
    pub normalized_at: DateTime<Utc>,
    /// Validation outcome.
    pub validation_status: ValidationStatus,
    /// Warnings, errors and applied defaults.
    pub conversion_notes: Vec<String>,
    /// Quality scores.
    pub data_quality: DataQuality,
    /// Time taken in milliseconds.
    pub processing_time_ms: f64,
}

/// A normalized model with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationResult {
    /// The canonical model.
    pub model: CognitiveModel,
    /// Conversion metadata.
    pub metadata: NormalizationMetadata,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchNormalization {
    /// Accepted records, in input order.
    pub successful: Vec<NormalizationResult>,
    /// Rejected records, in input order.
    pub errors: Vec<NormalizationError>,
}

impl BatchNormalization {
    /// Accepted models, cloned out of their results.
    pub fn models(&self) -> Vec<CognitiveModel> {
        self.successful.iter().map(|r| r.model.clone()).collect()
    }

    /// Add one outcome; in strict mode a failure is returned instead.
    fn push(
        &mut self,
        outcome: Result<NormalizationResult, NormalizationError>,
        strict: bool,
    ) -> Result<(), NormalizationError> {
        match outcome {
            Ok(result) => self.successful.push(result),
            Err(e) if strict => return Err(e),
            Err(e) => self.errors.push(e),
        }
        Ok(())
    }
}

// ============================================================================
// Normalizer
// ============================================================================

/// Converts raw records and keeps running conversion statistics.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    stats: StatsAccumulator,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl Normalizer {
    /// Create a normalizer with the given configuration.
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            stats: StatsAccumulator::default(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a single record.
    ///
    /// Fails when completeness is below the quality threshold, or when a
    /// scalar is out of range and `reject_out_of_range` is set.
    pub fn normalize_model(
        &mut self,
        raw: &RawPatientRecord,
    ) -> Result<NormalizationResult, NormalizationError> {
        let start = Instant::now();

        let source_id = raw
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("patient_{}", uuid::Uuid::new_v4()));

        let (model, mut notes) = transform(raw, &source_id);
        let report = validate_model(&model);
        let data_quality = assess_quality(&model);
        notes.extend(report.notes.iter().cloned());

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            source_id = %source_id,
            status = %report.status,
            completeness = data_quality.completeness,
            "Normalized record"
        );

        if report.status == ValidationStatus::Error && self.config.reject_out_of_range {
            self.stats
                .record(Outcome::Rejected, data_quality.completeness, elapsed_ms);
            warn!(source_id = %source_id, "Record rejected: out-of-range values");
            return Err(NormalizationError::Validation {
                source_id,
                notes: report.notes,
            });
        }

        if data_quality.completeness < self.config.quality_threshold {
            self.stats
                .record(Outcome::Rejected, data_quality.completeness, elapsed_ms);
            warn!(
                source_id = %source_id,
                completeness = data_quality.completeness,
                threshold = self.config.quality_threshold,
                "Record rejected: data quality below threshold"
            );
            return Err(NormalizationError::QualityBelowThreshold {
                source_id,
                completeness: data_quality.completeness,
                threshold: self.config.quality_threshold,
            });
        }

        self.stats.record(
            Outcome::Accepted {
                warning: report.status == ValidationStatus::Warning,
            },
            data_quality.completeness,
            elapsed_ms,
        );

        Ok(NormalizationResult {
            model,
            metadata: NormalizationMetadata {
                source_id,
                normalized_at: Utc::now(),
                validation_status: report.status,
                conversion_notes: notes,
                data_quality,
                processing_time_ms: elapsed_ms,
            },
        })
    }

    /// Normalize a batch using the configured strictness.
    pub fn normalize_models(
        &mut self,
        records: &[RawPatientRecord],
    ) -> Result<BatchNormalization, NormalizationError> {
        let strict = self.config.strict_mode;
        self.normalize_batch(records, strict)
    }

    /// Normalize a batch sequentially.
    ///
    /// In lenient mode every failure is collected and the batch continues;
    /// in strict mode the first failure is returned.
    pub fn normalize_batch(
        &mut self,
        records: &[RawPatientRecord],
        strict: bool,
    ) -> Result<BatchNormalization, NormalizationError> {
        let mut batch = BatchNormalization::default();

        for raw in records {
            let outcome = self.normalize_model(raw);
            batch.push(outcome, strict)?;
        }

        log_batch(records.len(), &batch);
        Ok(batch)
    }

    /// Normalize a batch of untyped JSON records.
    ///
    /// Each value is parsed on its own, so a record whose shape cannot be
    /// read is counted as failed and rejected with
    /// [`NormalizationError::Malformed`] while the rest of the batch
    /// continues (unless `strict`).
    pub fn normalize_values(
        &mut self,
        values: &[Value],
        strict: bool,
    ) -> Result<BatchNormalization, NormalizationError> {
        let mut batch = BatchNormalization::default();

        for (position, value) in values.iter().enumerate() {
            let outcome = match RawPatientRecord::from_value(value, position) {
                Ok(raw) => self.normalize_model(&raw),
                Err(e) => {
                    self.stats.record(Outcome::Rejected, 0.0, 0.0);
                    warn!(source_id = %e.source_id(), error = %e, "Record rejected: malformed input");
                    Err(e)
                }
            };
            batch.push(outcome, strict)?;
        }

        log_batch(values.len(), &batch);
        Ok(batch)
    }

    /// Current conversion statistics.
    pub fn get_stats(&self) -> ConversionStats {
        self.stats.snapshot()
    }

    /// Reset conversion statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

fn log_batch(total: usize, batch: &BatchNormalization) {
    info!(
        total,
        successful = batch.successful.len(),
        failed = batch.errors.len(),
        "Batch normalization complete"
    );
}

// ============================================================================
// Transform
// ============================================================================

/// Build the canonical model for a raw record. Pure apart from its inputs.
///
/// Returns the model together with notes about applied defaults.
pub fn transform(raw: &RawPatientRecord, id: &str) -> (CognitiveModel, Vec<String>) {
    let mut notes = Vec::new();

    let demographic_info = match &raw.demographics {
        Some(d) => DemographicInfo {
            age: d.age.unwrap_or(30),
            gender: text_or(&d.gender, NOT_SPECIFIED),
            occupation: text_or(&d.occupation, NOT_SPECIFIED),
            family_status: text_or(&d.family_status, NOT_SPECIFIED),
            cultural_factors: d.cultural_factors.clone().filter(|f| !f.is_empty()),
            socioeconomic_status: d.socioeconomic_status.clone(),
        },
        None => {
            notes.push("Demographics missing; defaults applied".to_string());
            DemographicInfo::default()
        }
    };

    let diagnosis_info = match &raw.diagnosis {
        Some(d) => DiagnosisInfo {
            primary_diagnosis: text_or(&d.primary, UNKNOWN_DIAGNOSIS),
            secondary_diagnoses: d.secondary.clone().filter(|s| !s.is_empty()),
            severity: text_or(&d.severity, "moderate"),
            duration_of_symptoms: d.duration.clone(),
            previous_treatments: d.previous_treatments.clone(),
        },
        None => {
            notes.push(format!("Diagnosis missing; defaulted to '{}'", UNKNOWN_DIAGNOSIS));
            DiagnosisInfo::default()
        }
    };

    let conversational_style = match &raw.conversational_style {
        Some(s) => map_conversational_style(s.style.as_deref(), s.difficulty.as_deref()),
        None => {
            notes.push("No conversational style data; neutral style applied".to_string());
            ConversationalStyle::neutral()
        }
    };

    let core_beliefs = build_beliefs(raw);
    let distortion_patterns = build_distortions(&raw.automatic_thoughts);
    if !raw.automatic_thoughts.is_empty() {
        notes.push(format!(
            "Detected {} distortion pattern(s) in {} automatic thought(s)",
            distortion_patterns.len(),
            raw.automatic_thoughts.len()
        ));
    }

    let therapy_history = raw
        .therapy_history
        .as_ref()
        .map(|h| TherapyHistory {
            previous_approaches: h.previous_approaches.clone(),
            helpful_interventions: h.helpful_interventions.clone(),
            unhelpful_interventions: h.unhelpful_interventions.clone(),
            insights_gained: h.insights_gained.clone(),
            progress_made: h.progress_made.clone().unwrap_or_default(),
        })
        .unwrap_or_default();

    let resistance = conversational_style.resistance;
    let therapeutic_progress = TherapeuticProgress {
        insights: therapy_history.insights_gained.clone(),
        resistance_level: resistance,
        change_readiness: ChangeReadiness::from_resistance(resistance),
        sessions_completed: raw
            .session_context
            .as_ref()
            .and_then(|c| c.session_number)
            .map(|n| n.saturating_sub(1))
            .unwrap_or(0),
        trust_level: (10.0 - resistance).max(1.0),
    };

    let model = CognitiveModel {
        id: id.to_string(),
        name: raw.name.as_deref().map(str::trim).unwrap_or_default().to_string(),
        demographic_info,
        presenting_issues: non_empty(&raw.presenting_issues),
        diagnosis_info,
        core_beliefs,
        distortion_patterns,
        behavioral_patterns: build_behaviors(raw),
        emotional_patterns: build_emotions(raw),
        relationship_patterns: raw
            .relationships
            .iter()
            .map(|r| RelationshipPattern {
                relationship_type: r.relationship_type.clone(),
                expectations: r.expectations.clone(),
                fears: r.fears.clone(),
                patterns: r.patterns.clone(),
            })
            .collect(),
        formative_experiences: build_formative_experiences(raw),
        therapy_history,
        conversational_style,
        goals_for_therapy: non_empty(&raw.goals),
        therapeutic_progress,
    };

    (model, notes)
}

fn text_or(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn non_empty(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn build_beliefs(raw: &RawPatientRecord) -> Vec<CoreBelief> {
    let explicit = raw
        .core_beliefs
        .iter()
        .filter(|b| !b.belief.trim().is_empty())
        .map(|b| CoreBelief {
            belief: b.belief.trim().to_string(),
            strength: b.strength.unwrap_or(DEFAULT_CORE_BELIEF_STRENGTH),
            evidence: b.evidence.clone(),
            formation_context: b.formation_context.clone(),
            related_domains: vec![b
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or("general")
                .to_string()],
        });

    let intermediate = raw
        .intermediate_beliefs
        .iter()
        .filter(|b| !b.belief.trim().is_empty())
        .map(|b| CoreBelief {
            belief: b.belief.trim().to_string(),
            strength: b.strength.unwrap_or(DEFAULT_INTERMEDIATE_BELIEF_STRENGTH),
            evidence: b.evidence.clone(),
            formation_context: None,
            related_domains: vec!["intermediate".to_string()],
        });

    explicit.chain(intermediate).collect()
}

fn build_distortions(thoughts: &[String]) -> Vec<DistortionPattern> {
    let mut grouped: BTreeMap<DistortionType, Vec<String>> = BTreeMap::new();
    for thought in thoughts {
        for kind in detect_distortions(thought) {
            grouped.entry(kind).or_default().push(thought.clone());
        }
    }

    grouped
        .into_iter()
        .map(|(kind, examples)| DistortionPattern {
            distortion_type: kind.as_str().to_string(),
            trigger_themes: extract_themes(&examples),
            frequency: DistortionFrequency::from_example_count(examples.len()),
            examples,
        })
        .collect()
}

fn build_behaviors(raw: &RawPatientRecord) -> Vec<BehavioralPattern> {
    let reactive = raw
        .behaviors
        .iter()
        .filter(|b| !b.behavior.trim().is_empty())
        .map(|b| BehavioralPattern {
            behavior: b.behavior.trim().to_string(),
            triggers: b.triggers.clone(),
            frequency: text_or(&b.frequency, "variable"),
            consequences: b.consequences.clone(),
            kind: BehaviorKind::Reactive,
        });

    let coping = non_empty(&raw.coping_strategies)
        .into_iter()
        .map(|strategy| BehavioralPattern {
            behavior: strategy,
            triggers: Vec::new(),
            frequency: "as needed".to_string(),
            consequences: Vec::new(),
            kind: BehaviorKind::Coping,
        });

    reactive.chain(coping).collect()
}

fn build_emotions(raw: &RawPatientRecord) -> Vec<EmotionalPattern> {
    raw.emotions
        .iter()
        .filter(|e| !e.emotion.trim().is_empty())
        .map(|e| EmotionalPattern {
            emotion: e.emotion.trim().to_string(),
            intensity: e.intensity.unwrap_or(DEFAULT_EMOTION_INTENSITY),
            triggers: e.triggers.clone(),
            physical_manifestations: e.physical_manifestations.clone(),
            coping_mechanisms: e.coping_mechanisms.clone(),
        })
        .collect()
}

fn build_formative_experiences(raw: &RawPatientRecord) -> Vec<FormativeExperience> {
    let from_beliefs = raw.core_beliefs.iter().filter_map(|b| {
        let context = b.formation_context.as_deref()?.trim();
        if context.is_empty() {
            return None;
        }
        Some(FormativeExperience {
            age: "childhood".to_string(),
            event: context.to_string(),
            impact: format!("Contributed to the belief \"{}\"", b.belief.trim()),
            beliefs_formed: vec![b.belief.trim().to_string()],
            emotional_response: infer_emotional_response(context).to_string(),
        })
    });

    let from_history = non_empty(&raw.history)
        .into_iter()
        .map(|item| FormativeExperience {
            age: "unknown age".to_string(),
            emotional_response: infer_emotional_response(&item).to_string(),
            impact: "Shaped current difficulties".to_string(),
            beliefs_formed: Vec::new(),
            event: item,
        });

    from_beliefs.chain(from_history).collect()
}
