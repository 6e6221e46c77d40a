//! Indexer - inverted indices and weighted retrieval over cognitive models.
//!
//! [`PatientIndexer::build_indices`] replaces all state in one step. There is
//! no incremental add or remove; callers that share an indexer across tasks
//! build a fresh one off-lock and swap it in.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_cognitive_models::indexer::{PatientIndexer, SearchCriteria};
//!
//! let mut indexer = PatientIndexer::default();
//! indexer.build_indices(&models);
//! let results = indexer.search_models(&SearchCriteria {
//!     diagnoses: vec!["depression".to_string()],
//!     ..Default::default()
//! });
//! ```

mod search;

pub use search::{
    age_bracket, diagnosis_matches, evaluated_weights, SearchCriteria, SearchResult, ValueRange,
};

use std::borrow::Borrow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::IndexerConfig;
use crate::model::{infer_primary_style, CognitiveModel};
use crate::normalizer::classify::classify_belief_category;

// ============================================================================
// Key Index
// ============================================================================

/// Mapping from a key to the ordered, duplicate-free ids carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIndex<K: Ord> {
    entries: BTreeMap<K, Vec<String>>,
}

impl<K: Ord> Default for KeyIndex<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord> KeyIndex<K> {
    /// Add `id` under `key` unless it is already there.
    pub fn insert(&mut self, key: K, id: &str) {
        let ids = self.entries.entry(key).or_default();
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }

    /// Ids stored under `key`, in insertion order.
    pub fn get<Q>(&self, key: &Q) -> &[String]
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `id` is stored under `key`.
    pub fn contains<Q>(&self, key: &Q, id: &str) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).iter().any(|existing| existing == id)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}

impl KeyIndex<String> {
    /// Insert under the trimmed, lower-cased key. Blank keys are ignored.
    pub fn insert_text(&mut self, key: &str, id: &str) {
        let key = key.trim().to_lowercase();
        if !key.is_empty() {
            self.insert(key, id);
        }
    }
}

/// Round a 0-10 scalar to its index bucket.
pub fn scale_key(value: f64) -> u8 {
    value.round().clamp(0.0, 10.0) as u8
}

/// The thirteen named indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelIndex {
    /// Belief related-domain tag.
    pub beliefs_by_domain: KeyIndex<String>,
    /// Belief category (helpless, unlovable, worthless, other).
    pub beliefs_by_category: KeyIndex<String>,
    /// Rounded belief strength.
    pub beliefs_by_strength: KeyIndex<u8>,
    /// Emotion label.
    pub emotions_by_type: KeyIndex<String>,
    /// Rounded emotion intensity.
    pub emotions_by_intensity: KeyIndex<u8>,
    /// Emotion trigger.
    pub emotions_by_trigger: KeyIndex<String>,
    /// Behaviour and emotion triggers.
    pub situations_by_context: KeyIndex<String>,
    /// Distortion trigger themes.
    pub situations_by_theme: KeyIndex<String>,
    /// Inferred primary style.
    pub styles_by_type: KeyIndex<String>,
    /// Difficulty of the inferred style.
    pub styles_by_difficulty: KeyIndex<String>,
    /// Primary and secondary diagnoses.
    pub diagnosis_by_type: KeyIndex<String>,
    /// Age bracket.
    pub demographics_by_age: KeyIndex<String>,
    /// Gender.
    pub demographics_by_gender: KeyIndex<String>,
}

impl ModelIndex {
    /// Add every key of one model.
    fn add_model(&mut self, model: &CognitiveModel) {
        let id = model.id.as_str();

        for belief in &model.core_beliefs {
            for domain in &belief.related_domains {
                self.beliefs_by_domain.insert_text(domain, id);
            }
            self.beliefs_by_category
                .insert_text(classify_belief_category(&belief.belief), id);
            self.beliefs_by_strength.insert(scale_key(belief.strength), id);
        }

        for emotion in &model.emotional_patterns {
            self.emotions_by_type.insert_text(&emotion.emotion, id);
            self.emotions_by_intensity
                .insert(scale_key(emotion.intensity), id);
            for trigger in &emotion.triggers {
                self.emotions_by_trigger.insert_text(trigger, id);
                self.situations_by_context.insert_text(trigger, id);
            }
        }

        for behavior in &model.behavioral_patterns {
            for trigger in &behavior.triggers {
                self.situations_by_context.insert_text(trigger, id);
            }
        }

        for distortion in &model.distortion_patterns {
            for theme in &distortion.trigger_themes {
                self.situations_by_theme.insert_text(theme, id);
            }
        }

        let style = infer_primary_style(&model.conversational_style);
        self.styles_by_type.insert_text(style.as_str(), id);
        self.styles_by_difficulty
            .insert_text(style.difficulty().as_str(), id);

        self.diagnosis_by_type
            .insert_text(&model.diagnosis_info.primary_diagnosis, id);
        if let Some(secondary) = &model.diagnosis_info.secondary_diagnoses {
            for diagnosis in secondary {
                self.diagnosis_by_type.insert_text(diagnosis, id);
            }
        }

        self.demographics_by_age
            .insert_text(age_bracket(model.demographic_info.age), id);
        self.demographics_by_gender
            .insert_text(&model.demographic_info.gender, id);
    }

    /// Distinct key count per named index.
    pub fn key_counts(&self) -> BTreeMap<String, usize> {
        [
            ("belief_domain", self.beliefs_by_domain.len()),
            ("belief_category", self.beliefs_by_category.len()),
            ("belief_strength", self.beliefs_by_strength.len()),
            ("emotion_type", self.emotions_by_type.len()),
            ("emotion_intensity", self.emotions_by_intensity.len()),
            ("emotion_trigger", self.emotions_by_trigger.len()),
            ("situation_context", self.situations_by_context.len()),
            ("situation_theme", self.situations_by_theme.len()),
            ("style_type", self.styles_by_type.len()),
            ("style_difficulty", self.styles_by_difficulty.len()),
            ("diagnosis", self.diagnosis_by_type.len()),
            ("age_bracket", self.demographics_by_age.len()),
            ("gender", self.demographics_by_gender.len()),
        ]
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect()
    }
}

/// Summary of the current index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Indexed models.
    pub model_count: usize,
    /// Models skipped by the last build.
    pub skipped_count: usize,
    /// When the last build ran.
    pub built_at: Option<DateTime<Utc>>,
    /// Distinct keys per named index.
    pub indices: BTreeMap<String, usize>,
}

// ============================================================================
// Indexer
// ============================================================================

/// Owns the indexed collection and its indices.
#[derive(Debug, Clone, Default)]
pub struct PatientIndexer {
    config: IndexerConfig,
    index: ModelIndex,
    models: BTreeMap<String, CognitiveModel>,
    skipped: usize,
    built_at: Option<DateTime<Utc>>,
}

impl PatientIndexer {
    /// Create an empty indexer.
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Create an indexer and build it over `models`.
    pub fn build(config: IndexerConfig, models: &[CognitiveModel]) -> Self {
        let mut indexer = Self::new(config);
        indexer.build_indices(models);
        indexer
    }

    /// Replace the collection and every index.
    ///
    /// Models with an empty id or name, no core beliefs, or an id already
    /// seen in this call are skipped with a warning.
    pub fn build_indices(&mut self, models: &[CognitiveModel]) {
        let mut index = ModelIndex::default();
        let mut collection = BTreeMap::new();
        let mut skipped = 0;

        for model in models {
            if let Some(reason) = invalid_reason(model, &collection) {
                warn!(model_id = %model.id, reason, "Skipping model during indexing");
                skipped += 1;
                continue;
            }
            index.add_model(model);
            collection.insert(model.id.clone(), model.clone());
        }

        self.index = index;
        self.models = collection;
        self.skipped = skipped;
        self.built_at = Some(Utc::now());

        info!(
            indexed = self.models.len(),
            skipped,
            "Index rebuilt"
        );
    }

    /// Weighted multi-criteria search.
    ///
    /// Empty criteria or an empty index yield no results.
    pub fn search_models(&self, criteria: &SearchCriteria) -> Vec<SearchResult> {
        if criteria.is_empty() || self.models.is_empty() {
            return Vec::new();
        }

        debug!(weights = ?evaluated_weights(criteria), match_all = criteria.match_all, "Searching models");

        let results = self
            .models
            .values()
            .filter_map(|model| search::score_model(model, &self.index, criteria))
            .collect();

        search::rank(
            results,
            criteria
                .max_results
                .unwrap_or(self.config.default_max_results),
        )
    }

    /// Ids of models with a belief in `domain`.
    pub fn find_by_belief_domain(&self, domain: &str) -> Vec<String> {
        self.index
            .beliefs_by_domain
            .get(domain.trim().to_lowercase().as_str())
            .to_vec()
    }

    /// Ids of models with `emotion`, optionally at or above `min_intensity`.
    pub fn find_by_emotion(&self, emotion: &str, min_intensity: Option<f64>) -> Vec<String> {
        let key = emotion.trim().to_lowercase();
        let ids = self.index.emotions_by_type.get(key.as_str());

        let Some(min) = min_intensity else {
            return ids.to_vec();
        };

        ids.iter()
            .filter(|id| {
                self.models.get(id.as_str()).map_or(false, |model| {
                    model
                        .emotional_patterns
                        .iter()
                        .any(|e| e.emotion.trim().to_lowercase() == key && e.intensity >= min)
                })
            })
            .cloned()
            .collect()
    }

    /// Ids of models whose inferred primary style is `style`.
    pub fn find_by_style(&self, style: &str) -> Vec<String> {
        self.index
            .styles_by_type
            .get(style.trim().to_lowercase().as_str())
            .to_vec()
    }

    /// Models suited to a training scenario.
    ///
    /// `difficulty` selects accepted styles unless `style_preference` is
    /// given; `focus` selects diagnosis keywords. Every criterion must match.
    pub fn get_models_for_training_scenario(
        &self,
        difficulty: &str,
        focus: &str,
        style_preference: Option<&[String]>,
    ) -> Vec<SearchResult> {
        let conversational_styles = match style_preference {
            Some(styles) if !styles.is_empty() => styles.to_vec(),
            _ => to_strings(scenario_styles(difficulty)),
        };

        let criteria = SearchCriteria {
            conversational_styles,
            diagnoses: to_strings(focus_keywords(focus)),
            max_results: Some(self.config.scenario_max_results),
            match_all: true,
            ..Default::default()
        };

        self.search_models(&criteria)
    }

    /// Look up an indexed model.
    pub fn get_model(&self, id: &str) -> Option<&CognitiveModel> {
        self.models.get(id)
    }

    /// Indexed models in id order.
    pub fn models(&self) -> impl Iterator<Item = &CognitiveModel> {
        self.models.values()
    }

    /// Number of indexed models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The indices.
    pub fn index(&self) -> &ModelIndex {
        &self.index
    }

    /// Index summary.
    pub fn index_stats(&self) -> IndexStats {
        IndexStats {
            model_count: self.models.len(),
            skipped_count: self.skipped,
            built_at: self.built_at,
            indices: self.index.key_counts(),
        }
    }
}

fn invalid_reason(
    model: &CognitiveModel,
    seen: &BTreeMap<String, CognitiveModel>,
) -> Option<&'static str> {
    if model.id.trim().is_empty() {
        Some("empty id")
    } else if model.name.trim().is_empty() {
        Some("empty name")
    } else if model.core_beliefs.is_empty() {
        Some("no core beliefs")
    } else if seen.contains_key(&model.id) {
        Some("duplicate id")
    } else {
        None
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Training Scenarios
// ============================================================================

const BEGINNER_STYLES: &[&str] = &["plain", "pleasing"];
const INTERMEDIATE_STYLES: &[&str] = &["verbose", "tangent"];
const ADVANCED_STYLES: &[&str] = &["upset", "reserved"];
const FALLBACK_STYLES: &[&str] = &["plain", "pleasing", "verbose", "tangent"];

const DEPRESSION_KEYWORDS: &[&str] = &["depression", "depressive", "dysthymia", "mood"];
const ANXIETY_KEYWORDS: &[&str] = &["anxiety", "panic", "phobia", "obsessive", "compulsive"];
const TRAUMA_KEYWORDS: &[&str] = &["trauma", "ptsd", "stress disorder"];
const GENERAL_KEYWORDS: &[&str] = &["depression", "anxiety", "adjustment", "stress"];

/// Accepted styles for a difficulty tier.
pub fn scenario_styles(difficulty: &str) -> &'static [&'static str] {
    match difficulty.trim().to_lowercase().as_str() {
        "beginner" => BEGINNER_STYLES,
        "intermediate" => INTERMEDIATE_STYLES,
        "advanced" => ADVANCED_STYLES,
        _ => FALLBACK_STYLES,
    }
}

/// Diagnosis keywords for a scenario focus. Unknown focuses use `general`.
pub fn focus_keywords(focus: &str) -> &'static [&'static str] {
    match focus.trim().to_lowercase().as_str() {
        "depression" => DEPRESSION_KEYWORDS,
        "anxiety" => ANXIETY_KEYWORDS,
        "trauma" => TRAUMA_KEYWORDS,
        _ => GENERAL_KEYWORDS,
    }
}
