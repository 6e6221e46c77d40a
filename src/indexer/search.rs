//! Weighted multi-criteria search over an indexed collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ModelIndex;
use crate::model::{infer_primary_style, CognitiveModel};

// Maximum contribution of each criterion to the relevance score.
const WEIGHT_BELIEF_DOMAINS: f64 = 10.0;
const WEIGHT_BELIEF_CATEGORIES: f64 = 10.0;
const WEIGHT_BELIEF_STRENGTH: f64 = 5.0;
const WEIGHT_EMOTION_TYPES: f64 = 10.0;
const WEIGHT_EMOTION_INTENSITY: f64 = 5.0;
const WEIGHT_SITUATION_THEMES: f64 = 10.0;
const WEIGHT_STYLES: f64 = 10.0;
const WEIGHT_DIAGNOSES: f64 = 15.0;
const WEIGHT_AGE: f64 = 5.0;
const WEIGHT_GENDER: f64 = 5.0;

/// Shortest shared prefix that counts as a diagnosis stem match.
const DIAGNOSIS_STEM_LEN: usize = 5;

/// Inclusive numeric range filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange<T> {
    /// Lower bound.
    pub min: T,
    /// Upper bound.
    pub max: T,
}

impl<T: PartialOrd> ValueRange<T> {
    /// Create a range.
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside the range, bounds included.
    pub fn contains(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }
}

/// Optional search filters. Unset and empty filters are not evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    /// Belief domains, scored by fraction matched.
    pub belief_domains: Vec<String>,
    /// Belief categories (helpless, unlovable, worthless, other).
    pub belief_categories: Vec<String>,
    /// Any belief strength in range.
    pub belief_strength_range: Option<ValueRange<f64>>,
    /// Emotion labels, scored by fraction matched.
    pub emotion_types: Vec<String>,
    /// Any emotion intensity in range.
    pub emotion_intensity_range: Option<ValueRange<f64>>,
    /// Distortion trigger themes, scored by fraction matched.
    pub situation_themes: Vec<String>,
    /// Accepted primary styles.
    pub conversational_styles: Vec<String>,
    /// Diagnosis keywords.
    pub diagnoses: Vec<String>,
    /// Age range in years.
    pub age_range: Option<ValueRange<u32>>,
    /// Exact gender.
    pub gender: Option<String>,
    /// Result cap; the indexer default applies when unset.
    pub max_results: Option<usize>,
    /// Drop models that miss any supplied criterion.
    pub match_all: bool,
}

impl SearchCriteria {
    /// Whether no criterion would be evaluated.
    pub fn is_empty(&self) -> bool {
        self.belief_domains.is_empty()
            && self.belief_categories.is_empty()
            && self.belief_strength_range.is_none()
            && self.emotion_types.is_empty()
            && self.emotion_intensity_range.is_none()
            && self.situation_themes.is_empty()
            && self.conversational_styles.is_empty()
            && self.diagnoses.is_empty()
            && self.age_range.is_none()
            && self.gender.as_deref().map_or(true, |g| g.trim().is_empty())
    }
}

/// A scored match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching model id.
    pub model_id: String,
    /// Relevance, 0-100.
    pub score: f64,
    /// Human-readable description of each criterion that matched.
    pub matched_criteria: Vec<String>,
}

/// Accumulates weighted criterion scores for one model.
#[derive(Default)]
struct Scorecard {
    score: f64,
    evaluated: f64,
    missed: bool,
    matched: Vec<String>,
}

impl Scorecard {
    fn add(&mut self, weight: f64, fraction: f64, description: impl FnOnce() -> String) {
        self.evaluated += weight;
        if fraction > 0.0 {
            self.score += weight * fraction;
            self.matched.push(description());
        } else {
            self.missed = true;
        }
    }

    fn finish(self, model_id: &str, match_all: bool) -> Option<SearchResult> {
        if self.evaluated <= 0.0 || self.score <= 0.0 || (match_all && self.missed) {
            return None;
        }
        Some(SearchResult {
            model_id: model_id.to_string(),
            score: self.score / self.evaluated * 100.0,
            matched_criteria: self.matched,
        })
    }
}

/// Score one model against the criteria. `None` when it scores zero.
pub(crate) fn score_model(
    model: &CognitiveModel,
    index: &ModelIndex,
    criteria: &SearchCriteria,
) -> Option<SearchResult> {
    let id = model.id.as_str();
    let mut card = Scorecard::default();

    if !criteria.belief_domains.is_empty() {
        let hits = matched_keys(&criteria.belief_domains, |k| {
            index.beliefs_by_domain.contains(k, id)
        });
        card.add(
            WEIGHT_BELIEF_DOMAINS,
            fraction(hits.len(), criteria.belief_domains.len()),
            || format!("Belief domains: {}", hits.join(", ")),
        );
    }

    if !criteria.belief_categories.is_empty() {
        let hits = matched_keys(&criteria.belief_categories, |k| {
            index.beliefs_by_category.contains(k, id)
        });
        card.add(
            WEIGHT_BELIEF_CATEGORIES,
            fraction(hits.len(), criteria.belief_categories.len()),
            || format!("Belief categories: {}", hits.join(", ")),
        );
    }

    if let Some(range) = &criteria.belief_strength_range {
        let hit = model
            .core_beliefs
            .iter()
            .find(|b| range.contains(&b.strength));
        card.add(WEIGHT_BELIEF_STRENGTH, binary(hit.is_some()), || {
            format!(
                "Belief strength in {}-{}: \"{}\"",
                range.min,
                range.max,
                hit.map(|b| b.belief.as_str()).unwrap_or_default()
            )
        });
    }

    if !criteria.emotion_types.is_empty() {
        let hits = matched_keys(&criteria.emotion_types, |k| {
            index.emotions_by_type.contains(k, id)
        });
        card.add(
            WEIGHT_EMOTION_TYPES,
            fraction(hits.len(), criteria.emotion_types.len()),
            || format!("Emotions: {}", hits.join(", ")),
        );
    }

    if let Some(range) = &criteria.emotion_intensity_range {
        let hit = model
            .emotional_patterns
            .iter()
            .find(|e| range.contains(&e.intensity));
        card.add(WEIGHT_EMOTION_INTENSITY, binary(hit.is_some()), || {
            format!(
                "Emotion intensity in {}-{}: {}",
                range.min,
                range.max,
                hit.map(|e| e.emotion.as_str()).unwrap_or_default()
            )
        });
    }

    if !criteria.situation_themes.is_empty() {
        let hits = matched_keys(&criteria.situation_themes, |k| {
            index.situations_by_theme.contains(k, id)
        });
        card.add(
            WEIGHT_SITUATION_THEMES,
            fraction(hits.len(), criteria.situation_themes.len()),
            || format!("Situation themes: {}", hits.join(", ")),
        );
    }

    if !criteria.conversational_styles.is_empty() {
        let style = infer_primary_style(&model.conversational_style);
        let hit = criteria
            .conversational_styles
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(style.as_str()));
        card.add(WEIGHT_STYLES, binary(hit), || {
            format!("Conversational style: {}", style)
        });
    }

    if !criteria.diagnoses.is_empty() {
        let diagnoses = model_diagnoses(model);
        let hit = criteria.diagnoses.iter().find(|keyword| {
            diagnoses.iter().any(|d| diagnosis_matches(d, keyword))
        });
        card.add(WEIGHT_DIAGNOSES, binary(hit.is_some()), || {
            format!(
                "Diagnosis: {} (matched \"{}\")",
                model.diagnosis_info.primary_diagnosis,
                hit.map(String::as_str).unwrap_or_default()
            )
        });
    }

    if let Some(range) = &criteria.age_range {
        let age = model.demographic_info.age;
        card.add(WEIGHT_AGE, binary(range.contains(&age)), || {
            format!("Age {} in {}-{}", age, range.min, range.max)
        });
    }

    if let Some(gender) = criteria.gender.as_deref().filter(|g| !g.trim().is_empty()) {
        let hit = model
            .demographic_info
            .gender
            .trim()
            .eq_ignore_ascii_case(gender.trim());
        card.add(WEIGHT_GENDER, binary(hit), || format!("Gender: {}", gender.trim()));
    }

    card.finish(id, criteria.match_all)
}

/// Sort by score descending, then model id ascending, and cap the length.
pub(crate) fn rank(mut results: Vec<SearchResult>, max_results: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.model_id.cmp(&b.model_id))
    });
    results.truncate(max_results);
    results
}

fn matched_keys<F>(keys: &[String], mut is_match: F) -> Vec<String>
where
    F: FnMut(&str) -> bool,
{
    keys.iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| is_match(k))
        .collect()
}

fn fraction(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

fn binary(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

fn model_diagnoses(model: &CognitiveModel) -> Vec<&str> {
    let mut diagnoses = vec![model.diagnosis_info.primary_diagnosis.as_str()];
    if let Some(secondary) = &model.diagnosis_info.secondary_diagnoses {
        diagnoses.extend(secondary.iter().map(String::as_str));
    }
    diagnoses
}

/// Case-insensitive diagnosis keyword match.
///
/// Matches when the diagnosis contains the keyword, when a diagnosis of at
/// least five characters is contained in the keyword, or when every keyword
/// word shares a prefix of at least five characters with some diagnosis word
/// ("depression" and "Major Depressive Disorder").
pub fn diagnosis_matches(diagnosis: &str, keyword: &str) -> bool {
    let diagnosis = diagnosis.trim().to_lowercase();
    let keyword = keyword.trim().to_lowercase();
    if diagnosis.is_empty() || keyword.is_empty() {
        return false;
    }
    if diagnosis.contains(&keyword) {
        return true;
    }
    // short abbreviations would otherwise match inside many keywords
    if diagnosis.chars().count() >= DIAGNOSIS_STEM_LEN && keyword.contains(&diagnosis) {
        return true;
    }

    let words = |s: &str| -> Vec<String> {
        s.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    };
    let diagnosis_words = words(&diagnosis);
    words(&keyword).iter().all(|kw| {
        diagnosis_words
            .iter()
            .any(|dw| common_prefix_len(dw, kw) >= DIAGNOSIS_STEM_LEN)
    })
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Bucket label for an age.
pub fn age_bracket(age: u32) -> &'static str {
    match age {
        0..=17 => "under-18",
        18..=25 => "18-25",
        26..=35 => "26-35",
        36..=50 => "36-50",
        51..=65 => "51-65",
        _ => "65+",
    }
}

/// Weights of every supplied criterion, keyed by criterion name.
pub fn evaluated_weights(criteria: &SearchCriteria) -> BTreeMap<&'static str, f64> {
    let mut weights = BTreeMap::new();
    let mut put = |name, supplied: bool, weight| {
        if supplied {
            weights.insert(name, weight);
        }
    };
    put("belief_domains", !criteria.belief_domains.is_empty(), WEIGHT_BELIEF_DOMAINS);
    put("belief_categories", !criteria.belief_categories.is_empty(), WEIGHT_BELIEF_CATEGORIES);
    put("belief_strength_range", criteria.belief_strength_range.is_some(), WEIGHT_BELIEF_STRENGTH);
    put("emotion_types", !criteria.emotion_types.is_empty(), WEIGHT_EMOTION_TYPES);
    put(
        "emotion_intensity_range",
        criteria.emotion_intensity_range.is_some(),
        WEIGHT_EMOTION_INTENSITY,
    );
    put("situation_themes", !criteria.situation_themes.is_empty(), WEIGHT_SITUATION_THEMES);
    put("conversational_styles", !criteria.conversational_styles.is_empty(), WEIGHT_STYLES);
    put("diagnoses", !criteria.diagnoses.is_empty(), WEIGHT_DIAGNOSES);
    put("age_range", criteria.age_range.is_some(), WEIGHT_AGE);
    put(
        "gender",
        criteria.gender.as_deref().map_or(false, |g| !g.trim().is_empty()),
        WEIGHT_GENDER,
    );
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnosis_stem_match() {
        assert!(diagnosis_matches("Major Depressive Disorder", "depression"));
        assert!(diagnosis_matches("Generalized Anxiety Disorder", "anxiety"));
        assert!(diagnosis_matches("Post-Traumatic Stress Disorder", "trauma"));
        assert!(!diagnosis_matches("Generalized Anxiety Disorder", "depression"));
        assert!(!diagnosis_matches("", "depression"));
        assert!(!diagnosis_matches("Major Depressive Disorder", "stress disorder"));
        assert!(diagnosis_matches("Acute Stress Disorder", "stress disorders"));
    }

    #[test]
    fn test_short_diagnosis_is_not_contained_in_keywords() {
        assert!(!diagnosis_matches("MD", "mood"));
        assert!(!diagnosis_matches("ad", "adjustment"));
        assert!(!diagnosis_matches("PTS", "ptsd"));
        assert!(diagnosis_matches("panic", "panic disorder"));
        assert!(diagnosis_matches("PTSD", "ptsd"));
    }

    #[test]
    fn test_age_brackets() {
        assert_eq!(age_bracket(16), "under-18");
        assert_eq!(age_bracket(18), "18-25");
        assert_eq!(age_bracket(30), "26-35");
        assert_eq!(age_bracket(50), "36-50");
        assert_eq!(age_bracket(65), "51-65");
        assert_eq!(age_bracket(66), "65+");
    }

    #[test]
    fn test_rank_breaks_ties_by_id() {
        let result = |id: &str, score| SearchResult {
            model_id: id.to_string(),
            score,
            matched_criteria: vec![],
        };
        let ranked = rank(
            vec![result("b", 50.0), result("c", 80.0), result("a", 50.0)],
            2,
        );
        let ids: Vec<_> = ranked.iter().map(|r| r.model_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_empty_criteria() {
        let criteria = SearchCriteria::default();
        assert!(criteria.is_empty());
        assert!(evaluated_weights(&criteria).is_empty());

        let criteria = SearchCriteria {
            gender: Some("  ".to_string()),
            max_results: Some(3),
            ..Default::default()
        };
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_criteria_deserialize_from_partial_json() {
        let criteria: SearchCriteria = serde_json::from_value(serde_json::json!({
            "diagnoses": ["depression"],
            "age_range": {"min": 20, "max": 40}
        }))
        .unwrap();
        assert_eq!(criteria.diagnoses, vec!["depression"]);
        assert_eq!(criteria.age_range, Some(ValueRange::new(20, 40)));
        assert!(!criteria.match_all);
    }
}
