//! Insight Engine - aggregate statistics and recommendations over a collection.
//!
//! Six independent sub-analyses feed one [`DatasetInsights`] snapshot:
//! - Belief distribution
//! - Emotional patterns
//! - Communication styles
//! - Distortion patterns
//! - Therapeutic insights
//! - Dataset metrics
//!
//! [`InsightEngine`] caches snapshots keyed by the sorted model ids and the
//! requested focus areas.

mod beliefs;
mod communication;
mod distortions;
mod emotions;
mod metrics;
mod therapeutic;
mod types;

pub use beliefs::analyze_beliefs;
pub use communication::analyze_communication;
pub use distortions::analyze_distortions;
pub use emotions::analyze_emotions;
pub use metrics::analyze_metrics;
pub use therapeutic::analyze_therapeutic;
pub use types::*;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{CacheStaleness, InsightsConfig};
use crate::error::{InsightError, InsightResult};
use crate::model::CognitiveModel;

// ============================================================================
// Options
// ============================================================================

/// Sub-analyses that can be switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    /// Belief distribution.
    Beliefs,
    /// Emotional patterns.
    Emotions,
    /// Communication styles.
    Communication,
    /// Distortion patterns.
    Distortions,
    /// Therapeutic insights.
    Therapeutic,
}

impl FocusArea {
    /// Every focus area.
    pub const ALL: [FocusArea; 5] = [
        FocusArea::Beliefs,
        FocusArea::Emotions,
        FocusArea::Communication,
        FocusArea::Distortions,
        FocusArea::Therapeutic,
    ];

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusArea::Beliefs => "beliefs",
            FocusArea::Emotions => "emotions",
            FocusArea::Communication => "communication",
            FocusArea::Distortions => "distortions",
            FocusArea::Therapeutic => "therapeutic",
        }
    }
}

impl std::fmt::Display for FocusArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FocusArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beliefs" => Ok(FocusArea::Beliefs),
            "emotions" => Ok(FocusArea::Emotions),
            "communication" => Ok(FocusArea::Communication),
            "distortions" => Ok(FocusArea::Distortions),
            "therapeutic" => Ok(FocusArea::Therapeutic),
            _ => Err(format!("Unknown focus area: {}", s)),
        }
    }
}

/// Options for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightOptions {
    /// Areas to compute. `None` computes all of them.
    pub focus_areas: Option<Vec<FocusArea>>,
}

impl InsightOptions {
    /// Options restricted to the given areas.
    pub fn focused(areas: impl IntoIterator<Item = FocusArea>) -> Self {
        Self {
            focus_areas: Some(areas.into_iter().collect()),
        }
    }

    /// Whether `area` is enabled.
    pub fn includes(&self, area: FocusArea) -> bool {
        self.focus_areas
            .as_ref()
            .map_or(true, |areas| areas.contains(&area))
    }

    /// Sorted, duplicate-free form used for cache keys.
    fn canonical(&self) -> Self {
        Self {
            focus_areas: self.focus_areas.as_ref().map(|areas| {
                let mut areas = areas.clone();
                areas.sort();
                areas.dedup();
                areas
            }),
        }
    }
}

// ============================================================================
// Phases
// ============================================================================

/// Analysis phase names reported in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Belief distribution.
    BeliefDistribution,
    /// Emotional patterns.
    EmotionalPatterns,
    /// Communication styles.
    CommunicationStyles,
    /// Distortion patterns.
    DistortionPatterns,
    /// Therapeutic insights.
    TherapeuticInsights,
    /// Dataset metrics.
    DatasetMetrics,
}

impl Phase {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BeliefDistribution => "belief_distribution",
            Phase::EmotionalPatterns => "emotional_patterns",
            Phase::CommunicationStyles => "communication_styles",
            Phase::DistortionPatterns => "distortion_patterns",
            Phase::TherapeuticInsights => "therapeutic_insights",
            Phase::DatasetMetrics => "dataset_metrics",
        }
    }
}

/// Fail the phase when a scalar cannot be aggregated.
pub(crate) fn ensure_finite(phase: Phase, field: &str, value: f64) -> InsightResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InsightError::Analysis {
            phase: phase.as_str().to_string(),
            message: format!("non-finite {}: {}", field, value),
        })
    }
}

/// Sort with `compare` and keep the first `limit` items.
pub(crate) fn top_n<T, F>(mut items: Vec<T>, limit: usize, compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    items.sort_by(compare);
    items.truncate(limit);
    items
}

/// Run every sub-analysis, substituting zero values for disabled areas.
pub fn analyze(
    models: &[CognitiveModel],
    options: &InsightOptions,
    generated_at: DateTime<Utc>,
) -> InsightResult<DatasetInsights> {
    Ok(DatasetInsights {
        generated_at,
        model_count: models.len(),
        belief_distribution: when(options, FocusArea::Beliefs, || analyze_beliefs(models))?,
        emotional_patterns: when(options, FocusArea::Emotions, || analyze_emotions(models))?,
        communication_styles: when(options, FocusArea::Communication, || {
            analyze_communication(models)
        })?,
        distortion_patterns: when(options, FocusArea::Distortions, || {
            analyze_distortions(models)
        })?,
        therapeutic_insights: when(options, FocusArea::Therapeutic, || {
            analyze_therapeutic(models)
        })?,
        dataset_metrics: analyze_metrics(models)?,
    })
}

fn when<T: Default>(
    options: &InsightOptions,
    area: FocusArea,
    run: impl FnOnce() -> InsightResult<T>,
) -> InsightResult<T> {
    if options.includes(area) {
        run()
    } else {
        Ok(T::default())
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    insights: DatasetInsights,
    created_at: DateTime<Utc>,
}

/// Insight engine with a time-bounded snapshot cache.
#[derive(Debug, Clone, Default)]
pub struct InsightEngine {
    config: InsightsConfig,
    cache: HashMap<String, CacheEntry>,
    last_analysis: Option<DateTime<Utc>>,
}

impl InsightEngine {
    /// Create an engine with an empty cache.
    pub fn new(config: InsightsConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
            last_analysis: None,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    /// Analyse `models`, serving a cached snapshot when one is still fresh.
    pub fn generate_insights(
        &mut self,
        models: &[CognitiveModel],
        options: &InsightOptions,
    ) -> InsightResult<DatasetInsights> {
        self.generate_insights_at(models, options, Utc::now())
    }

    /// [`generate_insights`](Self::generate_insights) with an explicit clock.
    pub fn generate_insights_at(
        &mut self,
        models: &[CognitiveModel],
        options: &InsightOptions,
        now: DateTime<Utc>,
    ) -> InsightResult<DatasetInsights> {
        let key = cache_key(models, options)?;

        if let Some(entry) = self.cache.get(&key) {
            if self.is_fresh(entry, now) {
                debug!(models = models.len(), "Insight cache hit");
                return Ok(entry.insights.clone());
            }
        }
        debug!(models = models.len(), "Insight cache miss");

        let start = Instant::now();
        let insights = analyze(models, options, now)?;

        info!(
            models = models.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generated dataset insights"
        );

        let ttl = self.ttl();
        match self.config.staleness {
            CacheStaleness::PerEntry => self
                .cache
                .retain(|_, entry| now.signed_duration_since(entry.created_at) < ttl),
            // every entry shares the previous anchor, so a stale anchor means
            // all of them are stale
            CacheStaleness::Global => {
                if self
                    .last_analysis
                    .is_some_and(|anchor| now.signed_duration_since(anchor) >= ttl)
                {
                    self.cache.clear();
                }
            }
        }
        self.last_analysis = Some(now);
        self.cache.insert(
            key,
            CacheEntry {
                insights: insights.clone(),
                created_at: now,
            },
        );

        Ok(insights)
    }

    /// Drop every cached snapshot.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.last_analysis = None;
    }

    /// Number of cached snapshots.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Pretty-printed JSON of a snapshot.
    pub fn export_json(insights: &DatasetInsights) -> InsightResult<String> {
        serde_json::to_string_pretty(insights).map_err(|e| InsightError::Serialization {
            message: e.to_string(),
        })
    }

    fn ttl(&self) -> Duration {
        let secs = i64::try_from(self.config.cache_ttl_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs.min(i64::MAX / 1000))
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let anchor = match self.config.staleness {
            CacheStaleness::PerEntry => entry.created_at,
            CacheStaleness::Global => self.last_analysis.unwrap_or(entry.created_at),
        };
        now.signed_duration_since(anchor) < self.ttl()
    }
}

/// Sorted model ids plus canonical options.
fn cache_key(models: &[CognitiveModel], options: &InsightOptions) -> InsightResult<String> {
    let mut ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
    ids.sort_unstable();

    let options = serde_json::to_string(&options.canonical()).map_err(|e| {
        InsightError::Serialization {
            message: e.to_string(),
        }
    })?;

    Ok(format!("{}|{}", ids.join(","), options))
}
