//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state management

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::config::Config;
use crate::error::NormalizationError;
use crate::indexer::{IndexStats, PatientIndexer};
use crate::insights::InsightEngine;
use serde_json::Value;

use crate::model::CognitiveModel;
use crate::normalizer::{BatchNormalization, Normalizer};

/// Application state shared across handlers.
///
/// The indexer is single-writer/many-reader: rebuilds happen off-lock and
/// the finished indexer is swapped in under a short write lock.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Normalizer and its conversion statistics.
    pub normalizer: Mutex<Normalizer>,
    /// Current index.
    pub indexer: RwLock<PatientIndexer>,
    /// Insight engine and its cache.
    pub insights: Mutex<InsightEngine>,
    /// Current model collection.
    pub models: RwLock<Vec<CognitiveModel>>,
}

impl AppState {
    /// Create empty application state.
    pub fn new(config: Config) -> Self {
        info!(
            quality_threshold = config.normalizer.quality_threshold,
            strict_mode = config.normalizer.strict_mode,
            cache_ttl_secs = config.insights.cache_ttl_secs,
            "AppState initializing"
        );

        Self {
            normalizer: Mutex::new(Normalizer::new(config.normalizer.clone())),
            indexer: RwLock::new(PatientIndexer::new(config.indexer.clone())),
            insights: Mutex::new(InsightEngine::new(config.insights.clone())),
            models: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Normalize a batch of untyped records and publish the accepted models.
    ///
    /// In strict mode a failure aborts the batch and leaves the current
    /// collection untouched.
    pub async fn ingest(
        &self,
        records: &[Value],
        strict: bool,
    ) -> Result<(BatchNormalization, IndexStats), NormalizationError> {
        let batch = {
            let mut normalizer = self.normalizer.lock().await;
            normalizer.normalize_values(records, strict)?
        };
        let stats = self.publish(batch.models()).await;
        Ok((batch, stats))
    }

    /// Replace the current collection, rebuild the index and drop cached insights.
    pub async fn publish(&self, models: Vec<CognitiveModel>) -> IndexStats {
        let rebuilt = PatientIndexer::build(self.config.indexer.clone(), &models);
        let stats = rebuilt.index_stats();

        *self.indexer.write().await = rebuilt;
        *self.models.write().await = models;
        self.insights.lock().await.invalidate();

        info!(
            model_count = stats.model_count,
            skipped = stats.skipped_count,
            "Published model collection"
        );
        stats
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;
    use serde_json::json;

    fn record(id: &str) -> Value {
        json!({
            "id": id,
            "name": format!("Patient {}", id),
            "presentingIssues": ["low mood"],
            "coreBeliefs": [{ "belief": "I am worthless", "category": "self" }],
            "diagnosis": { "primary": "Major Depressive Disorder" }
        })
    }

    fn lenient_state() -> AppState {
        AppState::new(Config {
            normalizer: NormalizerConfig {
                quality_threshold: 0.0,
                ..NormalizerConfig::default()
            },
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn test_ingest_publishes_and_indexes() {
        let state = lenient_state();
        let (batch, stats) = state.ingest(&[record("a"), record("b")], false).await.unwrap();

        assert_eq!(batch.successful.len(), 2);
        assert_eq!(stats.model_count, 2);
        assert_eq!(state.models.read().await.len(), 2);
        assert_eq!(state.indexer.read().await.find_by_belief_domain("self").len(), 2);
    }

    #[tokio::test]
    async fn test_publish_invalidates_insight_cache() {
        let state = lenient_state();
        state.ingest(&[record("a")], false).await.unwrap();
        {
            let models = state.models.read().await.clone();
            let mut engine = state.insights.lock().await;
            engine
                .generate_insights(&models, &Default::default())
                .unwrap();
            assert_eq!(engine.cache_len(), 1);
        }

        state.publish(Vec::new()).await;
        assert_eq!(state.insights.lock().await.cache_len(), 0);
        assert!(state.indexer.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_rejects_malformed_record_only() {
        let state = lenient_state();
        let records = vec![
            record("a"),
            json!({ "id": "b", "coreBeliefs": { "belief": "not a list" } }),
        ];
        let (batch, stats) = state.ingest(&records, false).await.unwrap();

        assert_eq!(stats.model_count, 1);
        assert_eq!(batch.errors[0].source_id(), "b");
        assert_eq!(state.normalizer.lock().await.get_stats().failed, 1);
    }

    #[tokio::test]
    async fn test_shared_state_type() {
        let shared: SharedState = Arc::new(lenient_state());
        let shared2 = Arc::clone(&shared);
        assert_eq!(Arc::strong_count(&shared), 2);
        drop(shared2);
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
