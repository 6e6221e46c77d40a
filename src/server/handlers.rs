use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use super::SharedState;
use crate::error::{McpError, McpResult, NormalizationError, ToolError};
use crate::indexer::{IndexStats, SearchCriteria, SearchResult};
use crate::insights::{DatasetInsights, FocusArea, InsightOptions};
use crate::model::CognitiveModel;
use crate::normalizer::{ConversionStats, DataQuality, NormalizationResult, ValidationStatus};

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        // Normalization
        "patient_normalize" => handle_normalize(state, arguments).await,
        "patient_conversion_stats" => handle_conversion_stats(state, arguments).await,
        // Index queries
        "patient_search" => handle_search(state, arguments).await,
        "patient_find_by_belief_domain" => handle_find_by_belief_domain(state, arguments).await,
        "patient_find_by_emotion" => handle_find_by_emotion(state, arguments).await,
        "patient_find_by_style" => handle_find_by_style(state, arguments).await,
        "patient_training_scenario" => handle_training_scenario(state, arguments).await,
        "patient_get_model" => handle_get_model(state, arguments).await,
        "patient_index_stats" => handle_index_stats(state, arguments).await,
        // Insights
        "patient_insights" => handle_insights(state, arguments).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

// ============================================================================
// Parameter and response types
// ============================================================================

/// Parameters for `patient_normalize`.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeParams {
    /// Raw records to convert. Each is parsed on its own so one malformed
    /// record is rejected without failing the call.
    pub records: Vec<Value>,
    /// Abort on the first failure. Defaults to the configured strict mode.
    #[serde(default)]
    pub strict: Option<bool>,
}

/// Summary of one accepted record.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedRecord {
    /// Id of the produced model.
    pub model_id: String,
    /// Validation outcome.
    pub validation_status: ValidationStatus,
    /// Quality scores.
    pub data_quality: DataQuality,
    /// Conversion notes.
    pub conversion_notes: Vec<String>,
}

impl From<&NormalizationResult> for AcceptedRecord {
    fn from(result: &NormalizationResult) -> Self {
        Self {
            model_id: result.model.id.clone(),
            validation_status: result.metadata.validation_status,
            data_quality: result.metadata.data_quality,
            conversion_notes: result.metadata.conversion_notes.clone(),
        }
    }
}

/// Summary of one rejected record.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    /// Id of the raw record.
    pub source_id: String,
    /// Rejection reason.
    pub reason: String,
}

impl From<&NormalizationError> for RejectedRecord {
    fn from(err: &NormalizationError) -> Self {
        Self {
            source_id: err.source_id().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Response for `patient_normalize`.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizeResponse {
    /// Accepted records.
    pub accepted: Vec<AcceptedRecord>,
    /// Rejected records.
    pub rejected: Vec<RejectedRecord>,
    /// Statistics of the rebuilt index.
    pub index: IndexStats,
    /// Wall-clock time of the whole call.
    pub processing_time_ms: u64,
}

/// Response for `patient_search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Number of results returned.
    pub total: usize,
    /// Ranked results.
    pub results: Vec<SearchResult>,
}

/// Response for the `patient_find_*` lookups.
#[derive(Debug, Clone, Serialize)]
pub struct IdListResponse {
    /// Number of matching models.
    pub count: usize,
    /// Matching model ids.
    pub model_ids: Vec<String>,
}

impl From<Vec<String>> for IdListResponse {
    fn from(model_ids: Vec<String>) -> Self {
        Self {
            count: model_ids.len(),
            model_ids,
        }
    }
}

/// Parameters for `patient_find_by_belief_domain`.
#[derive(Debug, Clone, Deserialize)]
pub struct BeliefDomainParams {
    /// Belief domain, e.g. "self".
    pub domain: String,
}

/// Parameters for `patient_find_by_emotion`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionParams {
    /// Emotion label.
    pub emotion: String,
    /// Minimum intensity on the 0-10 scale.
    #[serde(default)]
    pub min_intensity: Option<f64>,
}

/// Parameters for `patient_find_by_style`.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleParams {
    /// Style label.
    pub style: String,
}

/// Parameters for `patient_training_scenario`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingScenarioParams {
    /// beginner, intermediate or advanced.
    pub difficulty: String,
    /// depression, anxiety, trauma or general.
    pub focus: String,
    /// Overrides the styles implied by the difficulty.
    #[serde(default)]
    pub style_preference: Option<Vec<String>>,
}

/// Parameters for `patient_get_model`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetModelParams {
    /// Model id.
    pub id: String,
}

/// Parameters for `patient_insights`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InsightsParams {
    /// Areas to compute. Empty or absent computes all.
    pub focus_areas: Option<Vec<FocusArea>>,
}

/// Parameters for `patient_conversion_stats`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConversionStatsParams {
    /// Reset counters after reading them.
    pub reset: bool,
}

// ============================================================================
// Normalization handlers
// ============================================================================

/// Handle patient_normalize tool call
async fn handle_normalize(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: NormalizeParams = parse_arguments("patient_normalize", arguments)?;
    let strict = params
        .strict
        .unwrap_or(state.config.normalizer.strict_mode);
    let start = Instant::now();

    let (batch, index) = state
        .ingest(&params.records, strict)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: format!("Normalization aborted: {}", e),
        })?;

    let response = NormalizeResponse {
        accepted: batch.successful.iter().map(AcceptedRecord::from).collect(),
        rejected: batch.errors.iter().map(RejectedRecord::from).collect(),
        index,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        accepted = response.accepted.len(),
        rejected = response.rejected.len(),
        strict,
        "Normalization batch complete"
    );

    serde_json::to_value(response).map_err(McpError::Json)
}

/// Handle patient_conversion_stats tool call
async fn handle_conversion_stats(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: ConversionStatsParams =
        parse_optional_arguments("patient_conversion_stats", arguments)?;

    let mut normalizer = state.normalizer.lock().await;
    let stats: ConversionStats = normalizer.get_stats();
    if params.reset {
        normalizer.reset_stats();
        debug!("Conversion statistics reset");
    }

    serde_json::to_value(stats).map_err(McpError::Json)
}

// ============================================================================
// Index handlers
// ============================================================================

/// Handle patient_search tool call
async fn handle_search(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "patient_search",
        arguments,
        |criteria: SearchCriteria| async move {
            let indexer = state.indexer.read().await;
            let results = indexer.search_models(&criteria);
            Ok::<_, McpError>(SearchResponse {
                total: results.len(),
                results,
            })
        },
    )
    .await
}

/// Handle patient_find_by_belief_domain tool call
async fn handle_find_by_belief_domain(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "patient_find_by_belief_domain",
        arguments,
        |params: BeliefDomainParams| async move {
            require_text("domain", &params.domain)?;
            let indexer = state.indexer.read().await;
            Ok::<_, ToolError>(IdListResponse::from(
                indexer.find_by_belief_domain(&params.domain),
            ))
        },
    )
    .await
}

/// Handle patient_find_by_emotion tool call
async fn handle_find_by_emotion(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "patient_find_by_emotion",
        arguments,
        |params: EmotionParams| async move {
            require_text("emotion", &params.emotion)?;
            if let Some(min) = params.min_intensity {
                if !crate::model::in_scale(min) {
                    return Err(ToolError::Validation {
                        field: "min_intensity".to_string(),
                        reason: format!("must be within 0-10, got {}", min),
                    });
                }
            }
            let indexer = state.indexer.read().await;
            Ok(IdListResponse::from(
                indexer.find_by_emotion(&params.emotion, params.min_intensity),
            ))
        },
    )
    .await
}

/// Handle patient_find_by_style tool call
async fn handle_find_by_style(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "patient_find_by_style",
        arguments,
        |params: StyleParams| async move {
            require_text("style", &params.style)?;
            let indexer = state.indexer.read().await;
            Ok::<_, ToolError>(IdListResponse::from(indexer.find_by_style(&params.style)))
        },
    )
    .await
}

/// Handle patient_training_scenario tool call
async fn handle_training_scenario(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "patient_training_scenario",
        arguments,
        |params: TrainingScenarioParams| async move {
            let indexer = state.indexer.read().await;
            let results = indexer.get_models_for_training_scenario(
                &params.difficulty,
                &params.focus,
                params.style_preference.as_deref(),
            );
            Ok::<_, McpError>(SearchResponse {
                total: results.len(),
                results,
            })
        },
    )
    .await
}

/// Handle patient_get_model tool call
async fn handle_get_model(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "patient_get_model",
        arguments,
        |params: GetModelParams| async move {
            let indexer = state.indexer.read().await;
            indexer
                .get_model(&params.id)
                .cloned()
                .ok_or(ToolError::ModelNotFound {
                    model_id: params.id,
                })
        },
    )
    .await
}

/// Handle patient_index_stats tool call
async fn handle_index_stats(state: &SharedState, _arguments: Option<Value>) -> McpResult<Value> {
    let stats = state.indexer.read().await.index_stats();
    serde_json::to_value(stats).map_err(McpError::Json)
}

// ============================================================================
// Insight handlers
// ============================================================================

/// Handle patient_insights tool call
async fn handle_insights(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: InsightsParams = parse_optional_arguments("patient_insights", arguments)?;
    let options = InsightOptions {
        focus_areas: params.focus_areas.filter(|areas| !areas.is_empty()),
    };

    let models: Vec<CognitiveModel> = state.models.read().await.clone();
    let insights: DatasetInsights = {
        let mut engine = state.insights.lock().await;
        engine
            .generate_insights(&models, &options)
            .map_err(|e| McpError::ExecutionFailed {
                message: e.to_string(),
            })?
    };

    serde_json::to_value(insights).map_err(McpError::Json)
}

// ============================================================================
// Helper functions
// ============================================================================

/// Helper to parse arguments with consistent error handling
fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Like [`parse_arguments`], but absent arguments mean defaults.
fn parse_optional_arguments<T: serde::de::DeserializeOwned + Default>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        None | Some(Value::Null) => Ok(T::default()),
        some => parse_arguments(tool_name, some),
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::Validation {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Generic handler that runs an operation with consistent error handling.
///
/// Parses typed parameters, converts the operation's error into an
/// [`McpError`] and serializes the result.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    E: Into<McpError>,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;
    let result = operation(params).await.map_err(Into::into)?;
    serde_json::to_value(result).map_err(McpError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments_missing() {
        let result: McpResult<GetModelParams> = parse_arguments("patient_get_model", None);
        match result {
            Err(McpError::InvalidParameters { tool_name, message }) => {
                assert_eq!(tool_name, "patient_get_model");
                assert_eq!(message, "Missing arguments");
            }
            other => panic!("unexpected: {:?}", other.map(|p| p.id)),
        }
    }

    #[test]
    fn test_parse_optional_arguments_defaults() {
        let params: ConversionStatsParams =
            parse_optional_arguments("patient_conversion_stats", None).unwrap();
        assert!(!params.reset);

        let params: InsightsParams =
            parse_optional_arguments("patient_insights", Some(Value::Null)).unwrap();
        assert!(params.focus_areas.is_none());
    }

    #[test]
    fn test_insights_params_reject_unknown_area() {
        let result: McpResult<InsightsParams> = parse_optional_arguments(
            "patient_insights",
            Some(json!({"focus_areas": ["beliefs", "astrology"]})),
        );
        assert!(matches!(result, Err(McpError::InvalidParameters { .. })));
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("style", "upset").is_ok());
        let err = require_text("style", "  ").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: style - must not be empty");
    }

    #[test]
    fn test_id_list_response_counts() {
        let response = IdListResponse::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(response.count, 2);
    }
}
