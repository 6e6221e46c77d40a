//! Offline CLI commands run against a JSON dataset file.
//!
//! Each command normalizes the file's raw records with the configured
//! normalizer settings and prints its result as pretty JSON.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::indexer::{PatientIndexer, SearchCriteria};
use crate::insights::{FocusArea, InsightEngine, InsightOptions};
use crate::model::CognitiveModel;
use crate::normalizer::{ConversionStats, Normalizer};
use crate::server::{AcceptedRecord, RejectedRecord};

/// Dataset subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DatasetCommands {
    /// Normalize every record and print a batch summary
    Normalize {
        /// JSON file holding an array of raw patient records
        file: PathBuf,

        /// Abort on the first rejected record
        #[arg(long)]
        strict: bool,
    },

    /// Normalize, index and run a search
    Search {
        /// JSON file holding an array of raw patient records
        file: PathBuf,

        /// Search criteria as a JSON object
        #[arg(long)]
        criteria: String,
    },

    /// Normalize and print dataset insights
    Insights {
        /// JSON file holding an array of raw patient records
        file: PathBuf,

        /// Comma-separated focus areas: beliefs, emotions, communication, distortions, therapeutic
        #[arg(long, value_delimiter = ',')]
        focus: Vec<FocusArea>,
    },
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Summary printed by `normalize`.
#[derive(Debug, Serialize)]
pub struct NormalizeSummary {
    /// Records in the file.
    pub total: usize,
    /// Accepted records.
    pub accepted: Vec<AcceptedRecord>,
    /// Rejected records.
    pub rejected: Vec<RejectedRecord>,
    /// Conversion statistics for the run.
    pub stats: ConversionStats,
}

/// Execute a dataset CLI command.
pub fn execute_command(command: DatasetCommands, config: &Config) -> CliResult {
    let outcome = match command {
        DatasetCommands::Normalize { file, strict } => execute_normalize(&file, strict, config),
        DatasetCommands::Search { file, criteria } => execute_search(&file, &criteria, config),
        DatasetCommands::Insights { file, focus } => execute_insights(&file, focus, config),
    };

    match outcome {
        Ok(output) => CliResult::success(output),
        Err(e) => CliResult::error(format!("Error: {}", e)),
    }
}

/// Read a JSON array of raw records.
///
/// Records stay untyped here; each is parsed during normalization so one
/// malformed record does not fail the whole file.
pub fn load_records(path: &Path) -> AppResult<Vec<Value>> {
    let text = std::fs::read_to_string(path)?;
    let records: Vec<Value> =
        serde_json::from_str(&text).map_err(|e| AppError::Dataset {
            message: format!("{}: {}", path.display(), e),
        })?;

    info!(path = %path.display(), records = records.len(), "Loaded dataset");
    Ok(records)
}

fn execute_normalize(file: &Path, strict: bool, config: &Config) -> AppResult<String> {
    let records = load_records(file)?;
    let mut normalizer = Normalizer::new(config.normalizer.clone());
    let batch = normalizer.normalize_values(&records, strict || config.normalizer.strict_mode)?;

    let summary = NormalizeSummary {
        total: records.len(),
        accepted: batch.successful.iter().map(AcceptedRecord::from).collect(),
        rejected: batch.errors.iter().map(RejectedRecord::from).collect(),
        stats: normalizer.get_stats(),
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

fn execute_search(file: &Path, criteria: &str, config: &Config) -> AppResult<String> {
    let criteria: SearchCriteria = serde_json::from_str(criteria).map_err(|e| AppError::Config {
        message: format!("Invalid search criteria: {}", e),
    })?;

    let models = normalize_file(file, config)?;
    let indexer = PatientIndexer::build(config.indexer.clone(), &models);
    let results = indexer.search_models(&criteria);

    debug!(results = results.len(), "Search complete");
    Ok(serde_json::to_string_pretty(&results)?)
}

fn execute_insights(file: &Path, focus: Vec<FocusArea>, config: &Config) -> AppResult<String> {
    let models = normalize_file(file, config)?;
    let options = if focus.is_empty() {
        InsightOptions::default()
    } else {
        InsightOptions::focused(focus)
    };

    let mut engine = InsightEngine::new(config.insights.clone());
    let insights = engine.generate_insights(&models, &options)?;
    Ok(InsightEngine::export_json(&insights)?)
}

fn normalize_file(file: &Path, config: &Config) -> AppResult<Vec<CognitiveModel>> {
    let records = load_records(file)?;
    let mut normalizer = Normalizer::new(config.normalizer.clone());
    Ok(normalizer
        .normalize_values(&records, config.normalizer.strict_mode)?
        .models())
}
