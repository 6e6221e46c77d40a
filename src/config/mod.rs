use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub normalizer: NormalizerConfig,
    pub indexer: IndexerConfig,
    pub insights: InsightsConfig,
    pub dataset: DatasetConfig,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Normalizer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    /// Minimum completeness (0.0-1.0) a record needs to be accepted.
    pub quality_threshold: f64,
    /// Abort a batch on the first failure.
    pub strict_mode: bool,
    /// Raise on out-of-range strength/intensity instead of only flagging it.
    pub reject_out_of_range: bool,
}

/// Indexer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IndexerConfig {
    /// Result cap when criteria do not set `max_results`.
    pub default_max_results: usize,
    /// Result cap for training-scenario selection.
    pub scenario_max_results: usize,
}

/// How cached insight snapshots go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStaleness {
    /// Every entry ages from its own creation time.
    PerEntry,
    /// All entries age from the most recent fresh analysis.
    Global,
}

/// Insight engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsConfig {
    pub cache_ttl_secs: u64,
    pub staleness: CacheStaleness,
}

/// Dataset preloading configuration
#[derive(Debug, Clone, Default)]
pub struct DatasetConfig {
    /// JSON array of raw patient records loaded at server start.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let quality_threshold = env::var("NORMALIZER_QUALITY_THRESHOLD")
            .ok()
            .map(|s| {
                s.parse::<f64>().map_err(|_| AppError::Config {
                    message: format!("NORMALIZER_QUALITY_THRESHOLD is not a number: {}", s),
                })
            })
            .transpose()?
            .unwrap_or(0.7);

        if !(0.0..=1.0).contains(&quality_threshold) {
            return Err(AppError::Config {
                message: format!(
                    "NORMALIZER_QUALITY_THRESHOLD must be between 0 and 1, got {}",
                    quality_threshold
                ),
            });
        }

        let normalizer = NormalizerConfig {
            quality_threshold,
            strict_mode: env_flag("NORMALIZER_STRICT_MODE", false),
            reject_out_of_range: env_flag("NORMALIZER_REJECT_OUT_OF_RANGE", true),
        };

        let indexer = IndexerConfig {
            default_max_results: env::var("INDEX_MAX_RESULTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            scenario_max_results: env::var("SCENARIO_MAX_RESULTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        };

        let insights = InsightsConfig {
            cache_ttl_secs: env::var("INSIGHTS_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86_400),
            staleness: match env::var("INSIGHTS_CACHE_STALENESS")
                .unwrap_or_else(|_| "per_entry".to_string())
                .to_lowercase()
                .as_str()
            {
                "global" => CacheStaleness::Global,
                _ => CacheStaleness::PerEntry,
            },
        };

        let dataset = DatasetConfig {
            path: env::var("DATASET_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Config {
            logging,
            normalizer,
            indexer,
            insights,
            dataset,
        })
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 0.7,
            strict_mode: false,
            reject_out_of_range: true,
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            default_max_results: 50,
            scenario_max_results: 10,
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 86_400,
            staleness: CacheStaleness::PerEntry,
        }
    }
}
