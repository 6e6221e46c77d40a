use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Insight error: {0}")]
    Insight(#[from] InsightError),

    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    #[error("Dataset error: {message}")]
    Dataset { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Normalization failures. Every variant carries the raw record's id.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NormalizationError {
    #[error("Record {source_id} failed validation: {}", .notes.join("; "))]
    Validation { source_id: String, notes: Vec<String> },

    #[error("Record {source_id} rejected: completeness {completeness:.2} below threshold {threshold:.2}")]
    QualityBelowThreshold {
        source_id: String,
        completeness: f64,
        threshold: f64,
    },

    #[error("Record {source_id} is malformed: {message}")]
    Malformed { source_id: String, message: String },
}

impl NormalizationError {
    /// Id of the raw record that failed.
    pub fn source_id(&self) -> &str {
        match self {
            NormalizationError::Validation { source_id, .. } => source_id,
            NormalizationError::QualityBelowThreshold { source_id, .. } => source_id,
            NormalizationError::Malformed { source_id, .. } => source_id,
        }
    }
}

/// Insight engine failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InsightError {
    #[error("Analysis failed during {phase}: {message}")]
    Analysis { phase: String, message: String },

    #[error("Failed to serialize insights: {message}")]
    Serialization { message: String },
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    #[error("Tool execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tool-specific errors with structured details
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Model not found: {model_id}")]
    ModelNotFound { model_id: String },
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Validation { .. } => McpError::InvalidRequest {
                message: err.to_string(),
            },
            ToolError::ModelNotFound { .. } => McpError::ExecutionFailed {
                message: err.to_string(),
            },
        }
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Dataset {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for insight analysis
pub type InsightResult<T> = Result<T, InsightError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;
