//! # MCP Cognitive Models
//!
//! Normalizes heterogeneous simulated-patient records into a canonical
//! cognitive-model schema, indexes them for multi-criteria retrieval and
//! computes aggregate insights over a collection. The engine is exposed as
//! a Model Context Protocol (MCP) server and as offline CLI commands.
//!
//! ## Features
//!
//! - **Normalizer**: heuristic classification, validation and data-quality scoring
//! - **Indexer**: inverted indices with weighted relevance search and training scenarios
//! - **Insight Engine**: belief, emotion, communication, distortion and therapeutic analyses with a TTL cache
//!
//! ## Architecture
//!
//! ```text
//! raw records → Normalizer → CognitiveModel[] → PatientIndexer
//!                                    ↓
//!                              InsightEngine
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use mcp_cognitive_models::{Config, Normalizer, PatientIndexer};
//!
//! let config = Config::default();
//! let mut normalizer = Normalizer::new(config.normalizer.clone());
//! let batch = normalizer.normalize_models(&records)?;
//! let indexer = PatientIndexer::build(config.indexer.clone(), &batch.models());
//! let ids = indexer.find_by_belief_domain("self");
//! ```

#![warn(missing_docs)]

/// Offline commands against a JSON dataset file.
pub mod cli;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Multi-index retrieval over normalized models.
pub mod indexer;
/// Aggregate dataset analysis.
pub mod insights;
/// Canonical cognitive model and raw input record types.
pub mod model;
/// Raw record normalization and quality scoring.
pub mod normalizer;
/// MCP server implementation and request handling.
pub mod server;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use indexer::PatientIndexer;
pub use insights::InsightEngine;
pub use normalizer::Normalizer;
pub use server::{AppState, McpServer, SharedState};
