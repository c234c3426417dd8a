//! # PAPE Analytics Engine
//!
//! A deterministic analytical query engine over a social-program census
//! dataset, with an LLM question-answering layer around it.
//!
//! ## Quick Start
//!
//! ```rust
//! use pape_engine::dataset::Dataset;
//! use pape_engine::engine::{Analyzer, FilterSet};
//!
//! // The unified table normally comes from the loader; tests build it
//! // directly from records.
//! let dataset = Dataset::from_records(vec![]).into_shared();
//! let analyzer = Analyzer::new(dataset);
//!
//! // Empty working sets are an explicit notice, never a crash.
//! let result = analyzer.general_profile(&FilterSet::default());
//! println!("{}", result.to_json());
//! ```
//!
//! ## Architecture
//!
//! - **Deterministic core**: filter pipeline + five analytical operations
//!   (general profile, program eligibility, coverage gaps, vulnerability
//!   intensity, cross-tabulation). Pure functions of (table, filters).
//! - **Defensive boundary**: intent payloads from the LLM are validated and
//!   routed; malformed input becomes a structured error result.
//! - **Peripherals**: DeepSeek-backed intent extraction and narration,
//!   file-backed auth and daily quotas, an axum HTTP surface.

// Internal modules
pub mod agent;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod intent;
pub mod llm;
pub mod ratelimit;
pub mod web;

// Public API - Main types users need
pub use agent::AnalyticsAgent;
pub use dataset::{Dataset, PersonRecord};
pub use engine::{AnalysisResult, Analyzer, FilterSet};
pub use error::EngineError;
pub use intent::IntentPayload;
