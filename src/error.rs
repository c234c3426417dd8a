//! Unified error type for the census analytics engine
//!
//! Structured error handling for the parts of the system that do I/O: the
//! dataset loader, the file-backed stores, and the LLM transport.
//!
//! Analytical validation problems (unknown program, unknown cross-tab
//! variable, empty working sets) are NOT errors here — the engine reports
//! those as structured fields inside `AnalysisResult` so they never cross the
//! engine boundary as a panic or an `Err`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Store errors: the JSON-file user and usage stores
    #[error("Store error: {message}")]
    Store {
        message: String,
        path: Option<String>,
    },

    /// Dataset errors: missing source files, unjoinable rows, bad columns
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// LLM transport errors: network failures, non-JSON payloads
    #[error("LLM error: {message}")]
    Llm { message: String },

    /// Configuration errors: malformed environment overrides
    #[error("Config error: {message}")]
    Config { message: String },

    /// IO errors from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing errors from the loader
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization errors from the stores
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn store(message: impl Into<String>, path: Option<&std::path::Path>) -> Self {
        EngineError::Store {
            message: message.into(),
            path: path.map(|p| p.display().to_string()),
        }
    }

    pub fn dataset(message: impl Into<String>) -> Self {
        EngineError::Dataset {
            message: message.into(),
        }
    }

    pub fn llm(message: impl Into<String>) -> Self {
        EngineError::Llm {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
