//! LLM Module - External language-model collaborators
//!
//! Two independent capability interfaces, so the engine can be driven by
//! synthetic payloads in tests with no network dependency: an extractor that
//! turns free text into a structured intent payload (or nothing, on any
//! non-conforming output), and a narrator that turns a structured result into
//! prose.

pub mod chat_client;
pub mod extractor;
pub mod narrator;

use async_trait::async_trait;

use crate::intent::IntentPayload;

pub use chat_client::ChatClient;
pub use extractor::LlmIntentExtractor;
pub use narrator::LlmNarrator;

/// text → structured payload | nothing. A timeout, malformed JSON, or any
/// other non-conforming response surfaces as `Ok(None)` or `Err`; the caller
/// fails soft either way.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, pregunta: &str) -> anyhow::Result<Option<IntentPayload>>;
}

/// structured result → prose.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, resultado: &serde_json::Value) -> anyhow::Result<String>;
}
