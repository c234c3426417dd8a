//! Analytics Agent - Question in, narrated answer out
//!
//! Orchestrates the full flow: extract a structured intent from the question,
//! run the deterministic engine, narrate the numeric result. Every LLM
//! failure mode fails soft — the caller always gets an answer string, never a
//! crash from a malformed model response.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::engine::{AnalysisResult, Analyzer};
use crate::intent;
use crate::llm::{IntentExtractor, Narrator};

pub const FALLBACK_ANSWER: &str =
    "No pude interpretar la pregunta como una consulta analítica. \
     Intenta reformularla, por ejemplo: \"¿Cuántas personas hay en la colonia Centro?\"";

pub struct AnalyticsAgent {
    analyzer: Arc<Analyzer>,
    extractor: Box<dyn IntentExtractor>,
    narrator: Box<dyn Narrator>,
}

impl AnalyticsAgent {
    pub fn new(
        analyzer: Arc<Analyzer>,
        extractor: Box<dyn IntentExtractor>,
        narrator: Box<dyn Narrator>,
    ) -> Self {
        Self {
            analyzer,
            extractor,
            narrator,
        }
    }

    /// Answer one free-text question. The rendered cross-tab grid, when
    /// present, is prepended verbatim (hard data first, interpretation
    /// after); the narrator itself never analyzes it.
    pub async fn procesar(&self, pregunta: &str) -> Result<String> {
        let payload = match self.extractor.extract(pregunta).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                info!("no structured intent extracted, answering with fallback");
                return Ok(FALLBACK_ANSWER.to_string());
            }
            Err(e) => {
                warn!(error = %e, "intent extraction failed, answering with fallback");
                return Ok(FALLBACK_ANSWER.to_string());
            }
        };

        info!(intencion = %payload.intencion, "running analytical operation");
        let resultado = intent::route(&self.analyzer, &payload);
        let resultado_json = resultado.to_json();

        let tabla_visual = match &resultado {
            AnalysisResult::TablaCruzada(t) => Some(t.tabla_visual.clone()),
            _ => None,
        };

        let narracion = match self.narrator.narrate(&resultado_json).await {
            Ok(texto) => texto,
            Err(e) => {
                // The numbers are still good; degrade to raw JSON rather
                // than losing the result.
                warn!(error = %e, "narration failed, returning raw result");
                resultado_json.to_string()
            }
        };

        Ok(match tabla_visual {
            Some(tabla) => format!("{}\n\n{}", tabla, narracion),
            None => narracion,
        })
    }
}
