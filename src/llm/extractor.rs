//! Intent Extractor - Free text to structured intent payload
//!
//! The model's sole job here is translation: question in, `{intencion,
//! filtros}` JSON out, temperature 0. Anything that does not parse into a
//! usable payload becomes `None` — the agent answers with a fallback instead
//! of guessing.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::catalog;
use crate::intent::IntentPayload;
use crate::llm::chat_client::{extract_json, ChatClient};
use crate::llm::IntentExtractor;

pub struct LlmIntentExtractor {
    client: ChatClient,
}

impl LlmIntentExtractor {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn system_prompt() -> String {
        format!(
            r#"Eres un Asistente de Política Social.
TU MISIÓN: Traducir preguntas a JSON con la forma {{"intencion": ..., "filtros": {{...}}}}.

MAPEO DE INTENCIONES:
- "Perfil", "Cuántos", "Demografía" -> intencion="conteo_general"
- "Beca", "Pensión", "Programa" -> intencion="elegibilidad"
- "Brechas", "No reciben" -> intencion="brechas"
- "Vulnerabilidad", "Intensidad" -> intencion="vulnerabilidad" (Es el análisis global 0-3 carencias. NO pidas especificar tipo).
- "Cruzar", "Tabla", "Relación" -> intencion="tabla_cruzada"

FILTROS DISPONIBLES (todos opcionales):
- rango_edad: [min, max] (enteros)
- sexo: "Mujer" | "Hombre"
- ubicacion: texto libre (colonia o AGEB)
- programa_social: uno de [{programas}]
- carencia_tipo: "salud" | "educacion" | "seguridad_social"
- grupo_especial: "ninguno" | "jefas_familia"
- variable_fila / variable_columna: uno de [{variables}] (solo para tabla_cruzada)

Responde SOLO con el JSON, sin explicaciones."#,
            programas = catalog::program_keys().join(", "),
            variables = catalog::cross_var_keys().join(", "),
        )
    }
}

#[async_trait]
impl IntentExtractor for LlmIntentExtractor {
    async fn extract(&self, pregunta: &str) -> Result<Option<IntentPayload>> {
        let response = self
            .client
            .chat(&Self::system_prompt(), pregunta, 0.0)
            .await?;
        debug!(chars = response.len(), "intent extraction response received");

        let cleaned = extract_json(&response);
        let value: serde_json::Value = match serde_json::from_str(&cleaned) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "intent response was not JSON, treating as no intent");
                return Ok(None);
            }
        };

        Ok(IntentPayload::from_value(&value))
    }
}
