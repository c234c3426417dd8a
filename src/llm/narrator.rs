//! Narrator - Structured result to prose
//!
//! Second, independent LLM pass: reads the numeric result and writes the
//! interpretation. The rendered cross-tab grid (`tabla_visual`) is shown to
//! the user verbatim by the caller, so the prompt orders the model to ignore
//! it entirely.

use anyhow::Result;
use async_trait::async_trait;

use crate::llm::chat_client::ChatClient;
use crate::llm::Narrator;

const SYSTEM_PROMPT: &str = "Eres un Estratega Senior de Política Social.";

pub struct LlmNarrator {
    client: ChatClient,
}

impl LlmNarrator {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn user_prompt(resultado: &serde_json::Value) -> String {
        format!(
            r#"Analiza los siguientes datos JSON resultantes de una consulta sobre la Alcaldía Álvaro Obregón:
{resultado}

INSTRUCCIONES DE ANÁLISIS:
1. IGNORA el campo 'tabla_visual' (ya se mostrará aparte).
2. Realiza una interpretación PROFUNDA y NARRATIVA de los datos numéricos.
3. Busca activamente:
- Brechas de género (¿Las mujeres están más afectadas?).
- Vulnerabilidad por edad (¿Niños o ancianos en riesgo?).
- Patrones atípicos o alarmantes.
4. Usa un tono profesional, empático y orientado a la toma de decisiones.
5. NO repitas los números fila por fila, explica QUÉ SIGNIFICAN para la política social.
6. Estructura tu respuesta con subtítulos claros (Markdown)."#,
            resultado = resultado
        )
    }
}

#[async_trait]
impl Narrator for LlmNarrator {
    async fn narrate(&self, resultado: &serde_json::Value) -> Result<String> {
        // Higher temperature than extraction: narration wants eloquence, not
        // determinism.
        self.client
            .chat(SYSTEM_PROMPT, &Self::user_prompt(resultado), 0.7)
            .await
    }
}
