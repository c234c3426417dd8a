//! One-shot CLI: ask a single question from the command line.
//!
//! Usage: `cargo run --bin consulta -- "¿Cuántas jefas de familia hay en la colonia Centro?"`

use std::sync::Arc;

use anyhow::{bail, Result};
use pape_engine::agent::AnalyticsAgent;
use pape_engine::config::Settings;
use pape_engine::dataset::loader::DatasetLoader;
use pape_engine::engine::Analyzer;
use pape_engine::llm::{ChatClient, LlmIntentExtractor, LlmNarrator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let pregunta: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if pregunta.trim().is_empty() {
        bail!("Uso: consulta \"<pregunta en lenguaje natural>\"");
    }

    let settings = Settings::from_env();
    let api_key = match settings.llm.api_key.clone() {
        Some(k) => k,
        None => bail!("DEEPSEEK_API_KEY no está configurada"),
    };

    let loader = DatasetLoader::new(settings.data.base_url.clone(), settings.data.dir.clone());
    let dataset = loader.load().await?.into_shared();
    let analyzer = Arc::new(Analyzer::new(dataset));

    let extractor = LlmIntentExtractor::new(ChatClient::new(
        Some(settings.llm.base_url.clone()),
        Some(settings.llm.model.clone()),
        api_key.clone(),
    ));
    let narrator = LlmNarrator::new(ChatClient::new(
        Some(settings.llm.base_url),
        Some(settings.llm.model),
        api_key,
    ));

    let agent = AnalyticsAgent::new(analyzer, Box::new(extractor), Box::new(narrator));
    let respuesta = agent.procesar(&pregunta).await?;
    println!("{}", respuesta);
    Ok(())
}
