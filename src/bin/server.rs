use std::sync::Arc;

use pape_engine::agent::AnalyticsAgent;
use pape_engine::auth::UserStore;
use pape_engine::config::Settings;
use pape_engine::dataset::loader::DatasetLoader;
use pape_engine::engine::Analyzer;
use pape_engine::llm::{ChatClient, LlmIntentExtractor, LlmNarrator};
use pape_engine::ratelimit::UsageStore;
use pape_engine::web::{start_server, AppState};

use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = Settings::from_env();

    // Build the unified table once; it is read-only for the process lifetime.
    let loader = DatasetLoader::new(settings.data.base_url.clone(), settings.data.dir.clone());
    let dataset = loader.load().await?.into_shared();
    let analyzer = Arc::new(Analyzer::new(dataset));

    let users = UserStore::new(settings.data.store_dir.join("usuarios.json"));
    users.ensure_defaults()?;
    let limits = UsageStore::new(
        settings.data.store_dir.join("limites_uso.json"),
        settings.quota.consultas_por_dia,
    );
    limits.ensure_file()?;
    limits.limpiar_antiguos(settings.quota.retencion_dias)?;

    let agent = match &settings.llm.api_key {
        Some(key) => {
            let extractor = LlmIntentExtractor::new(ChatClient::new(
                Some(settings.llm.base_url.clone()),
                Some(settings.llm.model.clone()),
                key.clone(),
            ));
            let narrator = LlmNarrator::new(ChatClient::new(
                Some(settings.llm.base_url.clone()),
                Some(settings.llm.model.clone()),
                key.clone(),
            ));
            Some(AnalyticsAgent::new(
                analyzer.clone(),
                Box::new(extractor),
                Box::new(narrator),
            ))
        }
        None => {
            warn!("DEEPSEEK_API_KEY not set; /api/ask will be unavailable");
            None
        }
    };

    let state = AppState {
        analyzer,
        agent,
        users,
        limits,
    };
    start_server(state, &settings.server.host, settings.server.port).await
}
