//! Web server - HTTP surface over the agent and the raw engine
//!
//! Thin axum glue: auth check, quota check, dispatch, record. The engine
//! itself never sees HTTP types. `/api/analyze` exposes the deterministic
//! engine directly (no LLM), which is also how operations staff debug odd
//! narrations: same payload, raw numbers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::agent::AnalyticsAgent;
use crate::auth::{LoginOutcome, UserStore};
use crate::engine::Analyzer;
use crate::intent::{self, IntentPayload};
use crate::ratelimit::UsageStore;

pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Absent when no LLM key is configured; /api/ask degrades gracefully.
    pub agent: Option<AnalyticsAgent>,
    pub users: UserStore,
    pub limits: UsageStore,
}

pub type SharedState = Arc<AppState>;

/// Start the web server.
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!(host, port, "PAPE analytics server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/ask", post(ask))
        .route("/api/analyze", post(analyze))
        .route("/api/auth/login", post(login))
        .route("/api/usage/:email", get(usage))
        .route("/api/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct AskRequest {
    email: String,
    pregunta: String,
}

/// Full question-answering flow: active user, available quota, agent answer,
/// usage recorded only on success.
async fn ask(
    State(state): State<SharedState>,
    Json(req): Json<AskRequest>,
) -> (StatusCode, Json<Value>) {
    let agent = match &state.agent {
        Some(a) => a,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "LLM no configurado (falta DEEPSEEK_API_KEY)" })),
            )
        }
    };

    match state.users.es_activo(&req.email) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Usuario no autorizado" })),
            )
        }
        Err(e) => return internal(e),
    }

    let uso = match state.limits.uso_de_hoy(&req.email) {
        Ok(u) => u,
        Err(e) => return internal(e),
    };
    if !uso.puede_consultar {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Límite diario alcanzado",
                "proxima_disponible": uso.proxima_disponible,
            })),
        );
    }

    let respuesta = match agent.procesar(&req.pregunta).await {
        Ok(r) => r,
        Err(e) => return internal(e),
    };

    if let Err(e) = state.limits.registrar_consulta(&req.email, &req.pregunta) {
        // The answer is already computed; losing one usage tick is the
        // lesser failure. Log and respond.
        error!(error = %e, "failed to record query against quota");
    }
    let uso = state.limits.uso_de_hoy(&req.email).ok();

    (
        StatusCode::OK,
        Json(json!({ "respuesta": respuesta, "uso": uso })),
    )
}

/// Raw engine access: a structured payload in, the structured result out.
/// Payload validation errors come back inside the result body, status 200 —
/// they are analytical outcomes, not transport failures.
async fn analyze(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let resultado = match IntentPayload::from_value(&body) {
        Some(payload) => intent::route(&state.analyzer, &payload).to_json(),
        None => json!({ "error": "Payload sin intención utilizable" }),
    };
    (StatusCode::OK, Json(resultado))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<Value>) {
    match state.users.validar_credenciales(&req.email, &req.password) {
        Ok(LoginOutcome::Aceptado { nombre, rol }) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "nombre": nombre, "rol": rol })),
        ),
        Ok(LoginOutcome::Rechazado { motivo }) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "motivo": motivo })),
        ),
        Err(e) => internal(e),
    }
}

async fn usage(
    State(state): State<SharedState>,
    Path(email): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.limits.uso_de_hoy(&email) {
        Ok(uso) => (StatusCode::OK, Json(json!(uso))),
        Err(e) => internal(e),
    }
}

async fn health_check(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "personas": state.analyzer.dataset().len(),
        "llm": state.agent.is_some(),
    }))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    error!(error = %e, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Error interno" })),
    )
}
