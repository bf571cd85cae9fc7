//! The AskDesk HTTP surface.
//!
//! Three routes: `POST /ask` (the end-user answering flow), `POST /support`
//! (escalation to the CRM), and `GET /health`. End users only ever receive a
//! synthesized answer or a fixed fallback; raw errors stay in the logs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use askdesk_rag::{AnswerPipeline, GatePolicy, Verdict};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::access::AllowList;
use crate::audit::AuditLog;
use crate::support::SupportWebhook;

/// Fixed response text for requesters outside the allow-list.
const DEFAULT_ACCESS_DENIED: &str = "Access restricted. Please contact your administrator.";

/// Shared state behind the router.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnswerPipeline>,
    pub gate: Arc<GatePolicy>,
    pub access: Arc<AllowList>,
    pub audit: Arc<AuditLog>,
    pub support: Option<Arc<SupportWebhook>>,
    access_denied: Arc<String>,
}

impl AppState {
    /// Assemble the server state.
    pub fn new(
        pipeline: Arc<AnswerPipeline>,
        gate: GatePolicy,
        access: AllowList,
        audit: AuditLog,
        support: Option<SupportWebhook>,
    ) -> Self {
        Self {
            pipeline,
            gate: Arc::new(gate),
            access: Arc::new(access),
            audit: Arc::new(audit),
            support: support.map(Arc::new),
            access_denied: Arc::new(DEFAULT_ACCESS_DENIED.to_string()),
        }
    }

    /// Override the access-denied message (localized deployments).
    pub fn with_access_denied_message(mut self, message: impl Into<String>) -> Self {
        self.access_denied = Arc::new(message.into());
        self
    }
}

/// Bind address for [`run_server`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

// ── Wire types ─────────────────────────────────────────────────────

/// Body of `POST /ask`.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    /// The end user's question.
    pub question: String,
    /// Requester identifier checked against the allow-list.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Body of the `POST /ask` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// The synthesized answer, or a fixed fallback/denial message.
    pub answer: String,
    /// Source link for the answer, when one exists.
    pub article_url: Option<String>,
    /// Whether `answer` is a real answer rather than a fallback.
    pub has_answer: bool,
}

impl AskResponse {
    fn refusal(message: &str) -> Self {
        Self { answer: message.to_string(), article_url: None, has_answer: false }
    }
}

impl From<Verdict> for AskResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            answer: verdict.answer,
            article_url: verdict.article_url,
            has_answer: verdict.has_answer,
        }
    }
}

/// Body of `POST /support`.
#[derive(Debug, Clone, Deserialize)]
pub struct SupportRequest {
    /// Support category chosen by the user.
    pub category: String,
    /// Chat identifier or link for the operator to follow up on.
    pub chat_id: String,
}

// ── Router ─────────────────────────────────────────────────────────

/// Build the application router over the given state.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/support", post(create_support))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(60)))
}

/// Bind and serve until the process is stopped.
pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for askdesk server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("askdesk listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ───────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "askdesk"}))
}

async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Json<AskResponse> {
    // Every attempt is audited, before the access check.
    state.audit.record(request.user_id.as_deref(), &request.question).await;

    if !state.access.is_allowed(request.user_id.as_deref()) {
        warn!(user_id = ?request.user_id, "requester not on the allow-list");
        return Json(AskResponse::refusal(&state.access_denied));
    }

    match state.pipeline.answer(&request.question).await {
        Ok(outcome) => Json(AskResponse::from(state.gate.evaluate(&outcome))),
        Err(e) => {
            // Internal detail stays in the log; the user sees the fallback.
            error!(error = %e, "answering failed");
            Json(AskResponse::refusal(&state.gate.fallback_message))
        }
    }
}

async fn create_support(
    State(state): State<AppState>,
    Json(request): Json<SupportRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let Some(webhook) = &state.support else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "support escalation is not configured"})),
        ));
    };

    match webhook.create_case(&request.category, &request.chat_id).await {
        Ok(()) => Ok(Json(json!({"status": "created"}))),
        Err(e) => {
            error!(error = %e, "support case creation failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "failed to create support case"})),
            ))
        }
    }
}
