//! HTTP Endpoints
//!
//! REST API over FIR conversations.

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use fir_assist_agent::{CompletionReport, ConversationSnapshot, TurnOutcome};
use fir_assist_core::{
    Classification, ClassificationSource, FormState, ProviderHealth, TagSet,
};

use crate::metrics::{metrics_handler, record_classification_fallback, record_turn};
use crate::state::AppState;
use crate::ServerError;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.request_timeout_secs);

    Router::new()
        // Sessions
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/utterances", post(submit_utterance))
        .route("/api/sessions/:id/form/:section/:field", put(edit_field))
        .route("/api/sessions/:id/classify", post(classify))
        // Configuration
        .route("/api/config/validation", get(config_validation))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// CORS from configured origins. Disabled CORS is permissive; no valid
/// origins falls back to localhost:3000.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(Any)
}

#[derive(Debug, Serialize)]
struct CreateSessionResponse {
    session_id: String,
    provider_health: ProviderHealth,
    config_errors: Vec<String>,
    greeting: Option<String>,
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), StatusCode> {
    let session = state.create_conversation().map_err(StatusCode::from)?;
    let conversation = &session.conversation;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id.clone(),
            provider_health: conversation.provider_health(),
            config_errors: state.config_errors.as_ref().clone(),
            greeting: conversation.history().first().map(|turn| turn.text.clone()),
        }),
    ))
}

async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationSnapshot>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.touch();
    Ok(Json(session.conversation.snapshot()))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Deserialize)]
struct UtteranceRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct UtteranceResponse {
    #[serde(flatten)]
    outcome: TurnOutcome,
    form: FormState,
    tags: TagSet,
    provider_health: ProviderHealth,
    completion: CompletionReport,
}

async fn submit_utterance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UtteranceRequest>,
) -> Result<Json<UtteranceResponse>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.touch();

    let started = Instant::now();
    let outcome = session
        .conversation
        .submit_utterance(&request.text)
        .await
        .map_err(|e| StatusCode::from(ServerError::from(e)))?;
    record_turn(&outcome, started.elapsed());

    let conversation = &session.conversation;
    Ok(Json(UtteranceResponse {
        outcome,
        form: conversation.form_state(),
        tags: conversation.tag_set(),
        provider_health: conversation.provider_health(),
        completion: conversation.completion(),
    }))
}

#[derive(Debug, Deserialize)]
struct EditFieldRequest {
    value: String,
}

async fn edit_field(
    State(state): State<AppState>,
    Path((id, section, field)): Path<(String, String, String)>,
    Json(request): Json<EditFieldRequest>,
) -> Result<Json<FormState>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.touch();

    let form = session
        .conversation
        .edit_field(&section, &field, &request.value)
        .map_err(|e| StatusCode::from(ServerError::from(e)))?;
    Ok(Json(form))
}

async fn classify(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Classification>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.touch();

    let classification = session.conversation.refresh_classification().await;
    if state.generator.is_some() && classification.source == ClassificationSource::Rules {
        record_classification_fallback();
    }
    Ok(Json(classification))
}

async fn config_validation(State(state): State<AppState>) -> Json<serde_json::Value> {
    let validation = state.settings.provider.validation();
    Json(serde_json::json!({
        "provider": validation.provider,
        "is_valid": validation.is_valid,
        "errors": validation.errors,
        "enable_fallback": state.settings.provider.enable_fallback,
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
        "provider": {
            "kind": state.settings.provider.kind,
            "configured": state.generator.is_some(),
        },
        "domain": {
            "jurisdiction": state.domain.jurisdiction,
            "legal_code": state.domain.legal_code,
            "categories": state.domain.taxonomy.len(),
            "rules": state.domain.legal_rules.len(),
        },
    }))
}
