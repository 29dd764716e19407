use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::{Next, from_fn},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use claim_flow::{
    ConversationContext, ExecutionResult, ExecutionStatus, FlowConfig, FlowError, FlowRunner,
    Gateways, InMemoryArtifactStore, InMemorySessionStorage, MemoryBackend, TranscriptEntry,
    UserEvent, model::LetterOffer,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{config::ServiceConfig, workflow::create_flow_runner};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn flow_error(session_id: &str, e: FlowError) -> ApiError {
    match e {
        FlowError::SessionNotFound(_) => not_found_error("Session not found", session_id),
        FlowError::OfferNotFound(offer_id) => {
            not_found_error("Letter offer not found", &offer_id.to_string())
        }
        FlowError::UnexpectedEvent { .. } | FlowError::NoActiveWorkflow => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": e.to_string(),
                "session_id": session_id
            })),
        ),
        FlowError::Gateway(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Backend call failed",
                "details": e.to_string()
            })),
        ),
        other => internal_error("Conversation step failed", &other.to_string()),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub flow_runner: FlowRunner,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub turns: Vec<TranscriptEntry>,
    pub awaiting: String,
    pub status: String,
}

impl ChatResponse {
    fn new(session_id: String, result: ExecutionResult) -> Self {
        Self {
            session_id,
            awaiting: short_task_name(&result.awaiting).to_string(),
            status: match result.status {
                ExecutionStatus::WaitingForInput => "waiting_for_input".to_string(),
                ExecutionStatus::Completed => "completed".to_string(),
            },
            turns: result.entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub awaiting: String,
    pub status_message: Option<String>,
    pub conversation: ConversationContext,
    pub letter_offers: Vec<LetterOffer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `claim_assistant_service::tasks::main_menu::MainMenuTask` -> `MainMenuTask`
fn short_task_name(task_id: &str) -> &str {
    task_id.rsplit("::").next().unwrap_or(task_id)
}

pub async fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let app_state = create_app_state(config).await?;
    Ok(build_router(app_state))
}

pub async fn create_app_state(config: &ServiceConfig) -> anyhow::Result<AppState> {
    let artifacts = Arc::new(InMemoryArtifactStore::new());
    let mut flow_config = FlowConfig::default().with_pacing(config.pacing);

    let gateways = match &config.backend_url {
        Some(url) => {
            info!(backend_url = %url, "Using HTTP claim backend");
            let backend = Arc::new(claim_flow::HttpBackend::new(url.clone(), config.backend_timeout)?);
            match backend.plans().await {
                Ok(catalog) if !catalog.is_empty() => {
                    info!(plans = catalog.plans().len(), "Loaded insurance plans from backend");
                    flow_config = flow_config.with_catalog(catalog);
                }
                Ok(_) => warn!("Backend listed no insurance plans; using built-in catalog"),
                Err(e) => warn!(error = %e, "Could not load insurance plans; using built-in catalog"),
            }
            Gateways::from_backend(backend, artifacts)
        }
        None => {
            info!("Using in-memory demo backend (set BACKEND_URL to use a real one)");
            Gateways::from_backend(Arc::new(MemoryBackend::new()), artifacts)
        }
    };

    let flow_runner = create_flow_runner(
        Arc::new(InMemorySessionStorage::new()),
        gateways,
        flow_config,
    );
    Ok(AppState { flow_runner })
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/chat", post(open_chat))
        .route("/chat/{session_id}", get(get_session).delete(close_session))
        .route("/chat/{session_id}/events", post(send_event))
        .route("/artifacts/{artifact_id}", get(download_artifact))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Claim Assistant Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /chat": "Open a conversation",
            "POST /chat/{session_id}/events": "Send a menu pick, file upload, policy pick or letter details",
            "GET /chat/{session_id}": "Get the conversation state",
            "DELETE /chat/{session_id}": "Close a conversation",
            "GET /artifacts/{artifact_id}": "Download a generated appeal letter",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn open_chat(State(state): State<AppState>) -> ApiResult<ChatResponse> {
    match state.flow_runner.open().await {
        Ok((session_id, result)) => {
            info!(session_id = %session_id, "Conversation opened");
            Ok(Json(ChatResponse::new(session_id, result)))
        }
        Err(e) => {
            error!(error = %e, "Failed to open conversation");
            Err(internal_error("Failed to open conversation", &e.to_string()))
        }
    }
}

fn validate_session_id(session_id: &str) -> Result<(), ApiError> {
    if Uuid::parse_str(session_id).is_err() {
        error!(session_id = %session_id, "Invalid session ID format");
        return Err(bad_request_error("Invalid session ID format"));
    }
    Ok(())
}

async fn send_event(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(event): Json<UserEvent>,
) -> ApiResult<ChatResponse> {
    validate_session_id(&session_id)?;

    info!(session_id = %session_id, event = %event.kind(), "Processing event");

    match state.flow_runner.dispatch(&session_id, event).await {
        Ok(result) => {
            info!(
                session_id = %session_id,
                status = ?result.status,
                turns = result.entries.len(),
                "Event processed"
            );
            Ok(Json(ChatResponse::new(session_id, result)))
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Event failed");
            Err(flow_error(&session_id, e))
        }
    }
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionSnapshot> {
    validate_session_id(&session_id)?;

    match state.flow_runner.session(&session_id).await {
        Ok(session) => Ok(Json(SessionSnapshot {
            awaiting: short_task_name(&session.current_task_id).to_string(),
            session_id: session.id,
            status_message: session.status_message,
            conversation: session.conversation,
            letter_offers: session.letter_offers,
            created_at: session.created_at,
            updated_at: session.updated_at,
        })),
        Err(e) => Err(flow_error(&session_id, e)),
    }
}

async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_session_id(&session_id)?;

    state
        .flow_runner
        .session(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    state
        .flow_runner
        .close(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    info!(session_id = %session_id, "Conversation closed");
    Ok(StatusCode::NO_CONTENT)
}

async fn download_artifact(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = Uuid::parse_str(&artifact_id).map_err(|_| bad_request_error("Invalid artifact ID"))?;

    match state.flow_runner.gateways().artifacts.get(id).await {
        Ok(Some(artifact)) => {
            info!(artifact_id = %id, size = artifact.bytes.len(), "Serving artifact");
            let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
            Ok((
                [
                    (header::CONTENT_TYPE, artifact.content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                artifact.bytes,
            )
                .into_response())
        }
        Ok(None) => Err(not_found_error("Artifact not found", &artifact_id)),
        Err(e) => {
            error!(artifact_id = %id, error = %e, "Failed to load artifact");
            Err(internal_error("Failed to load artifact", &e.to_string()))
        }
    }
}
