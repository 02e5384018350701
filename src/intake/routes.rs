//! REST endpoints the chat widget talks to.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use super::canned::quick_actions;
use super::engine::IntakeEngine;
use super::model::LeadRecord;
use super::session::{SessionStore, SharedState};

/// Shared state for the intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub engine: Arc<IntakeEngine>,
    pub sessions: Arc<SessionStore>,
}

#[derive(Debug, Default, Deserialize)]
struct HealthQuery {
    /// Also send a ping completion to the proxy.
    #[serde(default)]
    probe: bool,
}

#[derive(Debug, Deserialize)]
struct SendMessage {
    text: String,
}

/// Build the intake REST routes.
pub fn intake_routes(state: IntakeRouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat/sessions", post(create_session))
        .route(
            "/api/chat/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/chat/sessions/{id}/messages", post(send_message))
        .route("/api/chat/sessions/{id}/reset", post(reset_session))
        .route("/api/chat/sessions/{id}/lead", get(get_lead))
        .layer(cors)
        .with_state(state)
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn not_found(id: impl std::fmt::Display) -> Response {
    error(StatusCode::NOT_FOUND, format!("No chat session {id}"))
}

/// Resolve a path segment to an open session. A segment that is not a UUID
/// cannot name a session, so it is a 404 like any unknown id.
async fn find_session(
    state: &IntakeRouteState,
    raw: &str,
) -> Result<(Uuid, SharedState), Response> {
    let id = Uuid::parse_str(raw).map_err(|_| not_found(raw))?;
    match state.sessions.get(id).await {
        Some(session) => Ok((id, session)),
        None => Err(not_found(id)),
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(
    State(state): State<IntakeRouteState>,
    Query(query): Query<HealthQuery>,
) -> impl IntoResponse {
    let mut json = serde_json::json!({
        "status": "ok",
        "service": "lead-intake",
        "completion_configured": state.engine.has_remote(),
        "sessions": state.sessions.len().await,
    });
    if query.probe {
        json["completion_reachable"] =
            serde_json::json!(state.engine.has_remote() && state.engine.check_connection().await);
    }
    Json(json)
}

// ── Sessions ────────────────────────────────────────────────────────────

/// POST /api/chat/sessions
async fn create_session(State(state): State<IntakeRouteState>) -> impl IntoResponse {
    let (id, session) = state.sessions.create().await;
    let step = session.lock().await.step;
    info!(session_id = %id, "Chat session created");
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": id,
            "step": step,
            "greeting": state.engine.greeting(),
            "quick_actions": quick_actions(step),
        })),
    )
}

/// GET /api/chat/sessions/{id}
async fn get_session(State(state): State<IntakeRouteState>, Path(raw): Path<String>) -> Response {
    let (id, session) = match find_session(&state, &raw).await {
        Ok(found) => found,
        Err(response) => return response,
    };
    let conversation = session.lock().await;
    Json(serde_json::json!({
        "session_id": id,
        "step": conversation.step,
        "intent": conversation.intent,
        "fields": conversation.fields,
        "turns": conversation.turns,
        "quick_actions": quick_actions(conversation.step),
    }))
    .into_response()
}

/// DELETE /api/chat/sessions/{id}
async fn delete_session(
    State(state): State<IntakeRouteState>,
    Path(raw): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&raw) else {
        return not_found(raw);
    };
    if state.sessions.remove(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(id)
    }
}

/// POST /api/chat/sessions/{id}/messages
///
/// Holds the session lock for the whole turn, so a second message for the
/// same session waits for the first to finish.
async fn send_message(
    State(state): State<IntakeRouteState>,
    Path(raw): Path<String>,
    body: Result<Json<SendMessage>, JsonRejection>,
) -> Response {
    let (id, session) = match find_session(&state, &raw).await {
        Ok(found) => found,
        Err(response) => return response,
    };
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return error(rejection.status(), rejection.body_text()),
    };
    let text = body.text.trim();
    if text.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Message text is empty");
    }

    let mut conversation = session.lock().await;
    let outcome = state.engine.process_turn(&mut conversation, text).await;

    let mut json = match serde_json::to_value(&outcome) {
        Ok(v) => v,
        Err(e) => return error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    json["session_id"] = serde_json::json!(id);
    json["quick_actions"] = serde_json::json!(quick_actions(outcome.step));
    Json(json).into_response()
}

/// POST /api/chat/sessions/{id}/reset
async fn reset_session(State(state): State<IntakeRouteState>, Path(raw): Path<String>) -> Response {
    let (id, session) = match find_session(&state, &raw).await {
        Ok(found) => found,
        Err(response) => return response,
    };
    let mut conversation = session.lock().await;
    state.engine.reset(&mut conversation);
    info!(session_id = %id, "Chat session reset");
    Json(serde_json::json!({
        "session_id": id,
        "step": conversation.step,
        "greeting": state.engine.greeting(),
        "quick_actions": quick_actions(conversation.step),
    }))
    .into_response()
}

/// GET /api/chat/sessions/{id}/lead
///
/// 422 until name and a valid email are collected.
async fn get_lead(State(state): State<IntakeRouteState>, Path(raw): Path<String>) -> Response {
    let (_, session) = match find_session(&state, &raw).await {
        Ok(found) => found,
        Err(response) => return response,
    };
    let conversation = session.lock().await;
    match LeadRecord::try_from(&conversation.fields) {
        Ok(lead) => Json(lead).into_response(),
        Err(e) => error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}
