//! REST endpoints for wizard sessions and the agents they create.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use super::files::UploadedFile;
use super::form::FieldEdit;
use super::schema::Field;
use super::session::{SessionSnapshot, WizardSession, WizardSessions};
use super::templates::{UseCase, templates};
use crate::error::{StoreError, WizardError};
use crate::store::UpdateAgentRequest;

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub sessions: Arc<WizardSessions>,
    /// User whose agents are listed when no `user_id` is given.
    pub default_user_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenRequest {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JumpRequest {
    step: u8,
}

#[derive(Debug, Deserialize)]
struct FilesRequest {
    files: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct RemoveFileRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TemplateRequest {
    use_case: UseCase,
}

#[derive(Debug, Deserialize)]
struct ListAgentsQuery {
    user_id: Option<String>,
}

/// Build the wizard and agent REST routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/templates", get(list_templates))
        .route("/api/wizard", post(open_session))
        .route("/api/wizard/{id}", get(get_session).delete(cancel_session))
        .route("/api/wizard/{id}/fields", post(edit_field))
        .route("/api/wizard/{id}/next", post(next_step))
        .route("/api/wizard/{id}/previous", post(previous_step))
        .route("/api/wizard/{id}/jump", post(jump_step))
        .route("/api/wizard/{id}/files", post(select_files))
        .route("/api/wizard/{id}/files/remove", post(remove_file))
        .route("/api/wizard/{id}/template", post(apply_template))
        .route("/api/wizard/{id}/draft", post(save_draft))
        .route("/api/wizard/{id}/submit", post(submit))
        .route("/api/agents", get(list_agents))
        .route(
            "/api/agents/{id}",
            get(get_agent).patch(update_agent).delete(delete_agent),
        )
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

fn wizard_status(err: &WizardError) -> StatusCode {
    match err {
        WizardError::StepInvalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::InvalidStep(_) => StatusCode::BAD_REQUEST,
        WizardError::JumpAhead { .. }
        | WizardError::NotAtFinalStep { .. }
        | WizardError::Closed { .. } => StatusCode::CONFLICT,
        WizardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        WizardError::Draft(_) => StatusCode::INTERNAL_SERVER_ERROR,
        WizardError::Submission(e) => store_status(e),
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Constraint(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn wizard_error(err: WizardError, session: Option<SessionSnapshot>) -> Response {
    let status = wizard_status(&err);
    let mut body = serde_json::json!({ "error": err.to_string() });
    if let WizardError::StepInvalid { errors, .. } = &err {
        body["errors"] = serde_json::json!(errors);
    }
    if let Some(session) = session {
        body["session"] = serde_json::json!(session);
    }
    (status, Json(body)).into_response()
}

fn store_error(err: StoreError) -> Response {
    warn!(error = %err, "Agent store request failed");
    (
        store_status(&err),
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

async fn lookup(
    state: &WizardRouteState,
    id: Uuid,
) -> Result<Arc<Mutex<WizardSession>>, Response> {
    state.sessions.get(id).await.map_err(|e| wizard_error(e, None))
}

/// An edit body that did not decode as a `FieldEdit`. When the field name is
/// readable, the failure is recorded as that field's inline error.
fn edit_rejected(
    session: &mut WizardSession,
    field: Option<Field>,
    status: StatusCode,
    message: String,
) -> Response {
    let mut body = serde_json::json!({ "error": message });
    if let Some(field) = field {
        match session.reject_edit(field) {
            Ok(error) => body["errors"] = serde_json::json!([error]),
            Err(e) => return wizard_error(e, Some(session.snapshot())),
        }
    }
    body["session"] = serde_json::json!(session.snapshot());
    (status, Json(body)).into_response()
}

/// Snapshot on success, error plus snapshot on failure.
fn respond<T>(session: &mut WizardSession, result: Result<T, WizardError>) -> Response {
    match result {
        Ok(_) => Json(session.snapshot()).into_response(),
        Err(e) => wizard_error(e, Some(session.snapshot())),
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "agent-studio"
    }))
}

async fn list_templates() -> impl IntoResponse {
    Json(serde_json::json!(templates()))
}

// ── Wizard sessions ─────────────────────────────────────────────────────

async fn open_session(
    State(state): State<WizardRouteState>,
    body: Option<Json<OpenRequest>>,
) -> Response {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let session = state.sessions.open(body.user_id).await;
    let snapshot = session.lock().await.snapshot();
    (StatusCode::CREATED, Json(snapshot)).into_response()
}

async fn get_session(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let snapshot = session.lock().await.snapshot();
    Json(snapshot).into_response()
}

async fn cancel_session(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let response = {
        let mut session = session.lock().await;
        let result = session.cancel();
        respond(&mut session, result)
    };
    state.sessions.release_if_closed(id).await;
    response
}

async fn edit_field(
    State(state): State<WizardRouteState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            return edit_rejected(&mut session, None, rejection.status(), rejection.body_text());
        }
    };
    let edit = match FieldEdit::deserialize(&raw) {
        Ok(edit) => edit,
        Err(e) => {
            let field = raw.get("field").and_then(|f| Field::deserialize(f).ok());
            warn!(session_id = %id, error = %e, "Field edit could not be decoded");
            return edit_rejected(
                &mut session,
                field,
                StatusCode::UNPROCESSABLE_ENTITY,
                e.to_string(),
            );
        }
    };
    match session.edit(edit) {
        Ok(error) => Json(serde_json::json!({
            "field_error": error,
            "session": session.snapshot(),
        }))
        .into_response(),
        Err(e) => wizard_error(e, Some(session.snapshot())),
    }
}

async fn next_step(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    let result = session.next();
    respond(&mut session, result)
}

async fn previous_step(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    let result = session.previous();
    respond(&mut session, result)
}

async fn jump_step(
    State(state): State<WizardRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<JumpRequest>,
) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    let result = session.jump_to(body.step);
    respond(&mut session, result)
}

async fn select_files(
    State(state): State<WizardRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FilesRequest>,
) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    match session.select_files(body.files) {
        Ok(selection) => Json(serde_json::json!({
            "selection": selection,
            "session": session.snapshot(),
        }))
        .into_response(),
        Err(e) => wizard_error(e, Some(session.snapshot())),
    }
}

async fn remove_file(
    State(state): State<WizardRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RemoveFileRequest>,
) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    match session.remove_file(&body.name) {
        Ok(removed) => Json(serde_json::json!({
            "removed": removed,
            "session": session.snapshot(),
        }))
        .into_response(),
        Err(e) => wizard_error(e, Some(session.snapshot())),
    }
}

async fn apply_template(
    State(state): State<WizardRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TemplateRequest>,
) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    let result = session.apply_template(body.use_case);
    respond(&mut session, result)
}

async fn save_draft(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let mut session = session.lock().await;
    match session.save_draft().await {
        Ok(draft) => Json(serde_json::json!({
            "draft": draft,
            "session": session.snapshot(),
        }))
        .into_response(),
        Err(e) => wizard_error(e, Some(session.snapshot())),
    }
}

async fn submit(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    let session = match lookup(&state, id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    let response = {
        let mut session = session.lock().await;
        match session.submit().await {
            Ok(agent) => (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "agent": agent,
                    "session": session.snapshot(),
                })),
            )
                .into_response(),
            Err(e) => wizard_error(e, Some(session.snapshot())),
        }
    };
    state.sessions.release_if_closed(id).await;
    response
}

// ── Agents ──────────────────────────────────────────────────────────────

async fn list_agents(
    State(state): State<WizardRouteState>,
    Query(query): Query<ListAgentsQuery>,
) -> Response {
    let user_id = query.user_id.unwrap_or(state.default_user_id);
    match state.sessions.agents().list_agents(&user_id).await {
        Ok(agents) => Json(serde_json::json!(agents)).into_response(),
        Err(e) => store_error(e),
    }
}

async fn get_agent(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.agents().get_agent(id).await {
        Ok(Some(agent)) => Json(serde_json::json!(agent)).into_response(),
        Ok(None) => store_error(StoreError::NotFound {
            entity: "agent".into(),
            id: id.to_string(),
        }),
        Err(e) => store_error(e),
    }
}

async fn update_agent(
    State(state): State<WizardRouteState>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateAgentRequest>,
) -> Response {
    match state.sessions.agents().update_agent(id, &update).await {
        Ok(agent) => Json(serde_json::json!(agent)).into_response(),
        Err(e) => store_error(e),
    }
}

async fn delete_agent(State(state): State<WizardRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.agents().delete_agent(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => store_error(StoreError::NotFound {
            entity: "agent".into(),
            id: id.to_string(),
        }),
        Err(e) => store_error(e),
    }
}
