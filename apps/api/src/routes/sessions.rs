//! Session API handlers.
//!
//! Handlers stay thin: decode the request, call the engine, map the view to
//! JSON. The only orchestration here is wiring the countdown driver to the
//! status the engine reports back.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::document::{self, DocumentKind};
use crate::interview::engine::SessionView;
use crate::models::session::{InterviewSession, SessionStatus};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<InterviewSession>,
    pub total: usize,
}

/// POST /api/v1/sessions
/// Accepts a multipart form with one `file` part holding a PDF or DOCX
/// resume. Extracts its text and opens a session; when the resume already
/// carries full contact info the interview starts immediately and the
/// countdown begins.
pub async fn handle_create_session(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let mut upload: Option<(String, Option<String>, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(format!("Malformed multipart request: {err}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::Validation(format!("Failed to read upload: {err}")))?;
            upload = Some((filename, content_type, bytes));
        }
    }
    let Some((filename, content_type, bytes)) = upload else {
        return Err(AppError::Validation(
            "Missing file field in upload".to_string(),
        ));
    };
    debug!("Resume upload: {filename} ({} bytes)", bytes.len());

    let kind = DocumentKind::detect(&filename, content_type.as_deref())?;
    let text = document::extract_text(kind, &bytes)?;
    let view = state.engine.create_session(&text).await?;

    if view.session.status == SessionStatus::InProgress {
        state.timers.start(state.engine.clone(), view.session.id).await;
    }

    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsParams {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// GET /api/v1/sessions
/// Dashboard listing with an optional status filter and a candidate search
/// over name, email, and phone. Completed listings order by total score,
/// everything else by recency.
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    Query(params): Query<ListSessionsParams>,
) -> Result<Json<SessionList>, AppError> {
    let status = params.status.as_deref().map(parse_status).transpose()?;

    let mut sessions = state.engine.list_sessions().await;
    if let Some(status) = status {
        sessions.retain(|s| s.status == status);
    }
    if let Some(search) = params.search.as_deref() {
        let search = search.trim();
        if !search.is_empty() {
            sessions.retain(|s| matches_search(s, search));
        }
    }
    sort_sessions(&mut sessions, status);

    Ok(Json(SessionList {
        total: sessions.len(),
        sessions,
    }))
}

/// GET /api/v1/sessions/resumable
/// Sessions the welcome-back prompt can offer, most recent first.
pub async fn handle_resumable_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionList>, AppError> {
    let sessions = state.engine.resumable_sessions().await;
    Ok(Json(SessionList {
        total: sessions.len(),
        sessions,
    }))
}

/// GET /api/v1/sessions/:id
/// Full session detail with its chat transcript.
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.engine.session_view(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PostMessageBody {
    pub content: String,
}

/// POST /api/v1/sessions/:id/messages
/// One user chat turn: a contact field while collecting info, an answer
/// while a question is live.
pub async fn handle_post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PostMessageBody>,
) -> Result<Json<SessionView>, AppError> {
    let view = state.engine.handle_message(id, &body.content).await?;

    match view.session.status {
        SessionStatus::InProgress => state.timers.start(state.engine.clone(), id).await,
        SessionStatus::Completed => state.timers.cancel(id).await,
        _ => {}
    }

    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/pause
/// Freezes the countdown and parks the session.
pub async fn handle_pause_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state.engine.pause(id).await?;
    state.timers.cancel(id).await;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/resume
/// Reactivates a session; the countdown driver restarts when the session
/// comes back in progress.
pub async fn handle_resume_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state.engine.resume(id).await?;
    if view.session.status == SessionStatus::InProgress {
        state.timers.start(state.engine.clone(), id).await;
    }
    Ok(Json(view))
}

fn parse_status(raw: &str) -> Result<SessionStatus, AppError> {
    match raw {
        "not_started" => Ok(SessionStatus::NotStarted),
        "collecting_info" => Ok(SessionStatus::CollectingInfo),
        "in_progress" => Ok(SessionStatus::InProgress),
        "completed" => Ok(SessionStatus::Completed),
        "paused" => Ok(SessionStatus::Paused),
        other => Err(AppError::Validation(format!(
            "Unknown status filter: {other}"
        ))),
    }
}

/// Name and email match case-insensitively; phone matches as typed.
fn matches_search(session: &InterviewSession, search: &str) -> bool {
    let lower = search.to_lowercase();
    session.candidate.name.to_lowercase().contains(&lower)
        || session.candidate.email.to_lowercase().contains(&lower)
        || session.candidate.phone.contains(search)
}

fn sort_sessions(sessions: &mut [InterviewSession], status: Option<SessionStatus>) {
    if status == Some(SessionStatus::Completed) {
        sessions.sort_by(|a, b| {
            b.total_score
                .unwrap_or(0)
                .cmp(&a.total_score.unwrap_or(0))
        });
    } else {
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    }
}
