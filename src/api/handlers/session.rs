use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{CreateSessionRequest, UpdateSessionRequest};
use crate::api::dtos::responses::{SessionDetailResponse, StatusResponse};
use crate::api::extractors::date_range::OptionalDateRange;
use crate::domain::services::session_service::SessionScope;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

/// Base sessions, or every session's occurrences when a range is given.
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    OptionalDateRange(range): OptionalDateRange,
) -> Result<impl IntoResponse, AppError> {
    let listing = state.session_service.list_occurrences(SessionScope::All, range).await?;
    Ok(Json(listing))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.session_service.create_session(payload.into_draft()?).await?;
    Span::current().record("session_id", created.id.as_str());
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let (session, exceptions) = state.session_service.get_session_detail(&session_id).await?;
    Ok(Json(SessionDetailResponse { session, exceptions }))
}

pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let updated = state.session_service.update_session(&session_id, payload.into_patch()?).await?;
    Ok(Json(updated))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let deleted = state.session_service.delete_session(&session_id).await?;
    Ok(Json(StatusResponse {
        status: "deleted",
        message: format!("{} has been deleted.", deleted.describe()),
    }))
}
