use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{parse_date, parse_datetime, OccurrenceUpdateRequest};
use crate::api::dtos::responses::{OccurrenceChangeResponse, StatusResponse};
use crate::api::extractors::date_range::OptionalDateRange;
use crate::domain::services::session_service::SessionScope;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

pub async fn list_occurrences(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    OptionalDateRange(range): OptionalDateRange,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let listing = state.session_service.list_occurrences(SessionScope::One(&session_id), range).await?;
    Ok(Json(listing))
}

pub async fn get_occurrence(
    State(state): State<Arc<AppState>>,
    Path((session_id, date_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let date = parse_date(&date_str, "date")?;
    let occurrence = state.session_service.get_occurrence(&session_id, date).await?;
    Ok(Json(occurrence))
}

/// `{"new_datetime": ...}` moves the occurrence, `{"cancel": true}` cancels it.
pub async fn update_occurrence(
    State(state): State<Arc<AppState>>,
    Path((session_id, date_str)): Path<(String, String)>,
    Json(payload): Json<OccurrenceUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let date = parse_date(&date_str, "date")?;

    if payload.cancel {
        let exception = state.session_service.cancel_occurrence(&session_id, date).await?;
        return Ok(Json(OccurrenceChangeResponse {
            message: format!("Occurrence on {} has been cancelled.", date),
            new_datetime: None,
            exception,
        }));
    }

    let raw = payload.new_datetime
        .ok_or(AppError::Validation("Provide either new_datetime or cancel.".into()))?;
    let new_datetime = parse_datetime(&raw, "new_datetime")?;

    let exception = state.session_service.reschedule_occurrence(&session_id, date, new_datetime).await?;
    Ok(Json(OccurrenceChangeResponse {
        message: format!("Occurrence on {} has been moved to {}.", date, new_datetime.to_rfc3339()),
        new_datetime: Some(new_datetime),
        exception,
    }))
}

pub async fn cancel_occurrence(
    State(state): State<Arc<AppState>>,
    Path((session_id, date_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let date = parse_date(&date_str, "date")?;
    let exception = state.session_service.cancel_occurrence(&session_id, date).await?;
    Ok(Json(OccurrenceChangeResponse {
        message: format!("Occurrence on {} has been cancelled.", date),
        new_datetime: None,
        exception,
    }))
}

pub async fn restore_occurrence(
    State(state): State<Arc<AppState>>,
    Path((session_id, date_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let date = parse_date(&date_str, "date")?;
    state.session_service.restore_occurrence(&session_id, date).await?;
    Ok(Json(StatusResponse {
        status: "restored",
        message: format!("Occurrence on {} follows the session schedule again.", date),
    }))
}

pub async fn list_exceptions(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    OptionalDateRange(range): OptionalDateRange,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let exceptions = state.session_service.list_exceptions(&session_id, range).await?;
    Ok(Json(exceptions))
}
