use crate::domain::models::session::{SessionDraft, SessionPatch, SessionType};
use crate::error::AppError;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::Deserialize;
use std::str::FromStr;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    pub description: Option<String>,
    pub session_type: String,
    pub recurrence_day: Option<i64>,
    pub start_datetime: String,
    pub timezone: Option<String>,
    pub duration_minutes: Option<i32>,
}

impl CreateSessionRequest {
    pub fn into_draft(self) -> Result<SessionDraft, AppError> {
        Ok(SessionDraft {
            title: self.title,
            description: self.description,
            session_type: parse_session_type(&self.session_type)?,
            recurrence_day: self.recurrence_day.map(parse_recurrence_day).transpose()?,
            start_datetime: parse_datetime(&self.start_datetime, "start_datetime")?,
            timezone: self.timezone,
            duration_minutes: self.duration_minutes,
        })
    }
}

#[derive(Deserialize, Default)]
pub struct UpdateSessionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub session_type: Option<String>,
    pub recurrence_day: Option<i64>,
    pub start_datetime: Option<String>,
    pub timezone: Option<String>,
    pub duration_minutes: Option<i32>,
}

impl UpdateSessionRequest {
    pub fn into_patch(self) -> Result<SessionPatch, AppError> {
        Ok(SessionPatch {
            title: self.title,
            description: self.description,
            session_type: self.session_type.as_deref().map(parse_session_type).transpose()?,
            recurrence_day: self.recurrence_day.map(parse_recurrence_day).transpose()?,
            start_datetime: self.start_datetime
                .as_deref()
                .map(|s| parse_datetime(s, "start_datetime"))
                .transpose()?,
            timezone: self.timezone,
            duration_minutes: self.duration_minutes,
        })
    }
}

#[derive(Deserialize)]
pub struct OccurrenceUpdateRequest {
    pub new_datetime: Option<String>,
    #[serde(default)]
    pub cancel: bool,
}

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Calendar date in `YYYY-MM-DD` form, limited to years 1 through 9999.
pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    let invalid = || AppError::Validation(format!("Invalid {} '{}'. Use YYYY-MM-DD format.", field, value));
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(invalid());
    }
    Ok(date)
}

/// RFC 3339 timestamp with an explicit UTC offset; naive timestamps are rejected.
pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<FixedOffset>, AppError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| AppError::Validation(format!(
        "Invalid {} '{}'. Use ISO 8601 with a UTC offset (e.g. 2024-11-04T10:00:00Z).",
        field, value
    )))
}

fn parse_session_type(value: &str) -> Result<SessionType, AppError> {
    SessionType::from_str(value).map_err(|_| AppError::Validation(format!(
        "Invalid session_type '{}'. Expected 'one_time' or 'recurring'.",
        value
    )))
}

fn parse_recurrence_day(value: i64) -> Result<u8, AppError> {
    u8::try_from(value)
        .ok()
        .filter(|day| *day <= 6)
        .ok_or_else(|| AppError::Validation(format!(
            "Recurrence day must be between 0 (Monday) and 6 (Sunday), got {}.",
            value
        )))
}
