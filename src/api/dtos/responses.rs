use crate::domain::models::{session::Session, session_exception::SessionException};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

#[derive(Serialize)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: Session,
    pub exceptions: Vec<SessionException>,
}

#[derive(Serialize)]
pub struct OccurrenceChangeResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_datetime: Option<DateTime<FixedOffset>>,
    pub exception: SessionException,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}
