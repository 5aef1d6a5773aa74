use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-date override of a session, addressed by the original pattern date.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct SessionException {
    pub id: String,
    pub session_id: String,
    pub exception_date: NaiveDate,
    pub is_cancelled: bool,
    pub modified_datetime: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionEffect {
    Cancelled,
    Moved(DateTime<Utc>),
    /// Neither flag set; the occurrence follows the base session.
    None,
}

impl SessionException {
    pub fn cancellation(session_id: String, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            exception_date: date,
            is_cancelled: true,
            modified_datetime: None,
            created_at: Utc::now(),
        }
    }

    pub fn reschedule(session_id: String, date: NaiveDate, to: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            exception_date: date,
            is_cancelled: false,
            modified_datetime: Some(to),
            created_at: Utc::now(),
        }
    }

    /// Cancellation wins when a row carries both flags.
    pub fn effect(&self) -> ExceptionEffect {
        match (self.is_cancelled, self.modified_datetime) {
            (true, _) => ExceptionEffect::Cancelled,
            (false, Some(at)) => ExceptionEffect::Moved(at),
            (false, None) => ExceptionEffect::None,
        }
    }
}
