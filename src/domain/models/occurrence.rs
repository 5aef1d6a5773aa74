use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::domain::models::session::SessionType;
use crate::error::AppError;

/// Half-open calendar date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start >= end {
            return Err(AppError::Validation("Start date must be before end date.".into()));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// One bookable slot, computed from a session and its exceptions at read time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Occurrence {
    pub session_id: String,
    pub session_type: SessionType,
    /// Pattern date this occurrence belongs to, even when it was moved.
    pub occurrence_date: NaiveDate,
    pub datetime: DateTime<FixedOffset>,
    pub end_datetime: DateTime<FixedOffset>,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub is_modified: bool,
    pub is_base_session: bool,
}
