use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_TITLE_LEN: usize = 200;
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    OneTime,
    Recurring,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::OneTime => "one_time",
            SessionType::Recurring => "recurring",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_time" => Ok(SessionType::OneTime),
            "recurring" => Ok(SessionType::Recurring),
            other => Err(format!("unknown session type '{}'", other)),
        }
    }
}

/// Day index used on the wire and in storage: 0 = Monday .. 6 = Sunday.
pub fn weekday_from_index(day: u8) -> Option<Weekday> {
    match day {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_monday() as u8
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Whether a session happens once or every week on a fixed weekday.
///
/// The weekday only exists on the recurring variant, so a recurring session
/// without one (or a one-time session with one) cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    OneTime,
    Recurring { weekday: Weekday },
}

impl SessionKind {
    pub fn from_parts(session_type: SessionType, recurrence_day: Option<u8>) -> Result<Self, AppError> {
        match (session_type, recurrence_day) {
            (SessionType::OneTime, None) => Ok(SessionKind::OneTime),
            (SessionType::OneTime, Some(_)) => Err(AppError::Validation(
                "One-time sessions should not have a recurrence day.".into(),
            )),
            (SessionType::Recurring, None) => Err(AppError::Validation(
                "Recurrence day is required for recurring sessions.".into(),
            )),
            (SessionType::Recurring, Some(day)) => weekday_from_index(day)
                .map(|weekday| SessionKind::Recurring { weekday })
                .ok_or_else(|| AppError::Validation(format!(
                    "Recurrence day must be between 0 (Monday) and 6 (Sunday), got {}.",
                    day
                ))),
        }
    }

    pub fn session_type(&self) -> SessionType {
        match self {
            SessionKind::OneTime => SessionType::OneTime,
            SessionKind::Recurring { .. } => SessionType::Recurring,
        }
    }

    pub fn recurrence_day(&self) -> Option<u8> {
        match self {
            SessionKind::OneTime => None,
            SessionKind::Recurring { weekday } => Some(weekday_index(*weekday)),
        }
    }
}

impl Serialize for SessionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("session_type", &self.session_type())?;
        map.serialize_entry("recurrence_day", &self.recurrence_day())?;
        match self {
            SessionKind::OneTime => map.serialize_entry("recurrence_day_name", &None::<&str>)?,
            SessionKind::Recurring { weekday } => map.serialize_entry("recurrence_day_name", weekday_name(*weekday))?,
        }
        map.end()
    }
}

/// A stored session: the base pattern every occurrence is derived from.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: SessionKind,
    pub start_datetime: DateTime<Utc>,
    pub timezone: Tz,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a session.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub title: String,
    pub description: Option<String>,
    pub session_type: SessionType,
    pub recurrence_day: Option<u8>,
    pub start_datetime: DateTime<FixedOffset>,
    pub timezone: Option<String>,
    pub duration_minutes: Option<i32>,
}

/// Partial update of a session. Absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub session_type: Option<SessionType>,
    pub recurrence_day: Option<u8>,
    pub start_datetime: Option<DateTime<FixedOffset>>,
    pub timezone: Option<String>,
    pub duration_minutes: Option<i32>,
}

impl Session {
    pub fn new(draft: SessionDraft) -> Result<Self, AppError> {
        let now = Utc::now();
        let session = Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description.unwrap_or_default(),
            kind: SessionKind::from_parts(draft.session_type, draft.recurrence_day)?,
            start_datetime: draft.start_datetime.with_timezone(&Utc),
            timezone: parse_timezone(draft.timezone.as_deref().unwrap_or("UTC"))?,
            duration_minutes: draft.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            created_at: now,
            updated_at: now,
        };
        session.validate()?;
        Ok(session)
    }

    /// Returns the session with `patch` applied, re-checking every invariant
    /// against the combined old and new values.
    pub fn apply(&self, patch: SessionPatch) -> Result<Self, AppError> {
        let session_type = patch.session_type.unwrap_or(self.kind.session_type());
        let recurrence_day = match (session_type, patch.recurrence_day) {
            (_, Some(day)) => Some(day),
            (SessionType::Recurring, None) => self.kind.recurrence_day(),
            (SessionType::OneTime, None) => None,
        };

        let timezone = match patch.timezone.as_deref() {
            Some(name) => parse_timezone(name)?,
            None => self.timezone,
        };

        let updated = Self {
            id: self.id.clone(),
            title: patch.title.unwrap_or_else(|| self.title.clone()),
            description: patch.description.unwrap_or_else(|| self.description.clone()),
            kind: SessionKind::from_parts(session_type, recurrence_day)?,
            start_datetime: patch.start_datetime
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(self.start_datetime),
            timezone,
            duration_minutes: patch.duration_minutes.unwrap_or(self.duration_minutes),
            created_at: self.created_at,
            updated_at: Utc::now(),
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let title_len = self.title.trim().chars().count();
        if title_len == 0 {
            return Err(AppError::Validation("Title must not be empty.".into()));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!("Title must be at most {} characters.", MAX_TITLE_LEN)));
        }
        if self.duration_minutes < 1 {
            return Err(AppError::Validation("Duration must be at least 1 minute.".into()));
        }
        self.check_anchor_weekday().map_err(AppError::Validation)
    }

    fn check_anchor_weekday(&self) -> Result<(), String> {
        if let SessionKind::Recurring { weekday } = self.kind {
            let anchor_weekday = self.anchor_date().weekday();
            if anchor_weekday != weekday {
                return Err(format!(
                    "Start datetime must be on the specified recurrence day ({}), but {} is a {} in {}.",
                    weekday_name(weekday),
                    self.anchor_date(),
                    weekday_name(anchor_weekday),
                    self.timezone.name()
                ));
            }
        }
        Ok(())
    }

    pub fn local_start(&self) -> DateTime<Tz> {
        self.start_datetime.with_timezone(&self.timezone)
    }

    /// Date of the first occurrence, in the session's own timezone.
    pub fn anchor_date(&self) -> NaiveDate {
        self.local_start().date_naive()
    }

    pub fn local_time(&self) -> NaiveTime {
        self.local_start().time()
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self.kind, SessionKind::Recurring { .. })
    }

    /// Whether `date` is one of the dates the base pattern generates.
    pub fn is_pattern_date(&self, date: NaiveDate) -> bool {
        let anchor = self.anchor_date();
        match self.kind {
            SessionKind::OneTime => date == anchor,
            SessionKind::Recurring { .. } => date >= anchor && (date - anchor).num_days() % 7 == 0,
        }
    }

    /// Exceptions only address real pattern dates of a recurring session.
    pub fn check_exception_date(&self, date: NaiveDate) -> Result<(), AppError> {
        match self.kind {
            SessionKind::OneTime => Err(AppError::Validation(
                "Occurrences of a one-time session cannot be changed individually; update or delete the session instead.".into(),
            )),
            SessionKind::Recurring { weekday } => {
                if date.weekday() != weekday {
                    return Err(AppError::Validation(format!(
                        "The date {} does not fall on the recurrence day for this session ({}).",
                        date,
                        weekday_name(weekday)
                    )));
                }
                if date < self.anchor_date() {
                    return Err(AppError::Validation("Cannot modify occurrence before the session start date.".into()));
                }
                Ok(())
            }
        }
    }

    pub fn describe(&self) -> String {
        match self.kind {
            SessionKind::OneTime => format!("One time session \"{}\"", self.title),
            SessionKind::Recurring { .. } => format!("Recurring session \"{}\"", self.title),
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Unknown timezone '{}'.", name)))
}

/// Storage shape of a session, one column per field.
#[derive(Debug, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub session_type: String,
    pub recurrence_day: Option<i32>,
    pub start_datetime: DateTime<Utc>,
    pub timezone: String,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let integrity = |msg: String| AppError::DataIntegrity(format!("session {}: {}", row.id, msg));

        let session_type = SessionType::from_str(&row.session_type).map_err(integrity)?;
        let recurrence_day = row.recurrence_day
            .map(|day| u8::try_from(day).map_err(|_| integrity(format!("recurrence day {} out of range", day))))
            .transpose()?;
        let kind = SessionKind::from_parts(session_type, recurrence_day)
            .map_err(|e| integrity(e.to_string()))?;
        let timezone = row.timezone.parse::<Tz>()
            .map_err(|_| integrity(format!("unknown timezone '{}'", row.timezone)))?;

        let session = Session {
            id: row.id.clone(),
            title: row.title,
            description: row.description,
            kind,
            start_datetime: row.start_datetime,
            timezone,
            duration_minutes: row.duration_minutes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        session.check_anchor_weekday().map_err(integrity)?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn monday_draft() -> SessionDraft {
        SessionDraft {
            title: "Yoga".into(),
            description: None,
            session_type: SessionType::Recurring,
            recurrence_day: Some(0),
            start_datetime: FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 11, 4, 10, 0, 0).unwrap(),
            timezone: None,
            duration_minutes: None,
        }
    }

    #[test]
    fn test_recurring_requires_matching_weekday() {
        let session = Session::new(monday_draft()).unwrap();
        assert_eq!(session.kind, SessionKind::Recurring { weekday: Weekday::Mon });
        assert_eq!(session.duration_minutes, DEFAULT_DURATION_MINUTES);

        let mut tuesday = monday_draft();
        tuesday.recurrence_day = Some(1);
        assert!(matches!(Session::new(tuesday), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_kind_rejects_mismatched_fields() {
        assert!(SessionKind::from_parts(SessionType::Recurring, None).is_err());
        assert!(SessionKind::from_parts(SessionType::OneTime, Some(2)).is_err());
        assert!(SessionKind::from_parts(SessionType::Recurring, Some(7)).is_err());
        assert_eq!(SessionKind::from_parts(SessionType::OneTime, None).unwrap(), SessionKind::OneTime);
    }

    #[test]
    fn test_weekday_checked_in_session_timezone() {
        // 23:30 UTC on Sunday is already Monday in Berlin.
        let mut draft = monday_draft();
        draft.start_datetime = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 11, 3, 23, 30, 0).unwrap();
        draft.timezone = Some("Europe/Berlin".into());
        let session = Session::new(draft).unwrap();
        assert_eq!(session.anchor_date(), NaiveDate::from_ymd_opt(2024, 11, 4).unwrap());
    }

    #[test]
    fn test_patch_revalidates_weekday_against_new_anchor() {
        let session = Session::new(monday_draft()).unwrap();

        let moved_anchor = SessionPatch {
            start_datetime: Some(FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 11, 5, 10, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(matches!(session.apply(moved_anchor), Err(AppError::Validation(_))));

        let moved_both = SessionPatch {
            start_datetime: Some(FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 11, 5, 10, 0, 0).unwrap()),
            recurrence_day: Some(1),
            ..Default::default()
        };
        let updated = session.apply(moved_both).unwrap();
        assert_eq!(updated.kind, SessionKind::Recurring { weekday: Weekday::Tue });
        assert_eq!(updated.id, session.id);
    }

    #[test]
    fn test_patch_switches_type() {
        let session = Session::new(monday_draft()).unwrap();
        let one_time = session.apply(SessionPatch {
            session_type: Some(SessionType::OneTime),
            ..Default::default()
        }).unwrap();
        assert_eq!(one_time.kind, SessionKind::OneTime);

        let back = one_time.apply(SessionPatch {
            session_type: Some(SessionType::Recurring),
            ..Default::default()
        });
        assert!(matches!(back, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_pattern_dates() {
        let session = Session::new(monday_draft()).unwrap();
        let d = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        assert!(session.is_pattern_date(d(11, 4)));
        assert!(session.is_pattern_date(d(11, 25)));
        assert!(!session.is_pattern_date(d(10, 28)));
        assert!(!session.is_pattern_date(d(11, 26)));
    }

    #[test]
    fn test_exception_dates_follow_pattern() {
        let session = Session::new(monday_draft()).unwrap();
        let d = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        assert!(session.check_exception_date(d(11, 18)).is_ok());
        assert!(matches!(session.check_exception_date(d(11, 19)), Err(AppError::Validation(_))));
        assert!(matches!(session.check_exception_date(d(10, 28)), Err(AppError::Validation(_))));

        let one_time = session.apply(SessionPatch {
            session_type: Some(SessionType::OneTime),
            ..Default::default()
        }).unwrap();
        assert!(matches!(one_time.check_exception_date(d(11, 4)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_row_with_bad_type_is_integrity_fault() {
        let row = SessionRow {
            id: "s1".into(),
            title: "Broken".into(),
            description: String::new(),
            session_type: "monthly".into(),
            recurrence_day: None,
            start_datetime: Utc.with_ymd_and_hms(2024, 11, 4, 10, 0, 0).unwrap(),
            timezone: "UTC".into(),
            duration_minutes: 60,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(Session::try_from(row), Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_serializes_flat() {
        let session = Session::new(monday_draft()).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["session_type"], "recurring");
        assert_eq!(json["recurrence_day"], 0);
        assert_eq!(json["recurrence_day_name"], "Monday");
        assert_eq!(json["timezone"], "UTC");
    }
}
