use std::cmp::max;
use std::collections::HashMap;

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::domain::models::occurrence::{DateRange, Occurrence};
use crate::domain::models::session::Session;
use crate::domain::models::session_exception::{ExceptionEffect, SessionException};

const DAYS_PER_WEEK: i64 = 7;

/// Dates `anchor + 7k` (k >= 0) that fall inside `range`, ascending.
///
/// Jumps straight to the first on-pattern date at or after
/// `max(anchor, range.start)` instead of scanning day by day.
pub fn weekly_dates(anchor: NaiveDate, range: &DateRange) -> Vec<NaiveDate> {
    if anchor >= range.end() {
        return Vec::new();
    }

    let from = max(anchor, range.start());
    let offset = (DAYS_PER_WEEK - (from - anchor).num_days() % DAYS_PER_WEEK) % DAYS_PER_WEEK;

    let mut dates = Vec::with_capacity(((range.end() - from).num_days() / DAYS_PER_WEEK + 1) as usize);
    let mut next = from.checked_add_days(Days::new(offset as u64));
    while let Some(current) = next.filter(|d| *d < range.end()) {
        dates.push(current);
        next = current.checked_add_days(Days::new(DAYS_PER_WEEK as u64));
    }
    dates
}

/// Pattern dates of `session` inside `range`. One-time sessions yield at most
/// their anchor date.
pub fn candidate_dates(session: &Session, range: &DateRange) -> Vec<NaiveDate> {
    let anchor = session.anchor_date();
    if session.is_recurring() {
        weekly_dates(anchor, range)
    } else if range.contains(anchor) {
        vec![anchor]
    } else {
        Vec::new()
    }
}

/// Wall-clock `time` on `date` in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap move forward by the length of the gap (one hour).
pub fn local_datetime(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => naive
            .checked_add_signed(Duration::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

pub fn index_by_date(exceptions: Vec<SessionException>) -> HashMap<NaiveDate, SessionException> {
    exceptions.into_iter().map(|e| (e.exception_date, e)).collect()
}

/// Applies exceptions to the generated dates of one session.
///
/// Cancelled dates are dropped, moved dates take the stored timestamp but keep
/// their position, and every other date gets the anchor's local time-of-day.
/// Title, description and duration always come from the live session.
pub fn materialize(
    session: &Session,
    dates: &[NaiveDate],
    exceptions: &HashMap<NaiveDate, SessionException>,
) -> Vec<Occurrence> {
    if !session.is_recurring() {
        return dates
            .iter()
            .filter_map(|&date| build_occurrence(session, date, session.local_start(), false, true))
            .collect();
    }

    let time_of_day = session.local_time();
    dates
        .iter()
        .filter_map(|&date| {
            let effect = exceptions.get(&date).map(SessionException::effect);
            match effect {
                Some(ExceptionEffect::Cancelled) => None,
                Some(ExceptionEffect::Moved(at)) => {
                    build_occurrence(session, date, at.with_timezone(&session.timezone), true, false)
                }
                Some(ExceptionEffect::None) | None => {
                    let start = local_datetime(session.timezone, date, time_of_day);
                    build_occurrence(session, date, start, false, false)
                }
            }
        })
        .collect()
}

pub fn occurrences_in_range(
    session: &Session,
    range: &DateRange,
    exceptions: &HashMap<NaiveDate, SessionException>,
) -> Vec<Occurrence> {
    materialize(session, &candidate_dates(session, range), exceptions)
}

fn build_occurrence(
    session: &Session,
    date: NaiveDate,
    start: DateTime<Tz>,
    is_modified: bool,
    is_base_session: bool,
) -> Option<Occurrence> {
    // Slots whose end is past the last representable instant are skipped.
    let end = start.checked_add_signed(Duration::minutes(session.duration_minutes as i64))?;
    Some(Occurrence {
        session_id: session.id.clone(),
        session_type: session.kind.session_type(),
        occurrence_date: date,
        datetime: start.fixed_offset(),
        end_datetime: end.fixed_offset(),
        title: session.title.clone(),
        description: session.description.clone(),
        duration_minutes: session.duration_minutes,
        is_modified,
        is_base_session,
    })
}
