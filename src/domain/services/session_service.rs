use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{
    models::{
        occurrence::{DateRange, Occurrence},
        session::{Session, SessionDraft, SessionPatch},
        session_exception::SessionException,
    },
    ports::{SessionExceptionRepository, SessionRepository},
    services::occurrences::{index_by_date, materialize, occurrences_in_range},
};
use crate::error::AppError;

/// Which sessions an occurrence query covers.
#[derive(Debug, Clone, Copy)]
pub enum SessionScope<'a> {
    All,
    One(&'a str),
}

/// Result of an occurrence query: base records when no range was given,
/// materialized occurrences otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OccurrenceListing {
    Sessions(Vec<Session>),
    Session(Session),
    Occurrences(Vec<Occurrence>),
}

pub struct SessionService {
    session_repo: Arc<dyn SessionRepository>,
    exception_repo: Arc<dyn SessionExceptionRepository>,
    max_range_days: i64,
}

impl SessionService {
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        exception_repo: Arc<dyn SessionExceptionRepository>,
        config: &Config,
    ) -> Self {
        Self { session_repo, exception_repo, max_range_days: config.max_query_range_days }
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        self.session_repo.list().await
    }

    pub async fn get_session(&self, id: &str) -> Result<Session, AppError> {
        self.session_repo.find_by_id(id).await?
            .ok_or(AppError::NotFound("Session not found".into()))
    }

    /// Session together with every exception recorded against it.
    pub async fn get_session_detail(&self, id: &str) -> Result<(Session, Vec<SessionException>), AppError> {
        let session = self.get_session(id).await?;
        let exceptions = self.exception_repo.list_by_session(id, None).await?;
        Ok((session, exceptions))
    }

    pub async fn list_occurrences(&self, scope: SessionScope<'_>, range: Option<DateRange>) -> Result<OccurrenceListing, AppError> {
        let Some(range) = range else {
            return match scope {
                SessionScope::All => Ok(OccurrenceListing::Sessions(self.list_sessions().await?)),
                SessionScope::One(id) => Ok(OccurrenceListing::Session(self.get_session(id).await?)),
            };
        };
        self.check_range(&range)?;

        match scope {
            SessionScope::One(id) => {
                let session = self.get_session(id).await?;
                let exceptions = index_by_date(self.exception_repo.list_by_session(id, Some(range)).await?);
                Ok(OccurrenceListing::Occurrences(occurrences_in_range(&session, &range, &exceptions)))
            }
            SessionScope::All => {
                let sessions = self.session_repo.list().await?;

                let mut by_session: HashMap<String, HashMap<NaiveDate, SessionException>> = HashMap::new();
                for exception in self.exception_repo.list_by_range(range).await? {
                    by_session
                        .entry(exception.session_id.clone())
                        .or_default()
                        .insert(exception.exception_date, exception);
                }

                let none = HashMap::new();
                let mut occurrences: Vec<Occurrence> = sessions
                    .iter()
                    .flat_map(|s| occurrences_in_range(s, &range, by_session.get(&s.id).unwrap_or(&none)))
                    .collect();
                occurrences.sort_by(|a, b| a.datetime.cmp(&b.datetime).then_with(|| a.session_id.cmp(&b.session_id)));

                debug!("Materialized {} occurrences across {} sessions", occurrences.len(), sessions.len());
                Ok(OccurrenceListing::Occurrences(occurrences))
            }
        }
    }

    /// The single occurrence addressed by a pattern date.
    pub async fn get_occurrence(&self, id: &str, date: NaiveDate) -> Result<Occurrence, AppError> {
        let session = self.get_session(id).await?;
        if !session.is_pattern_date(date) {
            return Err(AppError::NotFound(format!("Session has no occurrence on {}", date)));
        }

        let exceptions = index_by_date(self.exception_repo.find_by_date(id, date).await?.into_iter().collect());
        materialize(&session, &[date], &exceptions)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Occurrence on {} is cancelled", date)))
    }

    pub async fn list_exceptions(&self, id: &str, range: Option<DateRange>) -> Result<Vec<SessionException>, AppError> {
        self.get_session(id).await?;
        self.exception_repo.list_by_session(id, range).await
    }

    pub async fn create_session(&self, draft: SessionDraft) -> Result<Session, AppError> {
        let session = Session::new(draft)?;
        let created = self.session_repo.create(&session).await?;
        info!("Created {} session {}", created.kind.session_type(), created.id);
        Ok(created)
    }

    /// Rewrites the base record; every occurrence without an exception follows it.
    pub async fn update_session(&self, id: &str, patch: SessionPatch) -> Result<Session, AppError> {
        let current = self.get_session(id).await?;
        let updated = current.apply(patch)?;
        let saved = self.session_repo.update(&updated).await?;

        if current.is_recurring() && !saved.is_recurring() {
            info!("Session {} is now one-time, dropped its exceptions", id);
        }
        info!("Updated session {}", id);
        Ok(saved)
    }

    /// Deletes a session and its exceptions, returning the removed record.
    pub async fn delete_session(&self, id: &str) -> Result<Session, AppError> {
        let session = self.get_session(id).await?;
        self.session_repo.delete(id).await?;
        info!("Deleted session {}", id);
        Ok(session)
    }

    /// The repository checks `date` against the session as it stands inside
    /// the write transaction.
    pub async fn cancel_occurrence(&self, id: &str, date: NaiveDate) -> Result<SessionException, AppError> {
        let saved = self.exception_repo.upsert(&SessionException::cancellation(id.to_string(), date)).await?;
        info!("Cancelled occurrence of session {} on {}", id, date);
        Ok(saved)
    }

    pub async fn reschedule_occurrence(
        &self,
        id: &str,
        date: NaiveDate,
        new_datetime: DateTime<FixedOffset>,
    ) -> Result<SessionException, AppError> {
        let exception = SessionException::reschedule(id.to_string(), date, new_datetime.with_timezone(&Utc));
        let saved = self.exception_repo.upsert(&exception).await?;
        info!("Moved occurrence of session {} on {} to {}", id, date, new_datetime.to_rfc3339());
        Ok(saved)
    }

    /// Drops the exception for `date`, returning the occurrence to the base pattern.
    pub async fn restore_occurrence(&self, id: &str, date: NaiveDate) -> Result<(), AppError> {
        self.get_session(id).await?;
        self.exception_repo.delete(id, date).await?;
        info!("Restored occurrence of session {} on {}", id, date);
        Ok(())
    }

    fn check_range(&self, range: &DateRange) -> Result<(), AppError> {
        if range.num_days() > self.max_range_days {
            return Err(AppError::Validation(format!(
                "Date range spans {} days; at most {} are allowed.",
                range.num_days(),
                self.max_range_days
            )));
        }
        Ok(())
    }
}
