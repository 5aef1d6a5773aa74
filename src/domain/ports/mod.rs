use crate::domain::models::{
    occurrence::DateRange, session::Session, session_exception::SessionException,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError>;
    async fn list(&self) -> Result<Vec<Session>, AppError>;
    /// Rewrites the base record. A session that is now one-time loses its
    /// exceptions in the same transaction.
    async fn update(&self, session: &Session) -> Result<Session, AppError>;
    /// Deletes the session together with its exceptions.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SessionExceptionRepository: Send + Sync {
    /// Inserts or replaces the exception for `(session_id, exception_date)`.
    /// The session is re-read in the same transaction: NotFound when it is
    /// gone, Validation when the date is not one of its pattern dates.
    async fn upsert(&self, exception: &SessionException) -> Result<SessionException, AppError>;
    async fn find_by_date(&self, session_id: &str, date: NaiveDate) -> Result<Option<SessionException>, AppError>;
    async fn list_by_session(&self, session_id: &str, range: Option<DateRange>) -> Result<Vec<SessionException>, AppError>;
    async fn list_by_range(&self, range: DateRange) -> Result<Vec<SessionException>, AppError>;
    async fn delete(&self, session_id: &str, date: NaiveDate) -> Result<(), AppError>;
}
