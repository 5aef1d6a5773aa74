use crate::domain::{
    models::{
        occurrence::DateRange,
        session::{Session, SessionRow},
        session_exception::SessionException,
    },
    ports::SessionExceptionRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::NaiveDate;

pub struct PostgresSessionExceptionRepo {
    pool: PgPool,
}

impl PostgresSessionExceptionRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl SessionExceptionRepository for PostgresSessionExceptionRepo {
    async fn upsert(&self, entity: &SessionException) -> Result<SessionException, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let session: Session = sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = $1 FOR SHARE")
            .bind(&entity.session_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Session not found".into()))?
            .try_into()?;
        session.check_exception_date(entity.exception_date)?;

        let saved = sqlx::query_as::<_, SessionException>(
            r#"INSERT INTO session_exceptions (id, session_id, exception_date, is_cancelled, modified_datetime, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT(session_id, exception_date) DO UPDATE SET
               is_cancelled=excluded.is_cancelled,
               modified_datetime=excluded.modified_datetime
               RETURNING *"#
        )
            .bind(&entity.id)
            .bind(&entity.session_id)
            .bind(entity.exception_date)
            .bind(entity.is_cancelled)
            .bind(entity.modified_datetime)
            .bind(entity.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(saved)
    }

    async fn find_by_date(&self, session_id: &str, date: NaiveDate) -> Result<Option<SessionException>, AppError> {
        sqlx::query_as::<_, SessionException>(
            "SELECT * FROM session_exceptions WHERE session_id = $1 AND exception_date = $2"
        )
            .bind(session_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_session(&self, session_id: &str, range: Option<DateRange>) -> Result<Vec<SessionException>, AppError> {
        match range {
            Some(range) => sqlx::query_as::<_, SessionException>(
                "SELECT * FROM session_exceptions WHERE session_id = $1 AND exception_date >= $2 AND exception_date < $3 ORDER BY exception_date ASC"
            )
                .bind(session_id)
                .bind(range.start())
                .bind(range.end())
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database),
            None => sqlx::query_as::<_, SessionException>(
                "SELECT * FROM session_exceptions WHERE session_id = $1 ORDER BY exception_date ASC"
            )
                .bind(session_id)
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database),
        }
    }

    async fn list_by_range(&self, range: DateRange) -> Result<Vec<SessionException>, AppError> {
        sqlx::query_as::<_, SessionException>(
            "SELECT * FROM session_exceptions WHERE exception_date >= $1 AND exception_date < $2 ORDER BY session_id, exception_date ASC"
        )
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, session_id: &str, date: NaiveDate) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM session_exceptions WHERE session_id = $1 AND exception_date = $2")
            .bind(session_id)
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No exception recorded for {}", date)));
        }
        Ok(())
    }
}
