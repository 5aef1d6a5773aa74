use crate::domain::{models::session::{Session, SessionKind, SessionRow}, ports::SessionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresSessionRepo {
    pool: PgPool,
}

impl PostgresSessionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepo {
    async fn create(&self, session: &Session) -> Result<Session, AppError> {
        sqlx::query_as::<_, SessionRow>(
            r#"INSERT INTO sessions (id, title, description, session_type, recurrence_day, start_datetime, timezone, duration_minutes, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING *"#
        )
            .bind(&session.id)
            .bind(&session.title)
            .bind(&session.description)
            .bind(session.kind.session_type().as_str())
            .bind(session.kind.recurrence_day().map(i32::from))
            .bind(session.start_datetime)
            .bind(session.timezone.name())
            .bind(session.duration_minutes)
            .bind(session.created_at)
            .bind(session.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?
            .try_into()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE id = $1"
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .map(Session::try_from)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Session>, AppError> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions ORDER BY start_datetime ASC, id ASC"
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?
            .into_iter()
            .map(Session::try_from)
            .collect()
    }

    async fn update(&self, session: &Session) -> Result<Session, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let row = sqlx::query_as::<_, SessionRow>(
            r#"UPDATE sessions SET title=$1, description=$2, session_type=$3, recurrence_day=$4, start_datetime=$5, timezone=$6, duration_minutes=$7, updated_at=$8
               WHERE id=$9 RETURNING *"#
        )
            .bind(&session.title)
            .bind(&session.description)
            .bind(session.kind.session_type().as_str())
            .bind(session.kind.recurrence_day().map(i32::from))
            .bind(session.start_datetime)
            .bind(session.timezone.name())
            .bind(session.duration_minutes)
            .bind(session.updated_at)
            .bind(&session.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Session not found".into()))?;

        if session.kind == SessionKind::OneTime {
            sqlx::query("DELETE FROM session_exceptions WHERE session_id = $1")
                .bind(&session.id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        row.try_into()
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM session_exceptions WHERE session_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Session not found".into()));
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
