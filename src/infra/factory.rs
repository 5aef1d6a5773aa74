use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::infra::repositories::{
    postgres_session_repo::PostgresSessionRepo,
    postgres_session_exception_repo::PostgresSessionExceptionRepo,
    sqlite_session_repo::SqliteSessionRepo,
    sqlite_session_exception_repo::SqliteSessionExceptionRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        AppState::new(
            config,
            Arc::new(PostgresSessionRepo::new(pool.clone())),
            Arc::new(PostgresSessionExceptionRepo::new(pool)),
        )
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let pool = sqlite_pool(database_url, 5).await;
        run_sqlite_migrations(&pool).await;

        AppState::new(
            config,
            Arc::new(SqliteSessionRepo::new(pool.clone())),
            Arc::new(SqliteSessionExceptionRepo::new(pool)),
        )
    }
}

/// SQLite pool with foreign keys enforced, so exceptions cascade with their session.
pub async fn sqlite_pool(database_url: &str, max_connections: u32) -> SqlitePool {
    let opts = SqliteConnectOptions::from_str(database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite")
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
