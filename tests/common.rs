use session_booking::{
    api::router::create_router,
    config::Config,
    infra::{
        factory::{run_sqlite_migrations, sqlite_pool},
        repositories::{
            sqlite_session_exception_repo::SqliteSessionExceptionRepo,
            sqlite_session_repo::SqliteSessionRepo,
        },
    },
    state::AppState,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_max_range_days(731).await
    }

    pub async fn with_max_range_days(max_query_range_days: i64) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let pool = sqlite_pool(&db_url, 5).await;
        run_sqlite_migrations(&pool).await;

        let config = Config {
            database_url: db_url,
            port: 0,
            max_query_range_days,
        };

        let state = Arc::new(AppState::new(
            &config,
            Arc::new(SqliteSessionRepo::new(pool.clone())),
            Arc::new(SqliteSessionExceptionRepo::new(pool.clone())),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body (`Null` when empty).
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    /// Creates a session and returns its id, panicking unless the API answers 201.
    pub async fn create_session(&self, payload: Value) -> String {
        let (status, body) = self.send("POST", "/api/v1/sessions", Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["id"].as_str().expect("No session id").to_string()
    }

    /// The weekly Monday 10:00 UTC session starting 2024-11-04.
    pub async fn create_monday_session(&self) -> String {
        self.create_session(serde_json::json!({
            "title": "Yoga Class",
            "description": "Weekly yoga",
            "session_type": "recurring",
            "recurrence_day": 0,
            "start_datetime": "2024-11-04T10:00:00Z",
            "duration_minutes": 60
        }))
        .await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
