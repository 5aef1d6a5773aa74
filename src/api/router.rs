use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, session, occurrence};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Sessions
        .route("/api/v1/sessions", get(session::list_sessions).post(session::create_session))
        .route(
            "/api/v1/sessions/{session_id}",
            get(session::get_session)
                .patch(session::update_session)
                .put(session::update_session)
                .delete(session::delete_session),
        )

        // Occurrences & Exceptions
        .route("/api/v1/sessions/{session_id}/occurrences", get(occurrence::list_occurrences))
        .route(
            "/api/v1/sessions/{session_id}/occurrences/{date}",
            get(occurrence::get_occurrence)
                .patch(occurrence::update_occurrence)
                .delete(occurrence::cancel_occurrence),
        )
        .route("/api/v1/sessions/{session_id}/occurrences/{date}/restore", post(occurrence::restore_occurrence))
        .route("/api/v1/sessions/{session_id}/exceptions", get(occurrence::list_exceptions))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        session_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
