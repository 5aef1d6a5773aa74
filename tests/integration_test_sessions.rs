mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_and_fetch_session() {
    let app = TestApp::new().await;

    let (status, created) = app.send("POST", "/api/v1/sessions", Some(json!({
        "title": "Yoga Class",
        "description": "Weekly yoga",
        "session_type": "recurring",
        "recurrence_day": 0,
        "start_datetime": "2024-11-04T10:00:00Z"
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["session_type"], "recurring");
    assert_eq!(created["recurrence_day"], 0);
    assert_eq!(created["recurrence_day_name"], "Monday");
    assert_eq!(created["timezone"], "UTC");
    assert_eq!(created["duration_minutes"], 60);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app.get(&format!("/api/v1/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Yoga Class");
    assert_eq!(fetched["description"], "Weekly yoga");
    assert!(fetched["exceptions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_session_detail_lists_exceptions() {
    let app = TestApp::new().await;
    let id = app.create_monday_session().await;

    app.send("DELETE", &format!("/api/v1/sessions/{}/occurrences/2024-11-18", id), None).await;
    app.send(
        "PATCH",
        &format!("/api/v1/sessions/{}/occurrences/2024-11-11", id),
        Some(json!({ "new_datetime": "2024-11-11T12:00:00Z" })),
    ).await;

    let (status, body) = app.get(&format!("/api/v1/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let exceptions = body["exceptions"].as_array().unwrap();
    assert_eq!(exceptions.len(), 2);
    assert_eq!(exceptions[0]["exception_date"], "2024-11-11");
    assert_eq!(exceptions[0]["is_cancelled"], false);
    assert!(exceptions[0]["modified_datetime"].is_string());
    assert_eq!(exceptions[1]["exception_date"], "2024-11-18");
    assert_eq!(exceptions[1]["is_cancelled"], true);
    assert!(exceptions[1]["modified_datetime"].is_null());
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = TestApp::new().await;

    let cases = [
        // 2024-11-05 is a Tuesday
        json!({ "title": "Mismatch", "session_type": "recurring", "recurrence_day": 0, "start_datetime": "2024-11-05T10:00:00Z" }),
        json!({ "title": "No day", "session_type": "recurring", "start_datetime": "2024-11-04T10:00:00Z" }),
        json!({ "title": "Day on one-time", "session_type": "one_time", "recurrence_day": 0, "start_datetime": "2024-11-04T10:00:00Z" }),
        json!({ "title": "Bad day", "session_type": "recurring", "recurrence_day": 7, "start_datetime": "2024-11-04T10:00:00Z" }),
        json!({ "title": "Naive", "session_type": "one_time", "start_datetime": "2024-11-04T10:00:00" }),
        json!({ "title": "Bad type", "session_type": "monthly", "start_datetime": "2024-11-04T10:00:00Z" }),
        json!({ "title": "Bad zone", "session_type": "one_time", "start_datetime": "2024-11-04T10:00:00Z", "timezone": "Mars/Olympus" }),
        json!({ "title": "Zero", "session_type": "one_time", "start_datetime": "2024-11-04T10:00:00Z", "duration_minutes": 0 }),
        json!({ "title": "", "session_type": "one_time", "start_datetime": "2024-11-04T10:00:00Z" }),
        json!({ "title": "x".repeat(201), "session_type": "one_time", "start_datetime": "2024-11-04T10:00:00Z" }),
    ];

    for payload in cases {
        let (status, body) = app.send("POST", "/api/v1/sessions", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {} gave {}", payload, body);
        assert!(body["error"].is_string());
    }

    let (_, sessions) = app.get("/api/v1/sessions").await;
    assert!(sessions.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_revalidates_merged_session() {
    let app = TestApp::new().await;
    let id = app.create_monday_session().await;

    // Moving the anchor to a Tuesday without changing the day breaks the pattern
    let (status, _) = app.send(
        "PATCH",
        &format!("/api/v1/sessions/{}", id),
        Some(json!({ "start_datetime": "2024-11-05T10:00:00Z" })),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(
        "PATCH",
        &format!("/api/v1/sessions/{}", id),
        Some(json!({ "start_datetime": "2024-11-05T10:00:00Z", "recurrence_day": 1 })),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["recurrence_day_name"], "Tuesday");

    let (_, fetched) = app.get(&format!("/api/v1/sessions/{}", id)).await;
    assert_eq!(fetched["recurrence_day"], 1);
}

#[tokio::test]
async fn test_switch_to_one_time_drops_exceptions() {
    let app = TestApp::new().await;
    let id = app.create_monday_session().await;
    app.send("DELETE", &format!("/api/v1/sessions/{}/occurrences/2024-11-18", id), None).await;

    let (status, body) = app.send(
        "PUT",
        &format!("/api/v1/sessions/{}", id),
        Some(json!({ "session_type": "one_time" })),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["session_type"], "one_time");
    assert!(body["recurrence_day"].is_null());

    let (_, exceptions) = app.get(&format!("/api/v1/sessions/{}/exceptions", id)).await;
    assert!(exceptions.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_session_cascades() {
    let app = TestApp::new().await;
    let id = app.create_monday_session().await;
    app.send("DELETE", &format!("/api/v1/sessions/{}/occurrences/2024-11-18", id), None).await;

    let (status, body) = app.send("DELETE", &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
    assert_eq!(body["message"], "Recurring session \"Yoga Class\" has been deleted.");

    let (status, _) = app.get(&format!("/api/v1/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM session_exceptions WHERE session_id = ?")
        .bind(&id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(remaining.0, 0);

    let (status, _) = app.send("DELETE", &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_crud_is_not_found() {
    let app = TestApp::new().await;
    let uri = "/api/v1/sessions/does-not-exist";

    let (status, body) = app.get(uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Session not found");

    let (status, _) = app.send("PATCH", uri, Some(json!({ "title": "Renamed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_listed_by_start() {
    let app = TestApp::new().await;
    let later = app.create_session(json!({
        "title": "Later",
        "session_type": "one_time",
        "start_datetime": "2024-12-01T09:00:00Z"
    })).await;
    let earlier = app.create_monday_session().await;

    let (_, body) = app.get("/api/v1/sessions").await;
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![earlier.as_str(), later.as_str()]);
}
