//! Integration tests for task endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::server::{TestServer, json_request};
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).expect("Failed to format timestamp")
}

async fn create_task(server: &TestServer, token: &str, body: Value) -> Value {
    let (status, created) =
        json_request(&server.router, "POST", "/tasks", Some(body), Some(token)).await;
    assert_eq!(status, StatusCode::CREATED);
    created
}

#[tokio::test]
async fn test_create_task_applies_defaults() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;

    let task = create_task(&server, &token, json!({ "title": "Groceries" })).await;

    assert_eq!(task["title"], "Groceries");
    assert_eq!(task["priority"], 3);
    assert_eq!(task["estimated_minutes"], 0);
    assert_eq!(task["is_completed"], false);
    assert!(task["description"].is_null());
    assert!(task["due_at"].is_null());
    assert_eq!(task["subtasks"], json!([]));
    assert!(task["id"].as_i64().expect("task id") > 0);
    assert!(task["created_at"].as_str().is_some());
    assert!(task["updated_at"].as_str().is_some());
}

#[tokio::test]
async fn test_create_task_with_all_fields() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let due = rfc3339(OffsetDateTime::now_utc() + Duration::days(3));

    let task = create_task(
        &server,
        &token,
        json!({
            "title": "  Write report  ",
            "description": "Quarterly numbers",
            "priority": 1,
            "estimated_minutes": 90,
            "due_at": due,
        }),
    )
    .await;

    // Title is trimmed on the way in
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["description"], "Quarterly numbers");
    assert_eq!(task["priority"], 1);
    assert_eq!(task["estimated_minutes"], 90);
    assert!(task["due_at"].as_str().is_some());
}

#[tokio::test]
async fn test_create_task_validation() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;

    for body in [
        json!({ "title": "   " }),
        json!({ "title": "x".repeat(256) }),
        json!({ "title": "ok", "priority": -1 }),
        json!({ "title": "ok", "estimated_minutes": -5 }),
    ] {
        let (status, resp) =
            json_request(&server.router, "POST", "/tasks", Some(body), Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["code"], "validation_error");
    }

    let (status, resp) = json_request(
        &server.router,
        "POST",
        "/tasks",
        Some(json!({ "title": "ok", "due_at": "tomorrow" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["code"], "bad_request");
}

#[tokio::test]
async fn test_get_task_includes_subtasks() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let task = create_task(&server, &token, json!({ "title": "Ship release" })).await;
    let task_id = task["id"].as_i64().expect("task id");

    for title in ["Tag", "Push"] {
        let (status, _body) = json_request(
            &server.router,
            "POST",
            &format!("/tasks/{task_id}/subtasks"),
            Some(json!({ "title": title })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = json_request(
        &server.router,
        "GET",
        &format!("/tasks/{task_id}"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Ship release");
    assert_eq!(body["subtasks"].as_array().expect("subtasks").len(), 2);
    assert_eq!(body["subtasks"][0]["title"], "Tag");
}

#[tokio::test]
async fn test_get_task_not_found() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;

    let (status, body) =
        json_request(&server.router, "GET", "/tasks/9999", None, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_cross_user_tasks_read_as_missing() {
    let server = TestServer::new().await;
    let alice = server.login("alice").await;
    let bob = server.login("bob").await;

    let task = create_task(&server, &alice, json!({ "title": "Private" })).await;
    let task_id = task["id"].as_i64().expect("task id");

    for (method, uri) in [
        ("GET", format!("/tasks/{task_id}")),
        ("PATCH", format!("/tasks/{task_id}")),
        ("DELETE", format!("/tasks/{task_id}")),
        ("POST", format!("/tasks/{task_id}/complete")),
        ("GET", format!("/tasks/{task_id}/subtasks")),
        ("POST", format!("/tasks/{task_id}/subtasks")),
    ] {
        let body = match method {
            "PATCH" => Some(json!({ "title": "Stolen" })),
            "POST" if uri.ends_with("/subtasks") => Some(json!({ "title": "Sneaky" })),
            _ => None,
        };
        let (status, resp) = json_request(&server.router, method, &uri, body, Some(&bob)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(resp["code"], "not_found", "{method} {uri}");
    }

    // Bob's listing does not leak Alice's tasks
    let (status, body) = json_request(&server.router, "GET", "/tasks", None, Some(&bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // Alice still owns an untouched task
    let (status, body) = json_request(
        &server.router,
        "GET",
        &format!("/tasks/{task_id}"),
        None,
        Some(&alice),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Private");
}

#[tokio::test]
async fn test_update_task_tri_state_fields() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let due = rfc3339(OffsetDateTime::now_utc() + Duration::days(3));
    let task = create_task(
        &server,
        &token,
        json!({ "title": "Report", "description": "Numbers", "priority": 2, "due_at": due }),
    )
    .await;
    let uri = format!("/tasks/{}", task["id"].as_i64().expect("task id"));

    // Nulls on title and priority are ignored; null clears description
    let (status, body) = json_request(
        &server.router,
        "PATCH",
        &uri,
        Some(json!({ "title": null, "priority": null, "description": null })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Report");
    assert_eq!(body["priority"], 2);
    assert!(body["description"].is_null());
    assert!(body["due_at"].as_str().is_some());

    // Null clears the due date; present fields overwrite
    let (status, body) = json_request(
        &server.router,
        "PATCH",
        &uri,
        Some(json!({ "due_at": null, "title": "Final report", "estimated_minutes": 45 })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Final report");
    assert_eq!(body["estimated_minutes"], 45);
    assert!(body["due_at"].is_null());
}

#[tokio::test]
async fn test_update_task_validation_leaves_row_untouched() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let task = create_task(&server, &token, json!({ "title": "Report", "priority": 2 })).await;
    let uri = format!("/tasks/{}", task["id"].as_i64().expect("task id"));

    let (status, body) = json_request(
        &server.router,
        "PATCH",
        &uri,
        Some(json!({ "title": "", "priority": 4 })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, body) = json_request(&server.router, "GET", &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Report");
    assert_eq!(body["priority"], 2);
}

#[tokio::test]
async fn test_list_tasks_filters_and_sorts() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;

    create_task(
        &server,
        &token,
        json!({ "title": "Write report", "priority": 1, "estimated_minutes": 60 }),
    )
    .await;
    create_task(
        &server,
        &token,
        json!({ "title": "Groceries", "description": "report receipts", "priority": 3, "estimated_minutes": 15 }),
    )
    .await;
    create_task(
        &server,
        &token,
        json!({ "title": "Mow lawn", "priority": 5, "estimated_minutes": 30 }),
    )
    .await;

    let (status, body) =
        json_request(&server.router, "GET", "/tasks?search=report", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 2);

    let (status, body) =
        json_request(&server.router, "GET", "/tasks?priority=5", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 1);
    assert_eq!(body[0]["title"], "Mow lawn");

    let (status, body) = json_request(
        &server.router,
        "GET",
        "/tasks?sort_by=estimated_minutes",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Groceries", "Mow lawn", "Write report"]);

    let (status, body) =
        json_request(&server.router, "GET", "/tasks?sort_by=priority", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Write report");
}

#[tokio::test]
async fn test_list_tasks_unknown_sort_key() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;

    let (status, body) =
        json_request(&server.router, "GET", "/tasks?sort_by=magic", None, Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_list_tasks_due_windows() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let now = OffsetDateTime::now_utc();

    create_task(
        &server,
        &token,
        json!({ "title": "Overdue", "due_at": rfc3339(now - Duration::days(1)) }),
    )
    .await;
    create_task(
        &server,
        &token,
        json!({ "title": "Next week", "due_at": rfc3339(now + Duration::days(7)) }),
    )
    .await;
    create_task(&server, &token, json!({ "title": "Unscheduled" })).await;

    // Zero-day window: only dated tasks due by now
    let (status, body) = json_request(
        &server.router,
        "GET",
        "/tasks?due_within_days=0",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Overdue"]);

    // A negative window is ignored rather than rejected
    let (status, body) = json_request(
        &server.router,
        "GET",
        "/tasks?due_within_days=-5",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 3);
}

#[tokio::test]
async fn test_complete_task_with_empty_body() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let task = create_task(&server, &token, json!({ "title": "Report" })).await;
    let task_id = task["id"].as_i64().expect("task id");

    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/tasks/{task_id}/complete"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], true);
}

#[tokio::test]
async fn test_complete_task_rejects_malformed_json() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let task = create_task(&server, &token, json!({ "title": "Report" })).await;
    let task_id = task["id"].as_i64().expect("task id");

    let request = Request::builder()
        .method("POST")
        .uri(format!("/tasks/{task_id}/complete"))
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from("{oops"))
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_task_cascade_both_directions() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let task = create_task(&server, &token, json!({ "title": "Ship release" })).await;
    let task_id = task["id"].as_i64().expect("task id");

    for title in ["Tag", "Push", "Announce"] {
        let (status, _body) = json_request(
            &server.router,
            "POST",
            &format!("/tasks/{task_id}/subtasks"),
            Some(json!({ "title": title })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Completing without cascade leaves subtasks alone
    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/tasks/{task_id}/complete"),
        Some(json!({})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], true);
    assert!(
        body["subtasks"]
            .as_array()
            .expect("subtasks")
            .iter()
            .all(|s| s["is_completed"] == false)
    );

    // Cascade forces every subtask to the task's new flag
    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/tasks/{task_id}/complete"),
        Some(json!({ "complete": true, "cascade": true })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["subtasks"]
            .as_array()
            .expect("subtasks")
            .iter()
            .all(|s| s["is_completed"] == true)
    );

    // And back down again
    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/tasks/{task_id}/complete"),
        Some(json!({ "complete": false, "cascade": true })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], false);
    assert!(
        body["subtasks"]
            .as_array()
            .expect("subtasks")
            .iter()
            .all(|s| s["is_completed"] == false)
    );
}

#[tokio::test]
async fn test_delete_task_cascades() {
    let server = TestServer::new().await;
    let token = server.login("alice").await;
    let task = create_task(&server, &token, json!({ "title": "Doomed" })).await;
    let task_id = task["id"].as_i64().expect("task id");

    let (status, subtask) = json_request(
        &server.router,
        "POST",
        &format!("/tasks/{task_id}/subtasks"),
        Some(json!({ "title": "Also doomed" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let subtask_id = subtask["id"].as_i64().expect("subtask id");

    let (status, body) = json_request(
        &server.router,
        "DELETE",
        &format!("/tasks/{task_id}"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _body) = json_request(
        &server.router,
        "GET",
        &format!("/tasks/{task_id}"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _body) = json_request(
        &server.router,
        "GET",
        &format!("/subtasks/{subtask_id}"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
