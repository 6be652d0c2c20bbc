//! End-to-end tests for the todo HTTP API.
//!
//! Each test spins up an Axum server on a random port backed by an
//! in-memory database, and exercises the real HTTP contract with a
//! reqwest client.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use todo_api::store::{LibSqlBackend, TodoStore};
use todo_api::todos::routes::todo_routes;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start a server on a random port, return its base URL.
async fn start_server() -> String {
    let store: Arc<dyn TodoStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let app = todo_routes(store);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{port}")
}

/// Helper: create a todo and return its representation.
async fn create_todo(client: &reqwest::Client, base: &str, title: &str) -> Value {
    let response = client
        .post(format!("{base}/todos"))
        .json(&json!({ "title": title }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn create_returns_full_representation() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let todo = create_todo(&client, &base, "x").await;
        assert!(todo["id"].is_i64());
        assert_eq!(todo["title"], "x");
        assert_eq!(todo["status"], "progress");
        assert!(todo["created_at"].is_string());
        assert!(todo["updated_at"].is_null());
        assert!(todo["deleted_at"].is_null());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn create_with_empty_body_lists_field_issues() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/todos"))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);

        let issues: Value = response.json().await.unwrap();
        let issues = issues.as_array().unwrap();
        assert!(!issues.is_empty());
        assert_eq!(issues[0]["field"], "title");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn read_missing_todo_returns_taxonomy_body() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{base}/todos/999"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "TODO_NOT_FOUND");
        assert_eq!(body["message"], "target Todo does not exist");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn patch_with_empty_title_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let todo = create_todo(&client, &base, "x").await;
        let response = client
            .patch(format!("{base}/todos/{}", todo["id"]))
            .json(&json!({ "title": "" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn list_rejects_unknown_status() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{base}/todos?status=bogus"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn delete_succeeds_once_then_is_not_found() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let todo = create_todo(&client, &base, "x").await;
        let url = format!("{base}/todos/{}", todo["id"]);

        let response = client.delete(&url).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.text().await.unwrap().is_empty());

        let response = client.delete(&url).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "TODO_NOT_FOUND");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn soft_deleted_rows_vanish_from_every_path() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let todo = create_todo(&client, &base, "ghost").await;
        let url = format!("{base}/todos/{}", todo["id"]);
        client.delete(&url).send().await.unwrap();

        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404);

        let todos: Value = client
            .get(format!("{base}/todos"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(todos.as_array().unwrap().is_empty());

        let todos: Value = client
            .get(format!("{base}/todos/search?title=ghost"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(todos.as_array().unwrap().is_empty());

        let response = client
            .patch(&url)
            .json(&json!({ "title": "revived" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn update_sets_updated_at_for_status_only_change() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let todo = create_todo(&client, &base, "x").await;
        let response = client
            .patch(format!("{base}/todos/{}", todo["id"]))
            .json(&json!({ "status": "done" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let updated: Value = response.json().await.unwrap();
        assert_eq!(updated["status"], "done");
        assert_eq!(updated["title"], "x");
        assert!(updated["updated_at"].is_string());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn list_and_search_order_newest_first_with_pagination() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        for title in ["a", "b", "c"] {
            create_todo(&client, &base, title).await;
        }

        let todos: Value = client
            .get(format!("{base}/todos"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let titles: Vec<&str> = todos
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["c", "b", "a"]);

        let page: Value = client
            .get(format!("{base}/todos/search?limit=1&offset=1"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let titles: Vec<&str> = page
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["b"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn search_combines_title_and_status() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let milk = create_todo(&client, &base, "Buy milk").await;
        create_todo(&client, &base, "Buy eggs").await;
        create_todo(&client, &base, "Walk dog").await;
        client
            .patch(format!("{base}/todos/{}", milk["id"]))
            .json(&json!({ "status": "done" }))
            .send()
            .await
            .unwrap();

        let todos: Value = client
            .get(format!("{base}/todos/search?title=Buy&status=done"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let todos = todos.as_array().unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0]["title"], "Buy milk");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unmatched_route_returns_empty_not_found() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let response = client.get(format!("{base}/nope")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
        assert!(response.text().await.unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}
