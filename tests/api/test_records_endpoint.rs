// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Record endpoint tests for /records
//!
//! These tests verify that:
//! - GET /records returns the stored sequence in order
//! - POST /records validates and appends
//! - PUT /records/:position replaces exactly one element
//! - DELETE /records/:position removes by position and rejects out-of-range
//!   or non-integer positions with 404
//! - Invalid bodies come back as 400 with the offending field
//! - Medium failures come back as 500 and leave the document untouched

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use labtest_registry::{
    api::http_server::{create_app, AppState},
    storage::{CsvFileBackend, RecordStore},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Helper: router over a fresh CSV document in a temp directory
async fn setup_app() -> (TempDir, Router) {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(CsvFileBackend::new(temp_dir.path().join("tests.csv")));
    let store = Arc::new(RecordStore::open(backend).await.unwrap());
    let app = create_app(Arc::new(AppState::new(store)));
    (temp_dir, app)
}

fn cbc() -> Value {
    json!({
        "name": "CBC",
        "price": 50,
        "parameters": [{"name": "Hemoglobin", "unit": "g/dL", "normalRange": "13.8-17.2"}]
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn names(app: &Router) -> Vec<String> {
    let (status, body) = send(app, Method::GET, "/records", None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}

async fn seed(app: &Router, names: &[&str]) {
    for name in names {
        let mut body = cbc();
        body["name"] = json!(name);
        let (status, _) = send(app, Method::POST, "/records", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[cfg(test)]
mod records_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_starts_empty() {
        let (_dir, app) = setup_app().await;
        let (status, body) = send(&app, Method::GET, "/records", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_add_returns_saved_test_and_lists_it() {
        let (_dir, app) = setup_app().await;

        let (status, body) = send(&app, Method::POST, "/records", Some(cbc())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["test"]["name"], "CBC");
        assert_eq!(body["test"]["parameters"][0]["normalRange"], "13.8-17.2");

        let (_, list) = send(&app, Method::GET, "/records", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0], body["test"]);
    }

    #[tokio::test]
    async fn test_add_rejects_missing_price() {
        let (_dir, app) = setup_app().await;
        let mut body = cbc();
        body.as_object_mut().unwrap().remove("price");

        let (status, error) = send(&app, Method::POST, "/records", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Invalid data");
        assert_eq!(error["field"], "price");
        assert!(names(&app).await.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_empty_parameters() {
        let (_dir, app) = setup_app().await;
        let mut body = cbc();
        body["parameters"] = json!([]);

        let (status, error) = send(&app, Method::POST, "/records", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["field"], "parameters");
    }

    #[tokio::test]
    async fn test_add_rejects_non_json_body() {
        let (_dir, app) = setup_app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/records")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error["field"], "body");
    }

    #[tokio::test]
    async fn test_update_replaces_only_target_position() {
        let (_dir, app) = setup_app().await;
        seed(&app, &["A", "B", "C"]).await;

        let mut body = cbc();
        body["name"] = json!("Lipid Panel");
        body["price"] = json!("75.5");
        let (status, saved) = send(&app, Method::PUT, "/records/1", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["test"]["price"], 75.5);

        assert_eq!(names(&app).await, vec!["A", "Lipid Panel", "C"]);
    }

    #[tokio::test]
    async fn test_update_out_of_range_is_not_found() {
        let (_dir, app) = setup_app().await;
        seed(&app, &["A"]).await;

        let (status, error) = send(&app, Method::PUT, "/records/1", Some(cbc())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "Test not found");
    }

    #[tokio::test]
    async fn test_delete_removes_position_and_shifts() {
        let (_dir, app) = setup_app().await;
        seed(&app, &["A", "B", "C"]).await;

        let (status, body) = send(&app, Method::DELETE, "/records/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        assert_eq!(names(&app).await, vec!["B", "C"]);
    }

    #[tokio::test]
    async fn test_delete_bad_positions_leave_store_unchanged() {
        let (_dir, app) = setup_app().await;
        seed(&app, &["A", "B"]).await;

        for uri in ["/records/-1", "/records/2", "/records/abc", "/records/1.5"] {
            let (status, error) = send(&app, Method::DELETE, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "uri {}", uri);
            assert_eq!(error["error"], "Test not found");
        }
        assert_eq!(names(&app).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_list_is_stable_without_mutation() {
        let (_dir, app) = setup_app().await;
        seed(&app, &["A", "B"]).await;

        let (_, first) = send(&app, Method::GET, "/records", None).await;
        let (_, second) = send(&app, Method::GET, "/records", None).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_rewrite_is_500_and_document_survives() {
        let (dir, app) = setup_app().await;
        seed(&app, &["A", "B"]).await;
        let path = dir.path().join("tests.csv");
        let before = std::fs::read(&path).unwrap();

        // Occupy the temp-file name used by the next rewrite
        let temp = dir
            .path()
            .join(format!("tests.csv.tmp.{}", std::process::id()));
        std::fs::create_dir(&temp).unwrap();
        std::fs::write(temp.join("occupied"), "x").unwrap();

        let (status, error) = send(&app, Method::DELETE, "/records/0", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["error"], "Internal error");
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(names(&app).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_unreadable_document_is_500() {
        let (dir, app) = setup_app().await;
        let path = dir.path().join("tests.csv");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let (status, error) = send(&app, Method::GET, "/records", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["error"], "Internal error");
    }
}
