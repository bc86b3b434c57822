// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Export endpoint tests for GET /records/export

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use labtest_registry::{
    api::http_server::{create_app, AppState},
    storage::{KeyValueBackend, MemoryKeyValueStore, RecordStore},
    TestPayload,
};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

async fn setup_state() -> AppState {
    let backend = Arc::new(KeyValueBackend::new(
        Arc::new(MemoryKeyValueStore::new()),
        "tests",
    ));
    AppState::new(Arc::new(RecordStore::open(backend).await.unwrap()))
}

fn payload(value: serde_json::Value) -> TestPayload {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_export_cbc_example() {
    let state = setup_state().await;
    state
        .store
        .add(&payload(json!({
            "name": "CBC",
            "price": 50,
            "parameters": [{"name": "Hemoglobin", "unit": "g/dL", "normalRange": "13.8-17.2"}]
        })))
        .await
        .unwrap();
    let app = create_app(Arc::new(state));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/records/export")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"tests.csv\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Test Name,Price,Parameter,Unit,Normal Range",
            "\"CBC\",50,\"Hemoglobin\",\"g/dL\",\"13.8-17.2\"",
        ]
    );
}

#[tokio::test]
async fn test_export_one_row_per_parameter() {
    let state = setup_state().await;
    state
        .store
        .add(&payload(json!({
            "name": "Lipid \"Full\" Panel",
            "price": 12.5,
            "parameters": [
                {"name": "LDL", "unit": "mg/dL", "normalRange": "<100"},
                {"name": "HDL", "unit": "mg/dL", "normalRange": ">40"}
            ]
        })))
        .await
        .unwrap();
    let app = create_app(Arc::new(state));

    let request = Request::builder()
        .uri("/records/export")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();

    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("\"Lipid \"\"Full\"\" Panel\",12.5,\"LDL\""));
    assert!(rows[1].contains("\"HDL\""));
}

#[tokio::test]
async fn test_export_empty_store_is_header_only() {
    let app = create_app(Arc::new(setup_state().await));
    let request = Request::builder()
        .uri("/records/export")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap().trim_end(),
        "Test Name,Price,Parameter,Unit,Normal Range"
    );
}
