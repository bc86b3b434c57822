// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::{
    handlers::{parse_position, DeleteResponse, HealthResponse, SavedTestResponse},
    ApiError,
};
use crate::{records::LabTest, storage::RecordStore, validation::TestPayload};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub cors_allowed_origins: Vec<String>,
}

impl AppState {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_allowed_origins = origins;
        self
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_allowed_origins);

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Record collection
        .route("/records", get(list_handler).post(create_handler))
        // Spreadsheet download
        .route("/records/export", get(export_handler))
        // Single record by position
        .route("/records/:position", put(update_handler).delete(delete_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API until `shutdown` resolves, then close the store.
pub async fn start_server<F>(
    listen_addr: &str,
    state: AppState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = state.store.clone();
    let app = create_app(Arc::new(state));

    let addr = listen_addr.parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("🌐 API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    store.close().await;
    Ok(())
}

fn payload_from(body: Result<Json<TestPayload>, JsonRejection>) -> Result<TestPayload, ApiError> {
    body.map(|Json(payload)| payload).map_err(|rejection| {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        ApiError::InvalidData {
            field: "body".to_string(),
            message: rejection.body_text(),
        }
    })
}

fn position_from(raw: &str) -> Result<i64, ApiError> {
    parse_position(raw).ok_or_else(|| ApiError::TestNotFound {
        position: raw.to_string(),
    })
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = if state.store.is_closed() {
        "closed"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: crate::version::VERSION.to_string(),
        backend: state.store.backend_kind().to_string(),
        skipped_rows: state.store.stats().await.last_skipped_rows,
        checked_at: chrono::Utc::now(),
    })
}

async fn list_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<LabTest>>, ApiError> {
    let listing = state.store.list().await?;
    Ok(Json(listing.tests))
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TestPayload>, JsonRejection>,
) -> Result<Json<SavedTestResponse>, ApiError> {
    let payload = payload_from(body)?;
    let test = state.store.add(&payload).await?;
    Ok(Json(SavedTestResponse {
        success: true,
        test,
    }))
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(position): Path<String>,
    body: Result<Json<TestPayload>, JsonRejection>,
) -> Result<Json<SavedTestResponse>, ApiError> {
    let position = position_from(&position)?;
    let payload = payload_from(body)?;
    let test = state.store.update(position, &payload).await?;
    Ok(Json(SavedTestResponse {
        success: true,
        test,
    }))
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(position): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let position = position_from(&position)?;
    state.store.delete(position).await?;
    Ok(Json(DeleteResponse { success: true }))
}

async fn export_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let csv = state.store.export().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"tests.csv\""),
        ],
        csv,
    ))
}
