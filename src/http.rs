// Counter HTTP API
// Mounts the counter endpoint plus health and metrics endpoints
//
// Numan Thabit 2025 Nov

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::metrics;
use crate::service::CounterService;

#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    pub debug: Option<String>,
}

impl CountQuery {
    fn debug_enabled(&self) -> bool {
        self.debug.as_deref() == Some("1")
    }
}

/// Create the HTTP router with the counter endpoint
pub fn create_api_router(service: Arc<CounterService>) -> Router {
    Router::new()
        .route("/", any(count_visitor))
        .route("/api/countvisitor", any(count_visitor))
        .route("/health", get(health_check))
        .route("/metrics", get(export_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn count_visitor(
    State(service): State<Arc<CounterService>>,
    method: Method,
    headers: HeaderMap,
    query: Option<Query<CountQuery>>,
) -> Response {
    let debug = query.map(|Query(q)| q.debug_enabled()).unwrap_or(false);
    service.handle(&method, &headers, debug).await
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn export_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
