// Response builder
// Maps counter outcomes to HTTP responses. CORS headers are passed in already
// resolved so every response carries them, failures included
//
// Numan Thabit 2025 Nov

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::errors::CounterError;
use crate::metrics::RESPONSES;

pub const UNKNOWN_CODE: &str = "UNKNOWN";

#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<u64>,
    #[serde(rename = "_debug", skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Non-secret diagnostics returned for `?debug=1`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub has_endpoint: bool,
    pub has_key: bool,
    pub day: String,
    pub total_id: String,
    pub daily_id: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Status(u16),
    Name(&'static str),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl From<&CounterError> for ErrorBody {
    fn from(err: &CounterError) -> Self {
        Self {
            error: err.to_string(),
            code: err
                .code()
                .map(ErrorCode::Status)
                .unwrap_or(ErrorCode::Name(UNKNOWN_CODE)),
            extra: err.extra().map(str::to_string),
        }
    }
}

pub fn success(cors: HeaderMap, body: CountBody) -> Response {
    json_response(StatusCode::OK, cors, &body)
}

pub fn failure(cors: HeaderMap, err: &CounterError) -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        cors,
        &ErrorBody::from(err),
    )
}

pub fn method_not_allowed(cors: HeaderMap) -> Response {
    let body = ErrorBody {
        error: "method not allowed".to_string(),
        code: ErrorCode::Status(StatusCode::METHOD_NOT_ALLOWED.as_u16()),
        extra: None,
    };
    json_response(StatusCode::METHOD_NOT_ALLOWED, cors, &body)
}

/// Preflight answer: CORS headers, no body.
pub fn preflight(cors: HeaderMap) -> Response {
    record(StatusCode::NO_CONTENT);
    (StatusCode::NO_CONTENT, cors, Body::empty()).into_response()
}

fn json_response<T: Serialize>(status: StatusCode, cors: HeaderMap, body: &T) -> Response {
    // a body that fails to serialize still has to come back as JSON
    let bytes = serde_json::to_vec(body).unwrap_or_else(|e| {
        serde_json::to_vec(&serde_json::json!({
            "error": format!("encode response: {e}"),
            "code": UNKNOWN_CODE,
        }))
        .unwrap_or_default()
    });
    record(status);
    (status, cors, Body::from(bytes)).into_response()
}

fn record(status: StatusCode) {
    RESPONSES.with_label_values(&[status.as_str()]).inc();
}
