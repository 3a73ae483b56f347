// Request gate
// Resolves the CORS origin against a fixed allow-list and decides whether
// the request stops here (preflight, unsupported method) before any
// configuration or store work happens
//
// Numan Thabit 2025 Nov

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};

pub const DEFAULT_ORIGIN: &str = "https://resume.kaymacfoy.com";

pub const ALLOWED_ORIGINS: &[&str] = &[
    "https://resume.kaymacfoy.com",
    "https://kmreshtml.z13.web.core.windows.net",
];

#[derive(Debug, Clone)]
pub struct GateDecision {
    pub cors: HeaderMap,
    /// Set when the request must be answered without touching the store.
    pub short_circuit: Option<StatusCode>,
}

#[derive(Debug, Clone)]
pub struct RequestGate {
    allowed: Vec<String>,
    default_origin: String,
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(ALLOWED_ORIGINS.iter().copied(), DEFAULT_ORIGIN)
    }
}

impl RequestGate {
    pub fn new<'a>(allowed: impl IntoIterator<Item = &'a str>, default_origin: &str) -> Self {
        Self {
            allowed: allowed.into_iter().map(str::to_string).collect(),
            default_origin: default_origin.to_string(),
        }
    }

    /// Exact match only; anything else gets the default origin.
    pub fn resolve_origin<'a>(&'a self, origin: Option<&'a str>) -> &'a str {
        match origin {
            Some(o) if self.allowed.iter().any(|a| a == o) => o,
            _ => &self.default_origin,
        }
    }

    pub fn cors_headers(&self, headers: &HeaderMap) -> HeaderMap {
        let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
        let resolved = self.resolve_origin(origin);

        let mut cors = HeaderMap::new();
        cors.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Ok(value) = HeaderValue::from_str(resolved) {
            cors.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        cors.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        cors.insert(header::VARY, HeaderValue::from_static("Origin"));
        cors
    }

    pub fn admit(&self, method: &Method, headers: &HeaderMap) -> GateDecision {
        let cors = self.cors_headers(headers);
        let short_circuit = match *method {
            Method::OPTIONS => Some(StatusCode::NO_CONTENT),
            Method::GET | Method::HEAD => None,
            _ => Some(StatusCode::METHOD_NOT_ALLOWED),
        };
        GateDecision {
            cors,
            short_circuit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_origin(origin: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::ORIGIN, HeaderValue::from_str(origin).unwrap());
        h
    }

    fn allow_origin(cors: &HeaderMap) -> &str {
        cors.get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[test]
    fn echoes_allow_listed_origins() {
        let gate = RequestGate::default();
        for origin in ALLOWED_ORIGINS {
            let decision = gate.admit(&Method::GET, &with_origin(origin));
            assert_eq!(allow_origin(&decision.cors), *origin);
        }
    }

    #[test]
    fn unknown_or_absent_origin_falls_back_to_default() {
        let gate = RequestGate::default();
        for headers in [
            HeaderMap::new(),
            with_origin("https://evil.example"),
            with_origin("https://sub.resume.kaymacfoy.com"),
            with_origin("https://RESUME.kaymacfoy.com"),
            with_origin("https://resume.kaymacfoy.com/"),
        ] {
            let decision = gate.admit(&Method::GET, &headers);
            assert_eq!(allow_origin(&decision.cors), DEFAULT_ORIGIN);
        }
    }

    #[test]
    fn fixed_headers_are_always_present() {
        let cors = RequestGate::default().cors_headers(&HeaderMap::new());
        assert_eq!(cors.get(header::VARY).unwrap(), "Origin");
        assert_eq!(
            cors.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert_eq!(cors.get(header::CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn preflight_short_circuits_with_no_content() {
        let decision = RequestGate::default()
            .admit(&Method::OPTIONS, &HeaderMap::new());
        assert_eq!(decision.short_circuit, Some(StatusCode::NO_CONTENT));
    }

    #[test]
    fn get_proceeds_and_other_methods_are_rejected() {
        let gate = RequestGate::default();
        assert_eq!(
            gate.admit(&Method::GET, &HeaderMap::new()).short_circuit,
            None
        );
        assert_eq!(
            gate.admit(&Method::DELETE, &HeaderMap::new()).short_circuit,
            Some(StatusCode::METHOD_NOT_ALLOWED)
        );
    }
}
