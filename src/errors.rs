// Error types for the counter pipeline
// Every failure an invocation can hit is one of these variants and is
// rendered into the same JSON error body
//
// Numan Thabit 2025 Nov

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// Endpoint or credential missing; no store call was attempted.
    #[error("{message}")]
    Config { message: String },
    #[error("store connection error: {message}")]
    Connect { message: String, code: Option<u16> },
    #[error("store read failed: {message}")]
    StoreRead {
        message: String,
        code: Option<u16>,
        extra: Option<String>,
    },
    #[error("store write failed: {message}")]
    StoreWrite {
        message: String,
        code: Option<u16>,
        extra: Option<String>,
    },
}

impl CounterError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
            code: None,
        }
    }

    /// Backend-reported code, if the store gave one.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Config { .. } => None,
            Self::Connect { code, .. }
            | Self::StoreRead { code, .. }
            | Self::StoreWrite { code, .. } => *code,
        }
    }

    /// The store's own error message, when it returned one.
    pub fn extra(&self) -> Option<&str> {
        match self {
            Self::StoreRead { extra, .. } | Self::StoreWrite { extra, .. } => extra.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Connect { .. } => "connect",
            Self::StoreRead { .. } => "store_read",
            Self::StoreWrite { .. } => "store_write",
        }
    }
}
