use std::fmt::Display;
use std::time::Duration;

use rowport_common::AddressError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),

    #[error("invalid cell span `{span}`: {source}")]
    InvalidSpan {
        span: String,
        #[source]
        source: AddressError,
    },

    #[error("rate limited by grid store{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "csv")]
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(" (retry after {}ms)", delay.as_millis()),
        None => String::new(),
    }
}

impl StoreError {
    pub fn from_backend(backend: &str, err: impl Display) -> Self {
        StoreError::Backend {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }

    pub fn invalid_span(span: &str, source: AddressError) -> Self {
        StoreError::InvalidSpan {
            span: span.to_string(),
            source,
        }
    }

    /// Failures worth retrying. Only rate limiting qualifies.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::RateLimited { .. })
    }

    /// Server-provided wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StoreError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
