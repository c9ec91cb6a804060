//! HTTP error mapping.
//!
//! | error | status | body |
//! |---|---|---|
//! | `NotFound(what)` | 400 | `{"detail": "<what> cannot be found."}` |
//! | `Condition(c)` | 417 | `{"detail": c}` |
//! | `InvalidInput(m)` | 422 | `{"detail": m}` |
//! | body, path or query rejection | 422 | `{"detail": <rejection text>}` |
//! | anything else | 500 | `{"detail": "Internal Server Error"}` |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cosearch_core::{DbError, RepoError, ServiceError};
use log::error;
use serde_json::json;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Condition(String),
    InvalidInput(String),
    /// Logged with its message; clients only see a generic body.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            // The catalog has always answered missing references with 400.
            Self::NotFound(_) => StatusCode::BAD_REQUEST,
            Self::Condition(_) => StatusCode::EXPECTATION_FAILED,
            Self::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::NotFound(what) => format!("{what} cannot be found."),
            Self::Condition(condition) => condition.clone(),
            Self::InvalidInput(message) => message.clone(),
            Self::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal(message) => write!(f, "internal error: {message}"),
            other => f.write_str(&other.detail()),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound(what) => Self::NotFound(what),
            ServiceError::Condition(condition) => Self::Condition(condition),
            ServiceError::InvalidInput(message) => Self::InvalidInput(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        ServiceError::from(value).into()
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidInput(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::InvalidInput(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::InvalidInput(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(message) = &self {
            error!(
                "event=request_failed module=api status=error error={}",
                message
            );
        }
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
