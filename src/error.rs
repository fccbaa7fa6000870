use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::proxy::ProxyError;
use crate::store::StoreError;
use crate::upstream::UpstreamError;

pub const INTERACTION_ID_HEADER: &str = "x-interaction-id";

/// Error payload returned by every endpoint on failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Upstream unreachable: connection refused")]
    pub error: String,
    /// Present once the request was assigned an interaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Upstream {
        interaction_id: Uuid,
        error: UpstreamError,
    },
    /// The pending record for an already-identified request could not be written.
    Record {
        interaction_id: Uuid,
        error: StoreError,
    },
    Internal(String),
    Database(sqlx::Error),
    Store(StoreError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Upstream { error, .. } => write!(f, "Bad Gateway: {error}"),
            AppError::Record {
                interaction_id,
                error,
            } => write!(f, "Record Error for {interaction_id}: {error}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
            AppError::Store(err) => write!(f, "Store Error: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, interaction_id) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Upstream {
                interaction_id,
                error,
            } => (StatusCode::BAD_GATEWAY, error.to_string(), Some(*interaction_id)),
            AppError::Record {
                interaction_id,
                error,
            } => {
                tracing::error!(interaction_id = %interaction_id, "Failed to record interaction: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(*interaction_id),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Store(err) => {
                tracing::error!("Store error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: message,
            interaction_id,
        };
        let mut response = (status, axum::Json(body)).into_response();

        if let Some(id) = interaction_id {
            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                response.headers_mut().insert(INTERACTION_ID_HEADER, value);
            }
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Record {
                interaction_id,
                error,
            } => AppError::Record {
                interaction_id,
                error,
            },
            ProxyError::Upstream {
                interaction_id,
                error,
            } => AppError::Upstream {
                interaction_id,
                error,
            },
        }
    }
}
