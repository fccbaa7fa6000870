use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::token::hash_token;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

/// The API consumer identified by the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthConsumer {
    pub consumer_id: Uuid,
    pub name: String,
}

impl FromRequestParts<SharedState> for AuthConsumer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let consumer = db::consumers::find_by_token_hash(&state.pool, &hash_token(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(AuthConsumer {
            consumer_id: consumer.id,
            name: consumer.name,
        })
    }
}
