use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::extractor::AuthConsumer;
use crate::error::{AppError, ErrorBody, INTERACTION_ID_HEADER};
use crate::state::SharedState;

#[utoipa::path(
    post,
    path = "/api/v1/analyse",
    tag = "Analysis",
    summary = "Analyse a submission",
    description = "Forwards the payload to the analysis service and records the interaction. \
                   Successful and failed calls both carry an `x-interaction-id` header.",
    request_body(content = String, content_type = "application/json", description = "Analysis request, forwarded as-is apart from `task_id`/`user_id`"),
    responses(
        (status = 200, description = "Upstream analysis result, verbatim", body = String, content_type = "application/json"),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorBody),
        (status = 500, description = "Interaction could not be recorded; upstream not called", body = ErrorBody),
        (status = 502, description = "Upstream unreachable, timed out or rejected the request", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
pub async fn analyse(
    auth: AuthConsumer,
    State(state): State<SharedState>,
    body: String,
) -> Result<Response, AppError> {
    let proxy = state.proxy.clone();
    let consumer_id = auth.consumer_id;

    tracing::debug!(consumer = %auth.name, "Analyse request ({} bytes)", body.len());

    // Detached so a dropped connection still gets its terminal write.
    let outcome = tokio::spawn(async move { proxy.handle(consumer_id, body).await })
        .await
        .map_err(|e| AppError::Internal(format!("Proxy task failed: {e}")))??;

    let mut response = (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json")],
        outcome.response_payload,
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(&outcome.interaction_id.to_string()) {
        response.headers_mut().insert(INTERACTION_ID_HEADER, value);
    }

    Ok(response)
}
