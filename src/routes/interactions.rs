use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::extractor::AuthConsumer;
use crate::error::{AppError, ErrorBody};
use crate::models::Interaction;
use crate::state::SharedState;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100.
    pub per_page: Option<i64>,
}

impl ListParams {
    /// Normalised (page, per_page, offset). Huge pages saturate instead of overflowing.
    pub fn window(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Serialize, ToSchema)]
pub struct InteractionPage {
    pub interactions: Vec<Interaction>,
    pub page: i64,
    pub per_page: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/interactions",
    tag = "Interactions",
    summary = "List own interactions",
    description = "The caller's interactions, newest first.",
    params(ListParams),
    responses(
        (status = 200, description = "One page of interactions", body = InteractionPage),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
pub async fn list(
    auth: AuthConsumer,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<InteractionPage>, AppError> {
    let (page, per_page, offset) = params.window();

    let interactions = state
        .proxy
        .store()
        .list_by_consumer(auth.consumer_id, per_page, offset)
        .await?;

    Ok(Json(InteractionPage {
        interactions,
        page,
        per_page,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/interactions/{id}",
    tag = "Interactions",
    summary = "Get one interaction",
    params(("id" = Uuid, Path, description = "Interaction id")),
    responses(
        (status = 200, description = "The stored interaction", body = Interaction),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorBody),
        (status = 404, description = "No such interaction for this consumer", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
pub async fn get(
    auth: AuthConsumer,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Interaction>, AppError> {
    let interaction = state
        .proxy
        .store()
        .find(id)
        .await?
        .filter(|i| i.consumer_id == auth.consumer_id)
        .ok_or_else(|| AppError::NotFound("Interaction not found".to_string()))?;

    Ok(Json(interaction))
}
