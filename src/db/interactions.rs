use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Interaction, InteractionStatus};

pub async fn insert(pool: &PgPool, interaction: &Interaction) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO interactions
             (id, consumer_id, request_payload, response_payload, error, status, created_at, completed_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(interaction.id)
    .bind(interaction.consumer_id)
    .bind(&interaction.request_payload)
    .bind(&interaction.response_payload)
    .bind(&interaction.error)
    .bind(interaction.status.as_str())
    .bind(interaction.created_at)
    .bind(interaction.completed_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Move a pending interaction to a terminal status in one statement.
/// Returns `None` when no pending row with that id exists.
pub async fn complete_pending(
    pool: &PgPool,
    id: Uuid,
    status: InteractionStatus,
    response_payload: Option<&str>,
    error: Option<&str>,
    completed_at: DateTime<Utc>,
) -> Result<Option<Interaction>, sqlx::Error> {
    sqlx::query_as::<_, Interaction>(
        "UPDATE interactions
         SET status = $2, response_payload = $3, error = $4, completed_at = $5
         WHERE id = $1 AND status = 'pending'
         RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(response_payload)
    .bind(error)
    .bind(completed_at)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Interaction>, sqlx::Error> {
    sqlx::query_as::<_, Interaction>("SELECT * FROM interactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_consumer(
    pool: &PgPool,
    consumer_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Interaction>, sqlx::Error> {
    sqlx::query_as::<_, Interaction>(
        "SELECT * FROM interactions WHERE consumer_id = $1
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(consumer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
