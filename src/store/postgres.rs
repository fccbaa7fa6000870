use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Completion, InteractionStore, StoreError};
use crate::db;
use crate::models::{Interaction, InteractionStatus};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl InteractionStore for PgStore {
    async fn insert(&self, interaction: &Interaction) -> Result<(), StoreError> {
        db::interactions::insert(&self.pool, interaction)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StoreError::DuplicateId(interaction.id)
                }
                _ => map_err(e),
            })
    }

    async fn update_terminal(
        &self,
        id: Uuid,
        completion: &Completion,
    ) -> Result<Interaction, StoreError> {
        if completion.status == InteractionStatus::Pending {
            return Err(StoreError::InvalidTransition {
                id,
                from: InteractionStatus::Pending,
                to: InteractionStatus::Pending,
            });
        }

        let updated = db::interactions::complete_pending(
            &self.pool,
            id,
            completion.status,
            completion.response_payload.as_deref(),
            completion.error.as_deref(),
            completion.completed_at,
        )
        .await
        .map_err(map_err)?;

        if let Some(interaction) = updated {
            return Ok(interaction);
        }

        // Nothing pending under this id: tell a missing row from a finished one.
        match db::interactions::find_by_id(&self.pool, id)
            .await
            .map_err(map_err)?
        {
            Some(existing) => Err(StoreError::InvalidTransition {
                id,
                from: existing.status,
                to: completion.status,
            }),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Option<Interaction>, StoreError> {
        db::interactions::find_by_id(&self.pool, id)
            .await
            .map_err(map_err)
    }

    async fn list_by_consumer(
        &self,
        consumer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Interaction>, StoreError> {
        db::interactions::list_by_consumer(&self.pool, consumer_id, limit, offset)
            .await
            .map_err(map_err)
    }
}
