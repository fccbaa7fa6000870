//! Durable record of proxied interactions.
//!
//! The proxy only talks to [`InteractionStore`]; `postgres` backs it in
//! production and `memory` backs it where no database is available.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Interaction, InteractionStatus};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// The terminal state an interaction is moved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub status: InteractionStatus,
    pub response_payload: Option<String>,
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl Completion {
    pub fn succeeded(response_payload: String) -> Self {
        Self {
            status: InteractionStatus::Succeeded,
            response_payload: Some(response_payload),
            error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: InteractionStatus::Failed,
            response_payload: None,
            error: Some(error),
            completed_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Unavailable(String),
    DuplicateId(Uuid),
    NotFound(Uuid),
    InvalidTransition {
        id: Uuid,
        from: InteractionStatus,
        to: InteractionStatus,
    },
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
            StoreError::DuplicateId(id) => write!(f, "Interaction {id} already exists"),
            StoreError::NotFound(id) => write!(f, "Interaction {id} not found"),
            StoreError::InvalidTransition { id, from, to } => {
                write!(f, "Interaction {id} cannot move from {from} to {to}")
            }
            StoreError::Backend(msg) => write!(f, "Store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Persist a new interaction. Fails with `DuplicateId` if the id is taken.
    async fn insert(&self, interaction: &Interaction) -> Result<(), StoreError>;

    /// Move a pending interaction to its terminal state and return the stored row.
    async fn update_terminal(
        &self,
        id: Uuid,
        completion: &Completion,
    ) -> Result<Interaction, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Interaction>, StoreError>;

    /// Newest first.
    async fn list_by_consumer(
        &self,
        consumer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Interaction>, StoreError>;
}
