use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{Completion, InteractionStore, StoreError};
use crate::models::{Interaction, InteractionStatus};

/// Interaction store held in process memory.
///
/// Each write takes the map entry lock for its id, so the pending check and the
/// update cannot interleave with another writer. Writes can be switched off to
/// simulate an unreachable database.
#[derive(Default)]
pub struct MemoryStore {
    rows: DashMap<Uuid, Interaction>,
    writes: AtomicUsize,
    reject_inserts: AtomicBool,
    reject_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful inserts and updates so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn set_reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl InteractionStore for MemoryStore {
    async fn insert(&self, interaction: &Interaction) -> Result<(), StoreError> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store rejecting inserts".into()));
        }

        match self.rows.entry(interaction.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(interaction.id)),
            Entry::Vacant(slot) => {
                slot.insert(interaction.clone());
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn update_terminal(
        &self,
        id: Uuid,
        completion: &Completion,
    ) -> Result<Interaction, StoreError> {
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store rejecting updates".into()));
        }

        let mut row = self.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if row.status != InteractionStatus::Pending || !completion.status.is_terminal() {
            return Err(StoreError::InvalidTransition {
                id,
                from: row.status,
                to: completion.status,
            });
        }

        row.status = completion.status;
        row.response_payload = completion.response_payload.clone();
        row.error = completion.error.clone();
        row.completed_at = Some(completion.completed_at);
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(row.value().clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Interaction>, StoreError> {
        Ok(self.rows.get(&id).map(|row| row.value().clone()))
    }

    async fn list_by_consumer(
        &self,
        consumer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Interaction>, StoreError> {
        let mut rows: Vec<Interaction> = self
            .rows
            .iter()
            .filter(|row| row.consumer_id == consumer_id)
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
