use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::models::Interaction;
use crate::store::{Completion, InteractionStore, StoreError};
use crate::upstream::{UpstreamClient, UpstreamError};

/// Caller-identifying fields stripped from JSON payloads before they leave the proxy.
const REDACTED_FIELDS: &[&str] = &["task_id", "user_id"];

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub interaction_id: Uuid,
    pub response_payload: String,
}

#[derive(Debug)]
pub enum ProxyError {
    /// The pending record could not be written; upstream was never called.
    Record {
        interaction_id: Uuid,
        error: StoreError,
    },
    Upstream {
        interaction_id: Uuid,
        error: UpstreamError,
    },
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Record {
                interaction_id,
                error,
            } => write!(f, "Failed to record interaction {interaction_id}: {error}"),
            ProxyError::Upstream {
                interaction_id,
                error,
            } => write!(f, "Interaction {interaction_id} failed: {error}"),
        }
    }
}

impl std::error::Error for ProxyError {}

pub struct ProxyHandler {
    store: Arc<dyn InteractionStore>,
    upstream: UpstreamClient,
}

impl ProxyHandler {
    pub fn new(store: Arc<dyn InteractionStore>, upstream: UpstreamClient) -> Self {
        Self { store, upstream }
    }

    pub fn store(&self) -> &Arc<dyn InteractionStore> {
        &self.store
    }

    /// Forward one request upstream and record it.
    ///
    /// Performs exactly two store writes once the pending insert succeeds: the
    /// insert itself and the terminal update. A failed terminal update is logged
    /// and does not change what the caller gets back.
    pub async fn handle(
        &self,
        consumer_id: Uuid,
        request_payload: String,
    ) -> Result<Outcome, ProxyError> {
        let interaction = Interaction::pending(consumer_id, request_payload);
        let id = interaction.id;

        self.store
            .insert(&interaction)
            .await
            .map_err(|error| ProxyError::Record {
                interaction_id: id,
                error,
            })?;

        tracing::debug!(interaction_id = %id, consumer_id = %consumer_id, "Forwarding request upstream");

        let forwarded = redact(&interaction.request_payload);
        let result = self.upstream.analyse(&forwarded).await;

        let completion = match &result {
            Ok(body) => Completion::succeeded(body.clone()),
            Err(e) => Completion::failed(e.to_string()),
        };

        if let Err(e) = self.store.update_terminal(id, &completion).await {
            tracing::error!(interaction_id = %id, "Failed to record {} outcome: {e}", completion.status);
        }

        match result {
            Ok(response_payload) => {
                tracing::info!(interaction_id = %id, "Upstream succeeded");
                Ok(Outcome {
                    interaction_id: id,
                    response_payload,
                })
            }
            Err(error) => {
                tracing::warn!(interaction_id = %id, "Upstream failed: {error}");
                Err(ProxyError::Upstream {
                    interaction_id: id,
                    error,
                })
            }
        }
    }
}

/// Drop caller-identifying fields from a JSON object payload.
/// Anything that is not a JSON object is passed through untouched.
pub fn redact(payload: &str) -> Cow<'_, str> {
    let Ok(serde_json::Value::Object(mut fields)) = serde_json::from_str::<serde_json::Value>(payload) else {
        return Cow::Borrowed(payload);
    };

    let before = fields.len();
    for name in REDACTED_FIELDS {
        fields.remove(*name);
    }
    if fields.len() == before {
        return Cow::Borrowed(payload);
    }

    match serde_json::to_string(&fields) {
        Ok(redacted) => Cow::Owned(redacted),
        Err(_) => Cow::Borrowed(payload),
    }
}
