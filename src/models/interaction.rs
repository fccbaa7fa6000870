use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One proxied request and what came of it.
///
/// Created `pending` before the upstream call and moved to exactly one
/// terminal status afterwards. `completed_at` is set iff the status is terminal.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize, ToSchema)]
pub struct Interaction {
    pub id: Uuid,
    pub consumer_id: Uuid,
    #[schema(example = r#"{"query":"SELECT 1"}"#)]
    pub request_payload: String,
    /// Upstream body; null unless the status is `succeeded`.
    pub response_payload: Option<String>,
    pub error: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: InteractionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Interaction {
    /// A fresh pending record with a newly generated id.
    pub fn pending(consumer_id: Uuid, request_payload: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            consumer_id,
            request_payload,
            response_payload: None,
            error: None,
            status: InteractionStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    Pending,
    Succeeded,
    Failed,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Pending => "pending",
            InteractionStatus::Succeeded => "succeeded",
            InteractionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InteractionStatus::Pending)
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown interaction status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl TryFrom<String> for InteractionStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(InteractionStatus::Pending),
            "succeeded" => Ok(InteractionStatus::Succeeded),
            "failed" => Ok(InteractionStatus::Failed),
            _ => Err(UnknownStatus(value)),
        }
    }
}

