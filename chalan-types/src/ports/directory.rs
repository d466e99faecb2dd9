//! Directory ports for recipient and organization lookups.
//!
//! Both directories are owned by external systems and are read-only
//! from this core's perspective. A failed lookup and a missing entry
//! are indistinguishable here: adapters map their transport errors to
//! `None` and callers substitute placeholders rather than aborting.

use serde::{Deserialize, Serialize};

use crate::domain::{OrgId, RecipientId};

/// Display metadata for a recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
}

/// Resolves recipient ids to display metadata.
#[async_trait::async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn resolve(&self, id: RecipientId) -> Option<RecipientProfile>;
}

/// Resolves organization ids to their short code used in voucher
/// numbers.
#[async_trait::async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn resolve_code(&self, id: OrgId) -> Option<String>;
}
