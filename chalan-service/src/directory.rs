//! Map-backed directory adapter.
//!
//! Stands in for the external recipient and organization lookup
//! services at the binary edge and in tests. Real deployments replace
//! this with adapters over the actual directory services.

use std::collections::HashMap;

use async_trait::async_trait;

use chalan_types::{OrgId, OrganizationDirectory, RecipientDirectory, RecipientId, RecipientProfile};

/// Directory resolving ids from in-memory maps.
#[derive(Default)]
pub struct StaticDirectory {
    recipients: HashMap<RecipientId, RecipientProfile>,
    orgs: HashMap<OrgId, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipient profile.
    pub fn with_recipient(mut self, id: RecipientId, name: &str, roll_number: Option<&str>) -> Self {
        self.recipients.insert(
            id,
            RecipientProfile {
                name: name.to_string(),
                roll_number: roll_number.map(str::to_string),
            },
        );
        self
    }

    /// Adds an organization code.
    pub fn with_org(mut self, id: OrgId, code: &str) -> Self {
        self.orgs.insert(id, code.to_string());
        self
    }
}

#[async_trait]
impl RecipientDirectory for StaticDirectory {
    async fn resolve(&self, id: RecipientId) -> Option<RecipientProfile> {
        self.recipients.get(&id).cloned()
    }
}

#[async_trait]
impl OrganizationDirectory for StaticDirectory {
    async fn resolve_code(&self, id: OrgId) -> Option<String> {
        self.orgs.get(&id).cloned()
    }
}
