//! Roster file loading.
//!
//! The roster is the CLI's stand-in for the external recipient and
//! organization directories: a JSON file mapping ids to display data.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use chalan_service::directory::StaticDirectory;
use chalan_types::{OrgId, RecipientId};

#[derive(Deserialize)]
struct RosterFile {
    #[serde(default)]
    recipients: HashMap<String, RosterRecipient>,
    #[serde(default)]
    organizations: HashMap<String, String>,
}

#[derive(Deserialize)]
struct RosterRecipient {
    name: String,
    #[serde(default)]
    roll_number: Option<String>,
}

/// Loads a roster file into a [`StaticDirectory`].
pub fn load(path: &Path) -> Result<StaticDirectory> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file {}", path.display()))?;
    let file: RosterFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse roster file {}", path.display()))?;

    let mut directory = StaticDirectory::new();
    for (id, recipient) in file.recipients {
        let id: RecipientId = id
            .parse()
            .with_context(|| format!("Invalid recipient ID in roster: {}", id))?;
        directory = directory.with_recipient(id, &recipient.name, recipient.roll_number.as_deref());
    }
    for (id, code) in file.organizations {
        let id: OrgId = id
            .parse()
            .with_context(|| format!("Invalid org ID in roster: {}", id))?;
        directory = directory.with_org(id, &code);
    }

    Ok(directory)
}
