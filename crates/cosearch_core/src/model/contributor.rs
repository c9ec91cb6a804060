//! Contributor domain model.
//!
//! # Invariants
//! - `local_handle` is globally unique and never empty.
//! - `display_name`, when set, is globally unique.
//! - Neither value may equal another contributor's handle or display name
//!   (enforced by `service::integrity`, not by this type).

use super::{empty_to_none, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Database-assigned contributor identifier.
pub type ContributorId = i64;

/// Stored contributor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub id: ContributorId,
    pub local_handle: String,
    pub display_name: Option<String>,
    pub discord_handle: Option<String>,
    pub github_account: Option<String>,
    pub discourse_account: Option<String>,
    pub wiki_account: Option<String>,
    pub website: Option<String>,
    /// Free-form string attributes, stored as a JSON object.
    pub extra_info: Option<BTreeMap<String, String>>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Create/update payload for contributors.
///
/// Update uses full replacement: every field of the stored record is
/// overwritten with the payload value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorUpsert {
    pub local_handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub discord_handle: Option<String>,
    #[serde(default)]
    pub github_account: Option<String>,
    #[serde(default)]
    pub discourse_account: Option<String>,
    #[serde(default)]
    pub wiki_account: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub extra_info: Option<BTreeMap<String, String>>,
}

impl ContributorUpsert {
    /// Creates a payload with only the required handle set.
    pub fn new(local_handle: impl Into<String>) -> Self {
        Self {
            local_handle: local_handle.into(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Applies write normalization and validates required fields.
    ///
    /// | field | rule |
    /// |---|---|
    /// | `local_handle` | must not be blank |
    /// | `display_name` | `""` → `None` |
    /// | `discord_handle` | `""` → `None` |
    /// | `github_account` | `""` → `None` |
    /// | `discourse_account` | `""` → `None` |
    /// | `wiki_account` | `""` → `None` |
    /// | `website` | `""` → `None` |
    pub fn normalize(self) -> Result<Self, ValidationError> {
        require_text("local_handle", &self.local_handle)?;
        Ok(Self {
            local_handle: self.local_handle,
            display_name: empty_to_none(self.display_name),
            discord_handle: empty_to_none(self.discord_handle),
            github_account: empty_to_none(self.github_account),
            discourse_account: empty_to_none(self.discourse_account),
            wiki_account: empty_to_none(self.wiki_account),
            website: empty_to_none(self.website),
            extra_info: self.extra_info,
        })
    }
}
