//! Tag domain model.

use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Database-assigned tag identifier.
pub type TagId = i64;

/// Stored tag record. `display_name` is globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub display_name: String,
    pub color: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create/update payload for tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpsert {
    pub display_name: String,
    pub color: String,
}

impl TagUpsert {
    pub fn new(display_name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            color: color.into(),
        }
    }

    /// Validates required fields; tags carry no optional fields to normalize.
    pub fn normalize(self) -> Result<Self, ValidationError> {
        require_text("display_name", &self.display_name)?;
        Ok(self)
    }
}
