//! Space Data Structures
//!
//! A space is the top-level named collection of nodes owned by a user.
//! Nodes reference their space by identifier; a space never physically
//! contains its nodes, so deleting one must cascade through the record and
//! blob stores (see `services::CascadeDeleter`).

use crate::models::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner recorded when a request carries no authenticated identity
pub const ANONYMOUS_OWNER: &str = "ANONYMOUS_USER";

/// Top-level named collection of nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// Globally unique identifier
    pub space_id: String,

    /// Display name, required non-empty
    pub name: String,

    /// Optional free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Owner identity; defaults to the anonymous sentinel
    pub owner_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Space {
    /// Create a new space with an auto-generated UUID
    pub fn new(name: String, description: Option<String>, owner_id: Option<String>) -> Self {
        let now = Utc::now();

        Self {
            space_id: Uuid::new_v4().to_string(),
            name,
            description,
            owner_id: owner_id.unwrap_or_else(|| ANONYMOUS_OWNER.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate structural invariants
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.space_id.is_empty() {
            return Err(ValidationError::MissingField("spaceId".to_string()));
        }

        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }

        Ok(())
    }
}

/// Sparse space update (name and/or description).
///
/// `description` follows the double-Option pattern used by `NodeUpdate`:
/// `None` leaves it alone, `Some(None)` clears it, `Some(Some(d))` sets it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::node::deserialize_optional_field"
    )]
    pub description: Option<Option<String>>,
}

impl SpaceUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Check if the update contains any changes
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_creation() {
        let space = Space::new("Study".to_string(), None, None);

        assert!(!space.space_id.is_empty());
        assert_eq!(space.name, "Study");
        assert_eq!(space.owner_id, ANONYMOUS_OWNER);
        assert!(space.validate().is_ok());
    }

    #[test]
    fn test_space_with_owner() {
        let space = Space::new(
            "Work".to_string(),
            Some("projects".to_string()),
            Some("user-7".to_string()),
        );
        assert_eq!(space.owner_id, "user-7");
        assert_eq!(space.description.as_deref(), Some("projects"));
    }

    #[test]
    fn test_space_validation_rejects_blank_name() {
        let space = Space::new("  ".to_string(), None, None);
        assert!(space.validate().is_err());
    }

    #[test]
    fn test_space_update_builder() {
        let update = SpaceUpdate::new().with_name("Renamed".to_string());
        assert!(!update.is_empty());
        assert!(SpaceUpdate::new().is_empty());
    }

    #[test]
    fn test_space_update_double_option_from_json() {
        // null means "clear the description", not "leave it alone"
        let update: SpaceUpdate =
            serde_json::from_str(r#"{"description": null, "name": "n"}"#).unwrap();
        assert_eq!(update.description, Some(None));

        // absent means "leave it alone"
        let update: SpaceUpdate = serde_json::from_str(r#"{"name": "n"}"#).unwrap();
        assert_eq!(update.description, None);

        // a value means "set it"
        let update: SpaceUpdate = serde_json::from_str(r#"{"description": "d"}"#).unwrap();
        assert_eq!(update.description, Some(Some("d".to_string())));
    }

    #[test]
    fn test_space_serialization_uses_camel_case() {
        let space = Space::new("S".to_string(), None, None);
        let json = serde_json::to_value(&space).unwrap();

        assert_eq!(json["spaceId"], space.space_id);
        assert_eq!(json["ownerId"], ANONYMOUS_OWNER);
        assert!(json.get("description").is_none());
    }
}
