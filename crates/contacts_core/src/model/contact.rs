//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record and its wire representation.
//! - Parse externally supplied identifiers into the store's native id type.
//!
//! # Invariants
//! - `id` is stable and never reused for another contact.
//! - Stored `email` values are trimmed and lower-cased.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a stored contact.
///
/// Serialized as the canonical hyphenated UUID string.
pub type ContactId = Uuid;

/// The five user-facing contact fields.
///
/// Serialized with camelCase keys to match the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub favorite_color: String,
    /// Kept exactly as accepted (trimmed), never reformatted.
    pub birthday: String,
}

/// Canonical stored contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: ContactId,
    #[serde(flatten)]
    pub fields: ContactFields,
}

impl Contact {
    /// Creates a contact with a freshly generated id.
    pub fn new(fields: ContactFields) -> Self {
        Self::with_id(Uuid::new_v4(), fields)
    }

    /// Creates a contact with a caller-provided id.
    pub fn with_id(id: ContactId, fields: ContactFields) -> Self {
        Self { id, fields }
    }
}

/// Raised when an id string does not have the store's native id shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidContactId(pub String);

impl Display for InvalidContactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid contact id `{}`", self.0)
    }
}

impl Error for InvalidContactId {}

/// Parses an id string received over the API.
///
/// Surrounding whitespace is not tolerated; the string must be a complete UUID.
pub fn parse_contact_id(raw: &str) -> Result<ContactId, InvalidContactId> {
    Uuid::parse_str(raw).map_err(|_| InvalidContactId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_contact_id, Contact, ContactFields};
    use serde_json::json;

    fn fields() -> ContactFields {
        ContactFields {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane.doe@example.com".to_string(),
            favorite_color: "blue".to_string(),
            birthday: "1995-03-12".to_string(),
        }
    }

    #[test]
    fn serializes_with_api_field_names() {
        let contact = Contact::with_id(
            parse_contact_id("66f0b8f3-d9c0-4a8a-b7d1-a2b3c4d5e6f7").unwrap(),
            fields(),
        );

        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": "66f0b8f3-d9c0-4a8a-b7d1-a2b3c4d5e6f7",
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane.doe@example.com",
                "favoriteColor": "blue",
                "birthday": "1995-03-12"
            })
        );
    }

    #[test]
    fn new_contacts_get_distinct_ids() {
        let first = Contact::new(fields());
        let second = Contact::new(fields());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn parse_contact_id_rejects_malformed_values() {
        for raw in ["", "abc", "66f0b8f3d9c0a8a7d1a2b3c4", " 66f0b8f3-d9c0-4a8a-b7d1-a2b3c4d5e6f7"] {
            assert!(parse_contact_id(raw).is_err(), "`{raw}` should be rejected");
        }
    }
}
