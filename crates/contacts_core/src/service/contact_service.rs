//! Contact use-case service.
//!
//! # Responsibility
//! - Provide the list/get/create/replace/delete use-cases.
//! - Compose validation, optional caller ids and the duplicate-email guard.
//!
//! # Invariants
//! - Raw payloads only enter the store through `validate_contact`.
//! - Replace is a full overwrite; every field must be present.
//! - Email uniqueness is checked before insert and enforced again by the
//!   store's unique index, so racing creates still yield a conflict.

use crate::db::DbError;
use crate::model::contact::{Contact, ContactId, InvalidContactId};
use crate::repo::contact_repo::{ContactRepository, RepoError};
use crate::validation::{validate_contact, ContactValidationError, ValidContact};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Payload key for an optional caller-supplied id on create.
pub const REQUESTED_ID_KEY: &str = "_id";

/// Which uniqueness rule a write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Email,
    Id,
}

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// Payload failed field validation.
    Validation(ContactValidationError),
    /// Path/query id is not a well-formed contact id.
    InvalidId(InvalidContactId),
    /// Caller-supplied `_id` on create is not a well-formed contact id.
    InvalidRequestedId(String),
    NotFound(ContactId),
    Conflict(ConflictKind),
    /// Persistence-layer failure.
    Store(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidId(err) => write!(f, "{err}"),
            Self::InvalidRequestedId(value) => write!(f, "invalid requested id `{value}`"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::Conflict(ConflictKind::Email) => write!(f, "contact email already in use"),
            Self::Conflict(ConflictKind::Id) => write!(f, "contact id already in use"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidId(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateEmail(_) => Self::Conflict(ConflictKind::Email),
            RepoError::DuplicateId(_) => Self::Conflict(ConflictKind::Id),
            other => Self::Store(other),
        }
    }
}

impl From<DbError> for ContactServiceError {
    fn from(value: DbError) -> Self {
        Self::Store(RepoError::Db(value))
    }
}

impl From<ContactValidationError> for ContactServiceError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<InvalidContactId> for ContactServiceError {
    fn from(value: InvalidContactId) -> Self {
        Self::InvalidId(value)
    }
}

pub type ServiceResult<T> = Result<T, ContactServiceError>;

/// Contact service facade over repository implementations.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every stored contact.
    pub fn list(&self) -> ServiceResult<Vec<Contact>> {
        Ok(self.repo.list_contacts()?)
    }

    /// Gets one contact by id.
    pub fn get(&self, id: ContactId) -> ServiceResult<Contact> {
        self.repo
            .get_contact(id)?
            .ok_or(ContactServiceError::NotFound(id))
    }

    /// Creates a contact from validated fields.
    ///
    /// # Contract
    /// - Uses `requested_id` when given, otherwise generates a new id.
    /// - Returns `Conflict(Email)` when the email is already stored.
    /// - Returns `Conflict(Id)` when the requested id is already stored.
    pub fn create(
        &self,
        contact: ValidContact,
        requested_id: Option<ContactId>,
    ) -> ServiceResult<ContactId> {
        if self.repo.find_by_email(&contact.fields().email)?.is_some() {
            return Err(ContactServiceError::Conflict(ConflictKind::Email));
        }

        let fields = contact.into_fields();
        let record = match requested_id {
            Some(id) => Contact::with_id(id, fields),
            None => Contact::new(fields),
        };
        Ok(self.repo.insert_contact(&record)?)
    }

    /// Validates a raw create payload and creates the contact.
    ///
    /// Field validation runs before the optional `_id` is inspected.
    pub fn create_from_payload(&self, payload: &Value) -> ServiceResult<ContactId> {
        let contact = validate_contact(payload)?;
        let requested_id = requested_id(payload)?;
        self.create(contact, requested_id)
    }

    /// Overwrites all fields of an existing contact.
    pub fn replace(&self, id: ContactId, contact: ValidContact) -> ServiceResult<()> {
        Ok(self.repo.replace_contact(id, contact.fields())?)
    }

    /// Validates a raw replace payload and overwrites the contact.
    pub fn replace_from_payload(&self, id: ContactId, payload: &Value) -> ServiceResult<()> {
        let contact = validate_contact(payload)?;
        self.replace(id, contact)
    }

    /// Deletes a contact by id.
    pub fn delete(&self, id: ContactId) -> ServiceResult<()> {
        Ok(self.repo.delete_contact(id)?)
    }
}

/// Extracts the optional caller-supplied id from a create payload.
///
/// Absent, `null` and empty-string values mean "generate one".
pub fn requested_id(payload: &Value) -> ServiceResult<Option<ContactId>> {
    match payload.get(REQUESTED_ID_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(Value::String(text)) => Uuid::parse_str(text)
            .map(Some)
            .map_err(|_| ContactServiceError::InvalidRequestedId(text.clone())),
        Some(other) => Err(ContactServiceError::InvalidRequestedId(other.to_string())),
    }
}
