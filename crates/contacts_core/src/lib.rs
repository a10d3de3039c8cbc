//! Core domain logic for the contacts service.
//! This crate is the single source of truth for contact invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod validation;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{parse_contact_id, Contact, ContactFields, ContactId, InvalidContactId};
pub use repo::contact_repo::{ContactRepository, RepoError, RepoResult, SqliteContactRepository};
pub use service::contact_service::{
    requested_id, ConflictKind, ContactService, ContactServiceError, ServiceResult,
};
pub use store::{GatewayError, StoreConfig, StoreGateway, StoreHandle};
pub use validation::{validate_contact, ContactValidationError, ValidContact};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
