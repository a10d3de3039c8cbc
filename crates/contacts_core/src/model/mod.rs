//! Domain model for the contacts store.
//!
//! # Invariants
//! - Every contact is identified by a stable `ContactId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod contact;
