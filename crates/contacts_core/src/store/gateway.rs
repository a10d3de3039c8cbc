//! Storage gateway owning the single process-wide store connection.
//!
//! # Responsibility
//! - Lazily open one connection for the configured address and cache it.
//! - Hand out cheap shared handles to request handlers.
//! - Release the connection on explicit close.
//!
//! # Invariants
//! - At most one connection is open per gateway.
//! - `connect` is idempotent; `close` is idempotent.
//! - `handle` never opens a connection on its own.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Address that selects a private in-memory store.
pub const MEMORY_ADDRESS: &str = ":memory:";
const DB_FILE_EXTENSION: &str = "sqlite3";

/// Where the store lives and which logical database to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// `:memory:` or an existing directory.
    pub address: String,
    /// Logical database name; becomes `<address>/<database>.sqlite3`.
    pub database: String,
}

impl StoreConfig {
    pub fn new(address: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            database: database.into(),
        }
    }

    /// Config for a private in-memory store.
    pub fn in_memory(database: impl Into<String>) -> Self {
        Self::new(MEMORY_ADDRESS, database)
    }

    fn target(&self) -> Result<StoreTarget, GatewayError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(GatewayError::Connection("store address is empty".to_string()));
        }

        let database = self.database.trim();
        if database.is_empty() || database.contains(['/', '\\']) || database.starts_with('.') {
            return Err(GatewayError::Connection(format!(
                "invalid database name `{database}`"
            )));
        }

        if address == MEMORY_ADDRESS {
            return Ok(StoreTarget::Memory);
        }

        let dir = PathBuf::from(address);
        if !dir.is_dir() {
            return Err(GatewayError::Connection(format!(
                "store directory `{}` does not exist",
                dir.display()
            )));
        }
        Ok(StoreTarget::File(
            dir.join(format!("{database}.{DB_FILE_EXTENSION}")),
        ))
    }
}

enum StoreTarget {
    Memory,
    File(PathBuf),
}

impl StoreTarget {
    fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }

    fn open(&self) -> DbResult<Connection> {
        match self {
            Self::Memory => open_db_in_memory(),
            Self::File(path) => open_db(path),
        }
    }
}

/// Gateway failures.
#[derive(Debug)]
pub enum GatewayError {
    /// Address is malformed or the store could not be opened.
    Connection(String),
    /// Store accessed before `connect` (or after `close`).
    Uninitialized,
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(message) => write!(f, "store connection failed: {message}"),
            Self::Uninitialized => {
                write!(f, "store not initialized; call connect() first")
            }
        }
    }
}

impl Error for GatewayError {}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        Self::Connection(value.to_string())
    }
}

/// Shared handle to the open store connection.
///
/// Clones refer to the same connection. Each call to [`StoreHandle::with_conn`]
/// holds the connection lock for one logical operation.
#[derive(Clone)]
pub struct StoreHandle {
    conn: Arc<Mutex<Connection>>,
}

impl StoreHandle {
    fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `op` with exclusive access to the connection.
    pub fn with_conn<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut guard = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        op(&mut *guard)
    }

    /// Returns whether two handles share the same connection.
    pub fn same_connection(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }
}

/// Owner of the store connection lifecycle.
pub struct StoreGateway {
    config: StoreConfig,
    handle: Mutex<Option<StoreHandle>>,
}

impl StoreGateway {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: Mutex::new(None),
        }
    }

    /// Opens the store if needed and returns the cached handle.
    ///
    /// # Errors
    /// - `GatewayError::Connection` when the address is malformed, the store
    ///   directory is missing, or opening/migrating the database fails.
    pub fn connect(&self) -> Result<StoreHandle, GatewayError> {
        let mut slot = self.lock_slot()?;
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        let target = self.config.target().inspect_err(|err| {
            error!("event=store_connect module=store status=error error_code=bad_address error={err}");
        })?;
        let conn = target.open()?;
        let handle = StoreHandle::new(conn);
        *slot = Some(handle.clone());

        info!(
            "event=store_connect module=store status=ok mode={} database={}",
            target.mode(),
            self.config.database.trim()
        );
        Ok(handle)
    }

    /// Returns the cached handle without connecting.
    pub fn handle(&self) -> Result<StoreHandle, GatewayError> {
        self.lock_slot()?
            .as_ref()
            .cloned()
            .ok_or(GatewayError::Uninitialized)
    }

    pub fn is_connected(&self) -> bool {
        self.lock_slot().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Drops the cached handle and returns to the uninitialized state.
    ///
    /// The connection itself closes once in-flight clones of the handle are
    /// dropped.
    pub fn close(&self) {
        let Ok(mut slot) = self.lock_slot() else {
            return;
        };
        if slot.take().is_some() {
            info!("event=store_close module=store status=ok");
        }
    }

    fn lock_slot(&self) -> Result<std::sync::MutexGuard<'_, Option<StoreHandle>>, GatewayError> {
        self.handle
            .lock()
            .map_err(|_| GatewayError::Connection(DbError::Poisoned.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::StoreConfig;

    #[test]
    fn target_rejects_blank_address_and_bad_names() {
        assert!(StoreConfig::new("  ", "contactsdb").target().is_err());
        assert!(StoreConfig::in_memory("").target().is_err());
        assert!(StoreConfig::in_memory("../escape").target().is_err());
        assert!(StoreConfig::in_memory("nested/name").target().is_err());
    }

    #[test]
    fn target_resolves_database_file_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().to_str().unwrap(), "contactsdb");

        match config.target().unwrap() {
            super::StoreTarget::File(path) => {
                assert_eq!(path, dir.path().join("contactsdb.sqlite3"));
            }
            super::StoreTarget::Memory => panic!("expected file target"),
        }
    }
}
