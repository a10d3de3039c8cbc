//! Store connection lifecycle.
//!
//! # Responsibility
//! - Own the one store connection used by the process.
//! - Keep connection state explicit and injectable instead of global.

mod gateway;

pub use gateway::{GatewayError, StoreConfig, StoreGateway, StoreHandle, MEMORY_ADDRESS};
