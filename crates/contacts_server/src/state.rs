use contacts_core::{
    ContactService, ServiceResult, SqliteContactRepository, StoreGateway,
};
use std::sync::Arc;

use crate::error::ApiError;

/// Shared request state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<StoreGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<StoreGateway>) -> Self {
        Self { gateway }
    }

    /// Runs one service call against the store on the blocking pool.
    ///
    /// The store connection is held for the whole of `op`, so each call sees
    /// and leaves a consistent store.
    pub async fn run_service<T, F>(&self, operation: &'static str, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&ContactService<SqliteContactRepository<'c>>) -> ServiceResult<T>
            + Send
            + 'static,
    {
        let handle = self
            .gateway
            .handle()
            .map_err(|err| ApiError::internal(operation, err))?;

        let joined = tokio::task::spawn_blocking(move || {
            handle.with_conn(|conn| -> ServiceResult<T> {
                let repo = SqliteContactRepository::try_new(conn)?;
                op(&ContactService::new(repo))
            })
        })
        .await
        .map_err(|err| ApiError::internal(operation, err))?;

        joined.map_err(|err| ApiError::from_service(operation, err))
    }
}
