use std::future::Future;
use std::time::Duration;

use models::{errors::StoreError, state_record};
use sea_orm::DatabaseConnection;

use crate::state::repository::StateStore;

/// `StateStore` backed by the `states` table.
///
/// Every call is bounded by `op_timeout` so a stalled database cannot hang a request.
#[derive(Clone)]
pub struct SeaOrmStateStore {
    pub db: DatabaseConnection,
    pub op_timeout: Duration,
}

impl SeaOrmStateStore {
    pub fn new(db: DatabaseConnection, op_timeout: Duration) -> Self {
        Self { db, op_timeout }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.op_timeout))?
    }
}

#[async_trait::async_trait]
impl StateStore for SeaOrmStateStore {
    async fn get(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        self.bounded(state_record::get(&self.db, user_id)).await
    }

    async fn put(&self, user_id: &str, state_json: &str, updated_at: &str) -> Result<(), StoreError> {
        self.bounded(state_record::put(&self.db, user_id, state_json, updated_at)).await
    }
}
