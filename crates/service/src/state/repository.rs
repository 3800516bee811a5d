use async_trait::async_trait;
use models::errors::StoreError;

/// Persistence seam for per-user state.
///
/// `put` must insert or replace atomically; readers never observe a
/// half-written record.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<String>, StoreError>;
    async fn put(&self, user_id: &str, state_json: &str, updated_at: &str) -> Result<(), StoreError>;
}

/// Simple in-memory mock store for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    #[derive(Default)]
    pub struct MockStateStore {
        rows: Mutex<HashMap<String, (String, String)>>, // user_id -> (state_json, updated_at)
        failing: AtomicBool,
    }

    impl MockStateStore {
        /// Make every subsequent call fail with `StoreError::Db`.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Store raw text as-is, bypassing the service.
        pub fn insert_raw(&self, user_id: &str, state_json: &str) {
            self.rows().insert(user_id.to_string(), (state_json.to_string(), String::new()));
        }

        pub fn updated_at(&self, user_id: &str) -> Option<String> {
            self.rows().get(user_id).map(|(_, ts)| ts.clone())
        }

        pub fn len(&self) -> usize {
            self.rows().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn rows(&self) -> MutexGuard<'_, HashMap<String, (String, String)>> {
            self.rows.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Db("mock store offline".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StateStore for MockStateStore {
        async fn get(&self, user_id: &str) -> Result<Option<String>, StoreError> {
            self.check()?;
            Ok(self.rows().get(user_id).map(|(json, _)| json.clone()))
        }

        async fn put(&self, user_id: &str, state_json: &str, updated_at: &str) -> Result<(), StoreError> {
            self.check()?;
            self.rows().insert(user_id.to_string(), (state_json.to_string(), updated_at.to_string()));
            Ok(())
        }
    }
}
