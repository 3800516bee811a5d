use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::repository::StateStore;
use crate::errors::ServiceError;

/// Read/overwrite per-user JSON state, independent of the web framework.
pub struct StateService<S: StateStore> {
    store: Arc<S>,
    // last issued `updated_at`, in epoch millis
    last_write_ms: AtomicI64,
}

impl<S: StateStore> StateService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, last_write_ms: AtomicI64::new(i64::MIN) }
    }

    /// Fetch the state for `user_id`; `Ok(None)` means nothing was saved yet.
    ///
    /// # Examples
    /// ```
    /// use service::state::{repository::mock::MockStateStore, StateService};
    /// use std::sync::Arc;
    /// let svc = StateService::new(Arc::new(MockStateStore::default()));
    /// let state = tokio_test::block_on(svc.read_state("bob")).unwrap();
    /// assert!(state.is_none());
    /// ```
    #[instrument(skip(self))]
    pub async fn read_state(&self, user_id: &str) -> Result<Option<Value>, ServiceError> {
        if user_id.is_empty() {
            return Err(ServiceError::InvalidUserId);
        }

        let raw = self.store.get(user_id).await.map_err(|e| {
            error!(op = "read_state", %user_id, error = %e, "store read failed");
            ServiceError::from(e)
        })?;

        let Some(raw) = raw else {
            debug!(%user_id, "no state yet");
            return Ok(None);
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                error!(op = "read_state", %user_id, error = %e, "stored state is not valid JSON");
                Err(ServiceError::CorruptState(e.to_string()))
            }
        }
    }

    /// Replace the state for `user_id` with `value`, which must be a JSON object.
    ///
    /// # Examples
    /// ```
    /// use service::state::{repository::mock::MockStateStore, StateService};
    /// use std::sync::Arc;
    /// let svc = StateService::new(Arc::new(MockStateStore::default()));
    /// let value = serde_json::json!({"weight": 100});
    /// tokio_test::block_on(svc.write_state("alice", Some(value.clone()))).unwrap();
    /// let stored = tokio_test::block_on(svc.read_state("alice")).unwrap();
    /// assert_eq!(stored, Some(value));
    /// ```
    #[instrument(skip(self, value))]
    pub async fn write_state(&self, user_id: &str, value: Option<Value>) -> Result<(), ServiceError> {
        if user_id.is_empty() {
            return Err(ServiceError::InvalidUserId);
        }
        let value = match value {
            Some(v @ Value::Object(_)) => v,
            other => {
                warn!(op = "write_state", %user_id, kind = kind_of(other.as_ref()), "rejected non-object state");
                return Err(ServiceError::InvalidState);
            }
        };

        // 整体替换，不做字段级合并
        let json = value.to_string();
        let updated_at = self.next_timestamp();

        self.store.put(user_id, &json, &updated_at).await.map_err(|e| {
            error!(op = "write_state", %user_id, error = %e, "store upsert failed");
            ServiceError::from(e)
        })?;

        info!(%user_id, %updated_at, bytes = json.len(), "state saved");
        Ok(())
    }

    /// ISO-8601 UTC with millisecond precision; never earlier than the last one issued.
    fn next_timestamp(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let prev = self.last_write_ms.fetch_max(now, Ordering::SeqCst);
        let ms = now.max(prev);
        DateTime::<Utc>::from_timestamp_millis(ms)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "absent",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
