use models::errors::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("user id is empty")]
    InvalidUserId,
    #[error("state is missing or not a JSON object")]
    InvalidState,
    #[error("stored state is not valid JSON: {0}")]
    CorruptState(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl ServiceError {
    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidUserId => "missing_user_id",
            ServiceError::InvalidState => "missing_or_bad_state",
            ServiceError::CorruptState(_) => "bad_state_json",
            ServiceError::StoreUnavailable(_) => "db_error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::InvalidUserId | ServiceError::InvalidState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::InvalidUserId.code(), "missing_user_id");
        assert_eq!(ServiceError::InvalidState.code(), "missing_or_bad_state");
        assert_eq!(ServiceError::CorruptState("eof".into()).code(), "bad_state_json");
        let timeout = ServiceError::from(StoreError::Timeout(Duration::from_secs(5)));
        assert_eq!(timeout.code(), "db_error");
        assert!(!timeout.is_client_error());
        assert!(ServiceError::InvalidState.is_client_error());
    }
}
