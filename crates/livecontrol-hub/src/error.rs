//! Error types for hub lifetimes.
//!
//! Expected routing outcomes (hub not connected, shocker unknown, shocker held
//! exclusively) are not errors; see [`crate::types`]. These are the failures
//! that callers should actually handle.

use thiserror::Error;

use crate::controller::ControllerError;

/// A result type using `HubError`.
pub type Result<T> = std::result::Result<T, HubError>;

/// Errors that can occur in hub lifetime operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Metadata or presence storage failed.
    #[error("storage error: {0}")]
    Store(#[from] livecontrol_store::StoreError),

    /// The hub controller rejected or failed to send a command.
    #[error("hub controller error: {0}")]
    Controller(#[from] ControllerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecontrol_store::StoreError;

    #[test]
    fn wraps_store_and_controller_failures() {
        let err: HubError = StoreError::Database("down".into()).into();
        assert!(matches!(err, HubError::Store(_)));
        assert_eq!(err.to_string(), "storage error: database error: down");

        let err: HubError = ControllerError::Closed.into();
        assert!(matches!(err, HubError::Controller(_)));
    }
}
