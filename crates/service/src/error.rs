//! Service layer error types.

use domain::{DomainError, ErrorKind};
use store::StoreError;
use thiserror::Error;

/// Errors produced while issuing or validating tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenError {
    /// The token's expiry lies in the past.
    #[error("Token has expired")]
    Expired,

    /// The token is malformed or its signature does not verify.
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// The token could not be signed.
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// Errors produced by a notificator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotificationError {
    #[error("Failed to notify {recipient}: {reason}")]
    Delivery { recipient: String, reason: String },
}

/// Errors that can occur while handling a message.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A domain rule rejected the operation.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The backing store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// An aggregate row could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A row read without a lock was committed by another transaction
    /// before this one could write it back.
    #[error("{table} row {id} changed since it was read")]
    StaleAggregate { table: &'static str, id: String },

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),

    /// No handler is registered for the command.
    #[error("No handler registered for command {0}")]
    UnhandledCommand(&'static str),

    /// A handler received a message of a different type than it was registered for.
    #[error("Handler for {expected} received {actual}")]
    MismatchedMessage {
        expected: &'static str,
        actual: &'static str,
    },

    /// Two handlers were registered for the same command.
    #[error("Command {0} already has a handler")]
    DuplicateCommandHandler(&'static str),
}

impl ServiceError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(err) => err.kind(),
            ServiceError::Store(StoreError::DuplicateKey { .. })
            | ServiceError::Store(StoreError::LockTimeout { .. })
            | ServiceError::StaleAggregate { .. } => ErrorKind::Conflict,
            ServiceError::Store(StoreError::RowNotFound { .. }) => ErrorKind::NotFound,
            ServiceError::Token(_) => ErrorKind::Token,
            ServiceError::Store(StoreError::TransactionClosed)
            | ServiceError::Notification(_)
            | ServiceError::Serialization(_)
            | ServiceError::PasswordHashing(_)
            | ServiceError::UnhandledCommand(_)
            | ServiceError::MismatchedMessage { .. }
            | ServiceError::DuplicateCommandHandler(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::Username;

    #[test]
    fn domain_errors_keep_their_kind() {
        let err: ServiceError = DomainError::UserNotFound {
            username: Username::from("ghost"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn store_conflicts_map_to_conflict() {
        let err: ServiceError = StoreError::LockTimeout {
            table: "users".into(),
            key: "alice".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            ServiceError::from(StoreError::TransactionClosed).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn token_and_wiring_errors() {
        assert_eq!(ServiceError::from(TokenError::Expired).kind(), ErrorKind::Token);

        let err = ServiceError::UnhandledCommand("CreateUser");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "No handler registered for command CreateUser");
    }
}
