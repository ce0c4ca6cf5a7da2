//! Domain error types.

use std::fmt;

use common::{ItemId, RoleName, Username, WishlistId};
use thiserror::Error;

/// Coarse error categories shared by every layer.
///
/// Transports map these onto their own status codes; the message bus only
/// cares that an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Verification,
    Forbidden,
    Token,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::Verification => "verification",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Token => "token",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Errors raised by aggregates and command handlers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("User {username} not found")]
    UserNotFound { username: Username },

    #[error("User {username} already exists")]
    UserExists { username: Username },

    #[error("User {username} is already active")]
    UserAlreadyActive { username: Username },

    #[error("User {username} is not active")]
    UserNotActive { username: Username },

    #[error("Wishlist {wishlist_id} not found")]
    WishlistNotFound { wishlist_id: WishlistId },

    #[error("Item {item_id} not found in wishlist {wishlist_id}")]
    WishlistItemNotFound {
        wishlist_id: WishlistId,
        item_id: ItemId,
    },

    #[error("Wishlist {wishlist_id} is already archived")]
    WishlistAlreadyArchived { wishlist_id: WishlistId },

    #[error("Wishlist {wishlist_id} is not archived")]
    WishlistNotArchived { wishlist_id: WishlistId },

    #[error("Item {item_id} is already purchased")]
    ItemAlreadyPurchased { item_id: ItemId },

    #[error("Item {item_id} is not purchased")]
    ItemNotPurchased { item_id: ItemId },

    #[error("Role {role_name} not found")]
    RoleNotFound { role_name: RoleName },

    #[error("Role {role_name} already exists")]
    RoleExists { role_name: RoleName },

    #[error("Role {role_name} already has permission {permission}")]
    RoleAlreadyHasPermission {
        role_name: RoleName,
        permission: String,
    },

    #[error("Role {role_name} does not have permission {permission}")]
    RoleDoesNotHavePermission {
        role_name: RoleName,
        permission: String,
    },

    #[error("User {username} already has role {role_name}")]
    UserAlreadyHasRole {
        username: Username,
        role_name: RoleName,
    },

    #[error("User {username} does not have role {role_name}")]
    UserDoesNotHaveRole {
        username: Username,
        role_name: RoleName,
    },

    #[error("Password does not meet requirements: {reason}")]
    PasswordValidation { reason: &'static str },

    #[error("Invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("Name must not be empty")]
    EmptyName,

    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    #[error("Password verification failed")]
    PasswordVerification,

    #[error("Activation code verification failed")]
    CodeVerification,

    #[error("{principal} is not allowed to {action}")]
    Forbidden {
        principal: String,
        action: &'static str,
    },
}

impl DomainError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::UserNotFound { .. }
            | DomainError::WishlistNotFound { .. }
            | DomainError::WishlistItemNotFound { .. }
            | DomainError::RoleNotFound { .. } => ErrorKind::NotFound,
            DomainError::UserExists { .. }
            | DomainError::UserAlreadyActive { .. }
            | DomainError::UserNotActive { .. }
            | DomainError::WishlistAlreadyArchived { .. }
            | DomainError::WishlistNotArchived { .. }
            | DomainError::ItemAlreadyPurchased { .. }
            | DomainError::ItemNotPurchased { .. }
            | DomainError::RoleExists { .. }
            | DomainError::RoleAlreadyHasPermission { .. }
            | DomainError::RoleDoesNotHavePermission { .. }
            | DomainError::UserAlreadyHasRole { .. }
            | DomainError::UserDoesNotHaveRole { .. } => ErrorKind::Conflict,
            DomainError::PasswordValidation { .. }
            | DomainError::InvalidEmail { .. }
            | DomainError::EmptyName
            | DomainError::InvalidQuantity { .. } => ErrorKind::Validation,
            DomainError::PasswordVerification | DomainError::CodeVerification => {
                ErrorKind::Verification
            }
            DomainError::Forbidden { .. } => ErrorKind::Forbidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let missing = DomainError::UserNotFound {
            username: Username::from("ghost"),
        };
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let active = DomainError::UserAlreadyActive {
            username: Username::from("alice"),
        };
        assert_eq!(active.kind(), ErrorKind::Conflict);

        let weak = DomainError::PasswordValidation { reason: "too short" };
        assert_eq!(weak.kind(), ErrorKind::Validation);

        let missing_role = DomainError::RoleNotFound {
            role_name: RoleName::from("editor"),
        };
        assert_eq!(missing_role.kind(), ErrorKind::NotFound);

        assert_eq!(
            DomainError::PasswordVerification.kind(),
            ErrorKind::Verification
        );
    }

    #[test]
    fn messages_name_the_subject() {
        let err = DomainError::UserNotFound {
            username: Username::from("ghost"),
        };
        assert_eq!(err.to_string(), "User ghost not found");
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
