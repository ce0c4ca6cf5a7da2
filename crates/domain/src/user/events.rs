//! User domain events.

use common::{RoleName, Username};
use serde::{Deserialize, Serialize};

/// A new user registered. Recorded by [`User::register`](super::User::register).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreated {
    pub username: Username,
    pub email: String,
}

/// A user account was activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivated {
    pub username: Username,
}

/// A user account was deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDeactivated {
    pub username: Username,
}

/// A user's password hash was replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordChanged {
    pub username: Username,
}

/// A user's email address changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailChanged {
    pub username: Username,
    pub new_email: String,
}

/// A role was granted to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAddedToUser {
    pub username: Username,
    pub role_name: RoleName,
}

/// A role was revoked from a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRemovedFromUser {
    pub username: Username,
    pub role_name: RoleName,
}
