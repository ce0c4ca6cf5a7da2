//! User commands.

use common::{RoleName, Username};
use serde::{Deserialize, Serialize};

use crate::message::CommandMetadata;

/// Command to register a new, inactive user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: Username,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl CreateUser {
    /// Creates a new CreateUser command.
    pub fn new(
        username: impl Into<Username>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to exchange credentials for an auth token.
///
/// The handler returns the token as the command's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateAuthToken {
    pub username: Username,
    pub password: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl GenerateAuthToken {
    /// Creates a new GenerateAuthToken command.
    pub fn new(username: impl Into<Username>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to activate a user unconditionally (administrative path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateUser {
    pub username: Username,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ActivateUser {
    /// Creates a new ActivateUser command.
    pub fn new(username: impl Into<Username>) -> Self {
        Self {
            username: username.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to activate the user named by an activation-link token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateUserWithToken {
    pub token: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ActivateUserWithToken {
    /// Creates a new ActivateUserWithToken command.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to activate a user with the code they were sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateUserWithCode {
    pub username: Username,
    pub code: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ActivateUserWithCode {
    /// Creates a new ActivateUserWithCode command.
    pub fn new(username: impl Into<Username>, code: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            code: code.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to issue and send a fresh activation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResendActivationCode {
    pub username: Username,
    pub password: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ResendActivationCode {
    /// Creates a new ResendActivationCode command.
    pub fn new(username: impl Into<Username>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to change a user's password.
///
/// With `old_password` the user proves knowledge of the current password.
/// Without it the command must be issued by a superuser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePassword {
    pub username: Username,
    pub old_password: Option<String>,
    pub new_password: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ChangePassword {
    /// Creates a password change verified by the old password.
    pub fn new(
        username: impl Into<Username>,
        old_password: impl Into<String>,
        new_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            old_password: Some(old_password.into()),
            new_password: new_password.into(),
            metadata: CommandMetadata::default(),
        }
    }

    /// Creates a password reset that skips the old password check.
    pub fn reset(username: impl Into<Username>, new_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            old_password: None,
            new_password: new_password.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to change a user's email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEmail {
    pub username: Username,
    pub new_email: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ChangeEmail {
    /// Creates a new ChangeEmail command.
    pub fn new(username: impl Into<Username>, new_email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            new_email: new_email.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to deactivate a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeactivateUser {
    pub username: Username,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl DeactivateUser {
    /// Creates a new DeactivateUser command.
    pub fn new(username: impl Into<Username>) -> Self {
        Self {
            username: username.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to grant a role to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRoleToUser {
    pub username: Username,
    pub role_name: RoleName,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl AddRoleToUser {
    pub fn new(username: impl Into<Username>, role_name: impl Into<RoleName>) -> Self {
        Self {
            username: username.into(),
            role_name: role_name.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to revoke a role from a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveRoleFromUser {
    pub username: Username,
    pub role_name: RoleName,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl RemoveRoleFromUser {
    pub fn new(username: impl Into<Username>, role_name: impl Into<RoleName>) -> Self {
        Self {
            username: username.into(),
            role_name: role_name.into(),
            metadata: CommandMetadata::default(),
        }
    }
}
