use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of something a role allows its holders to do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Act on any user's account as if it were your own.
    pub const MANAGE_USERS: &'static str = "manage_users";
    /// Act on any user's wishlists.
    pub const MANAGE_WISHLISTS: &'static str = "manage_wishlists";
    /// Create roles, edit their permissions and grant them to users.
    pub const MANAGE_ROLES: &'static str = "manage_roles";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Permission {
    fn from(s: String) -> Self {
        Self(s)
    }
}
