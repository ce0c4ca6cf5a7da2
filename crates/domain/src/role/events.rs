//! Role domain events.

use common::RoleName;
use serde::{Deserialize, Serialize};

use super::Permission;

/// A role was created without permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleCreated {
    pub role_name: RoleName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionAddedToRole {
    pub role_name: RoleName,
    pub permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRemovedFromRole {
    pub role_name: RoleName,
    pub permission: Permission,
}
