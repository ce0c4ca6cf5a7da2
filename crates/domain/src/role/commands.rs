//! Role commands.

use common::RoleName;
use serde::{Deserialize, Serialize};

use super::Permission;
use crate::message::CommandMetadata;

/// Command to create an empty role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: RoleName,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl CreateRole {
    pub fn new(name: impl Into<RoleName>) -> Self {
        Self {
            name: name.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to allow a role's holders something new.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPermissionToRole {
    pub role_name: RoleName,
    pub permission: Permission,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl AddPermissionToRole {
    pub fn new(role_name: impl Into<RoleName>, permission: impl Into<Permission>) -> Self {
        Self {
            role_name: role_name.into(),
            permission: permission.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to take a permission away from a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovePermissionFromRole {
    pub role_name: RoleName,
    pub permission: Permission,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl RemovePermissionFromRole {
    pub fn new(role_name: impl Into<RoleName>, permission: impl Into<Permission>) -> Self {
        Self {
            role_name: role_name.into(),
            permission: permission.into(),
            metadata: CommandMetadata::default(),
        }
    }
}
