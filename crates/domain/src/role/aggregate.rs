//! Role aggregate implementation.

use common::RoleName;
use serde::{Deserialize, Serialize};

use super::Permission;
use super::events::{PermissionAddedToRole, PermissionRemovedFromRole, RoleCreated};
use crate::aggregate::{AggregateRoot, EventBuffer};
use crate::error::DomainError;

/// Role aggregate root.
///
/// A role is a named set of permissions. Users hold roles by name, so a
/// permission change applies to every holder at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    name: RoleName,
    permissions: Vec<Permission>,

    #[serde(skip)]
    events: EventBuffer,
}

impl AggregateRoot for Role {
    type Id = RoleName;

    fn aggregate_type() -> &'static str {
        "Role"
    }

    fn id(&self) -> &RoleName {
        &self.name
    }

    fn events(&self) -> &EventBuffer {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

impl Role {
    pub fn name(&self) -> &RoleName {
        &self.name
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == permission)
    }

    /// Creates a role without permissions and records `RoleCreated`.
    pub fn create(name: impl Into<RoleName>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.as_str().trim().is_empty() {
            return Err(DomainError::EmptyName);
        }

        let mut role = Self {
            name,
            permissions: Vec::new(),
            events: EventBuffer::default(),
        };
        role.events.record(RoleCreated {
            role_name: role.name.clone(),
        });
        Ok(role)
    }

    pub fn add_permission(&mut self, permission: Permission) -> Result<(), DomainError> {
        if self.has_permission(permission.as_str()) {
            return Err(DomainError::RoleAlreadyHasPermission {
                role_name: self.name.clone(),
                permission: permission.to_string(),
            });
        }
        self.permissions.push(permission.clone());
        self.events.record(PermissionAddedToRole {
            role_name: self.name.clone(),
            permission,
        });
        Ok(())
    }

    pub fn remove_permission(&mut self, permission: &Permission) -> Result<(), DomainError> {
        let Some(position) = self.permissions.iter().position(|p| p == permission) else {
            return Err(DomainError::RoleDoesNotHavePermission {
                role_name: self.name.clone(),
                permission: permission.to_string(),
            });
        };
        self.permissions.remove(position);
        self.events.record(PermissionRemovedFromRole {
            role_name: self.name.clone(),
            permission: permission.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_records_role_created() {
        let role = Role::create("editor").unwrap();
        assert!(role.permissions().is_empty());
        assert_eq!(role.events().iter().next().unwrap().name(), "RoleCreated");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(Role::create("  "), Err(DomainError::EmptyName)));
    }

    #[test]
    fn permissions_are_added_and_removed_once() {
        let mut role = Role::create("editor").unwrap();
        let manage = Permission::from(Permission::MANAGE_WISHLISTS);

        role.add_permission(manage.clone()).unwrap();
        assert!(role.has_permission(Permission::MANAGE_WISHLISTS));
        assert!(!role.has_permission(Permission::MANAGE_USERS));

        let err = role.add_permission(manage.clone()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Role editor already has permission manage_wishlists"
        );

        role.remove_permission(&manage).unwrap();
        assert!(matches!(
            role.remove_permission(&manage),
            Err(DomainError::RoleDoesNotHavePermission { .. })
        ));
        assert_eq!(role.events().len(), 3);
    }
}
