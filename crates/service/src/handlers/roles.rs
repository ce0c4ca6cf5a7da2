//! Command handlers of the role feature.
//!
//! Managing roles is reserved to superusers, trusted internal callers and
//! holders of the `manage_roles` permission.

use common::RoleName;
use domain::{
    AddPermissionToRole, CommandMetadata, CreateRole, DomainError, Permission,
    PermissionAddedToRole, PermissionRemovedFromRole, RemovePermissionFromRole, Role, RoleCreated,
};
use store::Backend;

use super::{authorize, require_superuser};
use crate::Result;
use crate::messagebus::CommandOutput;
use crate::registry::HandlerRegistryBuilder;
use crate::unit_of_work::{Transaction, UnitOfWork};

/// Binds every role command handler. Role events have no handlers.
pub fn register<B: Backend + 'static>(
    builder: HandlerRegistryBuilder<B>,
) -> HandlerRegistryBuilder<B> {
    builder
        .command(|command: CreateRole, uow: &mut UnitOfWork<B>| create_role(uow, command))
        .command(|command: AddPermissionToRole, uow: &mut UnitOfWork<B>| {
            let permission = command.permission;
            update_role(
                uow,
                &command.role_name,
                &command.metadata,
                "add permissions to role",
                |role| role.add_permission(permission),
            )
        })
        .command(|command: RemovePermissionFromRole, uow: &mut UnitOfWork<B>| {
            update_role(
                uow,
                &command.role_name,
                &command.metadata,
                "remove permissions from role",
                |role| role.remove_permission(&command.permission),
            )
        })
        .no_event_handlers::<RoleCreated>()
        .no_event_handlers::<PermissionAddedToRole>()
        .no_event_handlers::<PermissionRemovedFromRole>()
}

/// Passes for callers allowed to manage roles.
pub(super) fn authorize_role_management<B: Backend>(
    tx: &mut Transaction<'_, B>,
    metadata: &CommandMetadata,
    action: &'static str,
) -> Result<()> {
    let check = require_superuser(metadata, action);
    authorize(tx, metadata, check, Permission::MANAGE_ROLES)
}

#[tracing::instrument(skip_all, fields(role = %command.name))]
fn create_role<B: Backend>(uow: &mut UnitOfWork<B>, command: CreateRole) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    authorize_role_management(&mut tx, &command.metadata, "create role")?;
    if tx.roles().contains(&command.name)? {
        return Err(DomainError::RoleExists {
            role_name: command.name,
        }
        .into());
    }
    tx.roles().add(Role::create(command.name)?)?;
    tx.commit()?;
    Ok(CommandOutput::None)
}

fn update_role<B: Backend>(
    uow: &mut UnitOfWork<B>,
    role_name: &RoleName,
    metadata: &CommandMetadata,
    action: &'static str,
    change: impl FnOnce(&mut Role) -> std::result::Result<(), DomainError>,
) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    authorize_role_management(&mut tx, metadata, action)?;
    change(tx.roles().get(role_name)?)?;
    tx.commit()?;
    Ok(CommandOutput::None)
}
