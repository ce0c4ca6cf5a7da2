//! Per-feature handler registrations.
//!
//! Every handler is a closure over exactly the collaborators it uses. The
//! closures are bound into a [`HandlerRegistry`](crate::registry::HandlerRegistry)
//! by [`bootstrap`](crate::bootstrap::bootstrap).

pub mod roles;
pub mod users;
pub mod wishlists;

use domain::{CommandMetadata, DomainError};
use store::Backend;

use crate::Result;
use crate::unit_of_work::Transaction;

fn forbidden(metadata: &CommandMetadata, action: &'static str) -> DomainError {
    DomainError::Forbidden {
        principal: metadata
            .username
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        action,
    }
}

/// Only superusers and trusted internal callers may perform `action`.
fn require_superuser(
    metadata: &CommandMetadata,
    action: &'static str,
) -> std::result::Result<(), DomainError> {
    if metadata.username.is_none() || metadata.is_superuser {
        Ok(())
    } else {
        Err(forbidden(metadata, action))
    }
}

/// Settles an authorization check that `check` may already have denied.
///
/// A denied check still passes when the principal holds `permission` through
/// one of their roles. Otherwise the denial is returned unchanged.
fn authorize<B: Backend>(
    tx: &mut Transaction<'_, B>,
    metadata: &CommandMetadata,
    check: std::result::Result<(), DomainError>,
    permission: &str,
) -> Result<()> {
    let Err(denied) = check else {
        return Ok(());
    };
    let Some(principal) = &metadata.username else {
        return Err(denied.into());
    };
    if !tx.users().contains(principal)? {
        return Err(denied.into());
    }

    let roles = tx.users().get(principal)?.roles().to_vec();
    for role_name in &roles {
        let granted = tx.roles().contains(role_name)?
            && tx.roles().get(role_name)?.has_permission(permission);
        if granted {
            tracing::debug!(%principal, role = %role_name, permission, "granted through role");
            return Ok(());
        }
    }
    Err(denied.into())
}
