//! Wiring: binds the handlers of every feature into one registry.

use std::sync::Arc;

use store::Backend;

use crate::Result;
use crate::config::Config;
use crate::dependencies::Dependencies;
use crate::handlers;
use crate::messagebus::Messagebus;
use crate::registry::HandlerRegistry;
use crate::unit_of_work::UnitOfWork;

/// Builds the handler registry shared by every message bus.
#[tracing::instrument(skip_all)]
pub fn bootstrap<B: Backend + 'static>(
    deps: &Dependencies,
    config: &Config,
) -> Result<Arc<HandlerRegistry<B>>> {
    let builder = HandlerRegistry::builder();
    let builder = handlers::users::register(builder, deps, config);
    let builder = handlers::wishlists::register(builder, deps);
    let builder = handlers::roles::register(builder);
    let registry = builder.build()?;

    tracing::info!(
        commands = registry.command_handler_count(),
        "message handlers registered"
    );
    Ok(Arc::new(registry))
}

/// Creates a message bus for one operation, with a fresh unit of work.
pub fn new_bus<B: Backend + 'static>(
    backend: B,
    registry: &Arc<HandlerRegistry<B>>,
) -> Messagebus<B> {
    Messagebus::new(UnitOfWork::new(backend), Arc::clone(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryBackend;

    #[test]
    fn every_command_has_a_handler() {
        let registry =
            bootstrap::<InMemoryBackend>(&Dependencies::fake(), &Config::default()).unwrap();
        assert_eq!(registry.command_handler_count(), 22);
    }

    #[test]
    fn every_event_is_registered() {
        let registry =
            bootstrap::<InMemoryBackend>(&Dependencies::fake(), &Config::default()).unwrap();

        for event in [
            "UserCreated",
            "UserActivated",
            "UserDeactivated",
            "PasswordChanged",
            "EmailChanged",
            "WishlistCreated",
            "WishlistNameChanged",
            "WishlistItemAdded",
            "WishlistItemRemoved",
            "WishlistItemMarkedAsPurchased",
            "WishlistItemMarkedAsNotPurchased",
            "WishlistArchived",
            "WishlistUnarchived",
            "RoleAddedToUser",
            "RoleRemovedFromUser",
            "RoleCreated",
            "PermissionAddedToRole",
            "PermissionRemovedFromRole",
        ] {
            assert!(registry.knows_event(event), "{event} is not registered");
        }

        let names: Vec<_> = registry
            .event_handlers_for("UserCreated")
            .iter()
            .map(|handler| handler.name())
            .collect();
        assert_eq!(names, vec!["send_activation_code", "send_activation_link"]);
    }
}
