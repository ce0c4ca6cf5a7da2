//! Command and event handlers of the wishlist feature.

use std::sync::Arc;

use common::{ItemId, WishlistId};
use domain::{
    AddWishlistItem, ArchiveWishlist, ChangeWishlistName, CommandMetadata, CreateWishlist,
    DomainError, MarkWishlistItemAsNotPurchased, MarkWishlistItemAsPurchased, Permission,
    RemoveWishlistItem, UnarchiveWishlist, UserDeactivated, Wishlist, WishlistArchived,
    WishlistCreated, WishlistItemAdded, WishlistItemMarkedAsNotPurchased,
    WishlistItemMarkedAsPurchased, WishlistItemRemoved, WishlistNameChanged, WishlistUnarchived,
};
use store::Backend;

use super::authorize;
use crate::Result;
use crate::dependencies::{Dependencies, IdGenerator, Notificator};
use crate::messagebus::CommandOutput;
use crate::registry::HandlerRegistryBuilder;
use crate::unit_of_work::UnitOfWork;

/// Binds every wishlist command and event handler.
pub fn register<B: Backend + 'static>(
    builder: HandlerRegistryBuilder<B>,
    deps: &Dependencies,
) -> HandlerRegistryBuilder<B> {
    let ids = Arc::clone(&deps.id_generator);
    let builder = builder.command(move |command: CreateWishlist, uow: &mut UnitOfWork<B>| {
        create_wishlist(uow, command, ids.as_ref())
    });

    let builder = builder.command(|command: ChangeWishlistName, uow: &mut UnitOfWork<B>| {
        let new_name = command.new_name;
        update_wishlist(
            uow,
            command.wishlist_id,
            &command.metadata,
            "rename wishlist",
            |wishlist| wishlist.change_name(new_name),
        )
    });

    let ids = Arc::clone(&deps.id_generator);
    let builder = builder.command(move |command: AddWishlistItem, uow: &mut UnitOfWork<B>| {
        let item_id = ItemId::from_uuid(ids.generate());
        let AddWishlistItem {
            wishlist_id,
            name,
            quantity,
            measurement_unit,
            priority,
            metadata,
        } = command;
        update_wishlist(uow, wishlist_id, &metadata, "add items to wishlist", |wishlist| {
            wishlist.add_item(item_id, name, quantity, measurement_unit, priority)
        })?;
        Ok(CommandOutput::ItemId(item_id))
    });

    let builder = builder.command(|command: RemoveWishlistItem, uow: &mut UnitOfWork<B>| {
        update_wishlist(
            uow,
            command.wishlist_id,
            &command.metadata,
            "remove items from wishlist",
            |wishlist| wishlist.remove_item(command.item_id),
        )
    });

    let builder =
        builder.command(|command: MarkWishlistItemAsPurchased, uow: &mut UnitOfWork<B>| {
            update_wishlist(
                uow,
                command.wishlist_id,
                &command.metadata,
                "mark items as purchased",
                |wishlist| wishlist.mark_item_as_purchased(command.item_id),
            )
        });

    let builder =
        builder.command(|command: MarkWishlistItemAsNotPurchased, uow: &mut UnitOfWork<B>| {
            update_wishlist(
                uow,
                command.wishlist_id,
                &command.metadata,
                "mark items as not purchased",
                |wishlist| wishlist.mark_item_as_not_purchased(command.item_id),
            )
        });

    let builder = builder.command(|command: ArchiveWishlist, uow: &mut UnitOfWork<B>| {
        update_wishlist(
            uow,
            command.wishlist_id,
            &command.metadata,
            "archive wishlist",
            Wishlist::archive,
        )
    });

    let builder = builder.command(|command: UnarchiveWishlist, uow: &mut UnitOfWork<B>| {
        update_wishlist(
            uow,
            command.wishlist_id,
            &command.metadata,
            "unarchive wishlist",
            Wishlist::unarchive,
        )
    });

    let builder = builder.event(
        "archive_owned_wishlists",
        |event: &UserDeactivated, uow: &mut UnitOfWork<B>| archive_owned_wishlists(uow, event),
    );

    let notificator = Arc::clone(&deps.notificator);
    builder
        .event(
            "notify_wishlist_archived",
            move |event: &WishlistArchived, uow: &mut UnitOfWork<B>| {
                notify_wishlist_archived(uow, event, notificator.as_ref())
            },
        )
        .no_event_handlers::<WishlistCreated>()
        .no_event_handlers::<WishlistNameChanged>()
        .no_event_handlers::<WishlistItemAdded>()
        .no_event_handlers::<WishlistItemRemoved>()
        .no_event_handlers::<WishlistItemMarkedAsPurchased>()
        .no_event_handlers::<WishlistItemMarkedAsNotPurchased>()
        .no_event_handlers::<WishlistUnarchived>()
}

#[tracing::instrument(skip_all, fields(owner = %command.owner))]
fn create_wishlist<B: Backend>(
    uow: &mut UnitOfWork<B>,
    command: CreateWishlist,
    ids: &dyn IdGenerator,
) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    let check = command.metadata.authorize(&command.owner, "create wishlist");
    authorize(&mut tx, &command.metadata, check, Permission::MANAGE_WISHLISTS)?;
    if !tx.users().contains(&command.owner)? {
        return Err(DomainError::UserNotFound {
            username: command.owner,
        }
        .into());
    }

    let wishlist_id = WishlistId::from_uuid(ids.generate());
    let wishlist = Wishlist::create(wishlist_id, command.owner, command.name)?;
    tx.wishlists().add(wishlist)?;
    tx.commit()?;

    Ok(CommandOutput::WishlistId(wishlist_id))
}

/// Loads a wishlist, checks the principal may perform `action` on it, applies
/// `change` and commits.
///
/// Owners, superusers, internal callers and holders of `manage_wishlists`
/// pass the check.
fn update_wishlist<B: Backend>(
    uow: &mut UnitOfWork<B>,
    wishlist_id: WishlistId,
    metadata: &CommandMetadata,
    action: &'static str,
    change: impl FnOnce(&mut Wishlist) -> std::result::Result<(), DomainError>,
) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    let check = tx
        .wishlists()
        .get(&wishlist_id)?
        .ensure_accessible_by(metadata, action);
    authorize(&mut tx, metadata, check, Permission::MANAGE_WISHLISTS)?;
    change(tx.wishlists().get(&wishlist_id)?)?;
    tx.commit()?;
    Ok(CommandOutput::None)
}

/// Archives every active wishlist of a deactivated user.
#[tracing::instrument(skip_all, fields(username = %event.username))]
fn archive_owned_wishlists<B: Backend>(
    uow: &mut UnitOfWork<B>,
    event: &UserDeactivated,
) -> Result<()> {
    let mut tx = uow.enter()?;
    let active: Vec<WishlistId> = tx
        .wishlists()
        .list_owned_by(&event.username)?
        .into_iter()
        .filter(|wishlist| !wishlist.is_archived())
        .map(|wishlist| wishlist.wishlist_id())
        .collect();

    let mut archived = 0;
    for wishlist_id in &active {
        let wishlist = tx.wishlists().get(wishlist_id)?;
        if !wishlist.is_archived() {
            wishlist.archive()?;
            archived += 1;
        }
    }
    tx.commit()?;

    tracing::info!(archived, "archived wishlists of deactivated user");
    Ok(())
}

fn notify_wishlist_archived<B: Backend>(
    uow: &mut UnitOfWork<B>,
    event: &WishlistArchived,
    notificator: &dyn Notificator,
) -> Result<()> {
    let (email, name) = {
        let mut tx = uow.enter()?;
        let email = tx.users().get(&event.owner)?.email().to_string();
        let name = tx.wishlists().get(&event.wishlist_id)?.name().to_string();
        (email, name)
    };
    notificator.send_wishlist_archived(&email, &name)?;
    Ok(())
}
