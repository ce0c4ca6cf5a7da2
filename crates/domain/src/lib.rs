//! Domain layer for the wishlist backend.
//!
//! This crate provides the core domain abstractions including:
//! - AggregateRoot trait and the per-aggregate event buffer
//! - Command and Event message unions with their metadata
//! - User, Wishlist and Role aggregates
//! - The domain error taxonomy

pub mod aggregate;
pub mod error;
pub mod message;
pub mod role;
pub mod user;
pub mod wishlist;

pub use aggregate::{AggregateRoot, DomainEvent, EventBuffer};
pub use error::{DomainError, ErrorKind};
pub use message::{Command, CommandMetadata, Event, Message, MessageType};
pub use role::{
    AddPermissionToRole, CreateRole, Permission, PermissionAddedToRole, PermissionRemovedFromRole,
    RemovePermissionFromRole, Role, RoleCreated,
};
pub use user::{
    ActivateUser, ActivateUserWithCode, ActivateUserWithToken, AddRoleToUser, ChangeEmail,
    ChangePassword, CreateUser, DeactivateUser, EmailChanged, GenerateAuthToken, PasswordChanged,
    RemoveRoleFromUser, ResendActivationCode, RoleAddedToUser, RoleRemovedFromUser, User,
    UserActivated, UserCreated, UserDeactivated,
};
pub use wishlist::{
    AddWishlistItem, ArchiveWishlist, ChangeWishlistName, CreateWishlist,
    MarkWishlistItemAsNotPurchased, MarkWishlistItemAsPurchased, MeasurementUnit, Priority,
    RemoveWishlistItem, UnarchiveWishlist, Wishlist, WishlistArchived, WishlistCreated,
    WishlistItem, WishlistItemAdded, WishlistItemMarkedAsNotPurchased,
    WishlistItemMarkedAsPurchased, WishlistItemRemoved, WishlistNameChanged, WishlistUnarchived,
};
