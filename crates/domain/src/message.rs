//! Command and event message unions.
//!
//! Every concrete command or event is its own struct. The [`Command`] and
//! [`Event`] enums close over all of them so the message bus can dispatch on
//! the variant name and hand each handler the concrete struct it was
//! registered for.

use chrono::{DateTime, Utc};
use common::Username;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::error::DomainError;
use crate::role::{
    AddPermissionToRole, CreateRole, PermissionAddedToRole, PermissionRemovedFromRole,
    RemovePermissionFromRole, RoleCreated,
};
use crate::user::{
    ActivateUser, ActivateUserWithCode, ActivateUserWithToken, AddRoleToUser, ChangeEmail,
    ChangePassword, CreateUser, DeactivateUser, EmailChanged, GenerateAuthToken,
    PasswordChanged, RemoveRoleFromUser, ResendActivationCode, RoleAddedToUser,
    RoleRemovedFromUser, UserActivated, UserCreated, UserDeactivated,
};
use crate::wishlist::{
    AddWishlistItem, ArchiveWishlist, ChangeWishlistName, CreateWishlist,
    MarkWishlistItemAsNotPurchased, MarkWishlistItemAsPurchased, RemoveWishlistItem,
    UnarchiveWishlist, WishlistArchived, WishlistCreated, WishlistItemAdded,
    WishlistItemMarkedAsNotPurchased, WishlistItemMarkedAsPurchased, WishlistItemRemoved,
    WishlistNameChanged, WishlistUnarchived,
};

/// Who issued a command, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Acting principal. `None` for trusted internal callers.
    pub username: Option<Username>,

    /// Whether the principal has administrative rights.
    pub is_superuser: bool,

    /// When the command was issued.
    pub timestamp: DateTime<Utc>,
}

impl Default for CommandMetadata {
    fn default() -> Self {
        Self {
            username: None,
            is_superuser: false,
            timestamp: Utc::now(),
        }
    }
}

impl CommandMetadata {
    /// Metadata for a command issued by a regular user.
    pub fn by(username: impl Into<Username>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// Metadata for a command issued by a superuser.
    pub fn superuser(username: impl Into<Username>) -> Self {
        Self {
            username: Some(username.into()),
            is_superuser: true,
            ..Self::default()
        }
    }

    /// Returns true if the command may act on resources owned by `owner`.
    pub fn may_act_for(&self, owner: &Username) -> bool {
        match &self.username {
            None => true,
            Some(principal) => self.is_superuser || principal == owner,
        }
    }

    /// Like [`may_act_for`](Self::may_act_for), but fails with `Forbidden`
    /// naming the principal and the attempted action.
    pub fn authorize(&self, owner: &Username, action: &'static str) -> Result<(), DomainError> {
        if self.may_act_for(owner) {
            return Ok(());
        }
        Err(DomainError::Forbidden {
            principal: self
                .username
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            action,
        })
    }
}

/// Implemented by every concrete message struct for the union `U` it belongs to.
///
/// This is the type token the handler registry keys on: `NAME` selects the
/// handler and `try_from_message` recovers the concrete struct.
pub trait MessageType<U>: Into<U> + Sized {
    /// The variant name, identical to the struct name.
    const NAME: &'static str;

    /// Extracts the concrete message, handing the union back on mismatch.
    fn try_from_message(message: U) -> Result<Self, U>;

    /// Borrows the concrete message if the union holds this variant.
    fn try_from_message_ref(message: &U) -> Option<&Self>;
}

macro_rules! message_union {
    (@union $(#[$attr:meta])* $union:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "data")]
        pub enum $union {
            $($variant($variant),)+
        }

        impl $union {
            /// Returns the name of the concrete message type.
            pub fn name(&self) -> &'static str {
                match self {
                    $($union::$variant(_) => stringify!($variant),)+
                }
            }
        }

        $(
            impl From<$variant> for $union {
                fn from(message: $variant) -> Self {
                    $union::$variant(message)
                }
            }

            impl From<$variant> for Message {
                fn from(message: $variant) -> Self {
                    $union::$variant(message).into()
                }
            }

            impl MessageType<$union> for $variant {
                const NAME: &'static str = stringify!($variant);

                #[allow(unreachable_patterns)]
                fn try_from_message(message: $union) -> Result<Self, $union> {
                    match message {
                        $union::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }

                #[allow(unreachable_patterns)]
                fn try_from_message_ref(message: &$union) -> Option<&Self> {
                    match message {
                        $union::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )+
    };

    (commands $(#[$attr:meta])* $union:ident { $($variant:ident),+ $(,)? }) => {
        message_union!(@union $(#[$attr])* $union { $($variant),+ });

        impl $union {
            /// Returns the metadata the command was issued with.
            pub fn metadata(&self) -> &CommandMetadata {
                match self {
                    $($union::$variant(command) => &command.metadata,)+
                }
            }

            /// Returns the metadata for in-place changes.
            pub fn metadata_mut(&mut self) -> &mut CommandMetadata {
                match self {
                    $($union::$variant(command) => &mut command.metadata,)+
                }
            }
        }

        $(
            impl $variant {
                /// Replaces the command metadata.
                pub fn with_metadata(mut self, metadata: CommandMetadata) -> Self {
                    self.metadata = metadata;
                    self
                }
            }
        )+
    };

    (events $(#[$attr:meta])* $union:ident { $($variant:ident),+ $(,)? }) => {
        message_union!(@union $(#[$attr])* $union { $($variant),+ });

        impl DomainEvent for $union {
            fn event_type(&self) -> &'static str {
                self.name()
            }
        }
    };
}

message_union!(commands
    /// A request to change state. Each command type has exactly one handler.
    Command {
        CreateUser,
        GenerateAuthToken,
        ActivateUser,
        ActivateUserWithToken,
        ActivateUserWithCode,
        ResendActivationCode,
        ChangePassword,
        ChangeEmail,
        DeactivateUser,
        AddRoleToUser,
        RemoveRoleFromUser,
        CreateWishlist,
        ChangeWishlistName,
        AddWishlistItem,
        RemoveWishlistItem,
        MarkWishlistItemAsPurchased,
        MarkWishlistItemAsNotPurchased,
        ArchiveWishlist,
        UnarchiveWishlist,
        CreateRole,
        AddPermissionToRole,
        RemovePermissionFromRole,
    }
);

message_union!(events
    /// A fact that already happened. Each event type has zero or more handlers.
    Event {
        UserCreated,
        UserActivated,
        UserDeactivated,
        PasswordChanged,
        EmailChanged,
        RoleAddedToUser,
        RoleRemovedFromUser,
        WishlistCreated,
        WishlistNameChanged,
        WishlistItemAdded,
        WishlistItemRemoved,
        WishlistItemMarkedAsPurchased,
        WishlistItemMarkedAsNotPurchased,
        WishlistArchived,
        WishlistUnarchived,
        RoleCreated,
        PermissionAddedToRole,
        PermissionRemovedFromRole,
    }
);

/// Anything the message bus accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    /// Returns the name of the concrete message type.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(command) => command.name(),
            Message::Event(event) => event.name(),
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}
