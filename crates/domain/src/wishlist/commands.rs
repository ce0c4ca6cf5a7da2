//! Wishlist commands.

use common::{ItemId, Username, WishlistId};
use serde::{Deserialize, Serialize};

use super::value_objects::{MeasurementUnit, Priority};
use crate::message::CommandMetadata;

/// Command to create an empty wishlist. The handler returns the new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWishlist {
    pub owner: Username,
    pub name: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl CreateWishlist {
    pub fn new(owner: impl Into<Username>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeWishlistName {
    pub wishlist_id: WishlistId,
    pub new_name: String,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ChangeWishlistName {
    pub fn new(wishlist_id: WishlistId, new_name: impl Into<String>) -> Self {
        Self {
            wishlist_id,
            new_name: new_name.into(),
            metadata: CommandMetadata::default(),
        }
    }
}

/// Command to add an item to a wishlist. The handler returns the new item id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddWishlistItem {
    pub wishlist_id: WishlistId,
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub measurement_unit: MeasurementUnit,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl AddWishlistItem {
    /// Creates the command with the default unit and priority.
    pub fn new(wishlist_id: WishlistId, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            wishlist_id,
            name: name.into(),
            quantity,
            measurement_unit: MeasurementUnit::default(),
            priority: Priority::default(),
            metadata: CommandMetadata::default(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<MeasurementUnit>) -> Self {
        self.measurement_unit = unit.into();
        self
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveWishlistItem {
    pub wishlist_id: WishlistId,
    pub item_id: ItemId,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl RemoveWishlistItem {
    pub fn new(wishlist_id: WishlistId, item_id: ItemId) -> Self {
        Self {
            wishlist_id,
            item_id,
            metadata: CommandMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkWishlistItemAsPurchased {
    pub wishlist_id: WishlistId,
    pub item_id: ItemId,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl MarkWishlistItemAsPurchased {
    pub fn new(wishlist_id: WishlistId, item_id: ItemId) -> Self {
        Self {
            wishlist_id,
            item_id,
            metadata: CommandMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkWishlistItemAsNotPurchased {
    pub wishlist_id: WishlistId,
    pub item_id: ItemId,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl MarkWishlistItemAsNotPurchased {
    pub fn new(wishlist_id: WishlistId, item_id: ItemId) -> Self {
        Self {
            wishlist_id,
            item_id,
            metadata: CommandMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveWishlist {
    pub wishlist_id: WishlistId,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl ArchiveWishlist {
    pub fn new(wishlist_id: WishlistId) -> Self {
        Self {
            wishlist_id,
            metadata: CommandMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnarchiveWishlist {
    pub wishlist_id: WishlistId,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

impl UnarchiveWishlist {
    pub fn new(wishlist_id: WishlistId) -> Self {
        Self {
            wishlist_id,
            metadata: CommandMetadata::default(),
        }
    }
}
