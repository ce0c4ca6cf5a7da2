//! Wishlist domain events.

use common::{ItemId, Username, WishlistId};
use serde::{Deserialize, Serialize};

use super::value_objects::{MeasurementUnit, Priority};

/// A wishlist was created for its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistCreated {
    pub wishlist_id: WishlistId,
    pub owner: Username,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistNameChanged {
    pub wishlist_id: WishlistId,
    pub name: String,
}

/// An item was appended to a wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItemAdded {
    pub wishlist_id: WishlistId,
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub measurement_unit: MeasurementUnit,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItemRemoved {
    pub wishlist_id: WishlistId,
    pub item_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItemMarkedAsPurchased {
    pub wishlist_id: WishlistId,
    pub item_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItemMarkedAsNotPurchased {
    pub wishlist_id: WishlistId,
    pub item_id: ItemId,
}

/// A wishlist was archived. Carries the owner so notification handlers
/// need not reload the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistArchived {
    pub wishlist_id: WishlistId,
    pub owner: Username,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistUnarchived {
    pub wishlist_id: WishlistId,
}
