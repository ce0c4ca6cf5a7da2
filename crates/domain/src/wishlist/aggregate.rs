//! Wishlist aggregate implementation.

use common::{ItemId, Username, WishlistId};
use serde::{Deserialize, Serialize};

use super::events::{
    WishlistArchived, WishlistCreated, WishlistItemAdded, WishlistItemMarkedAsNotPurchased,
    WishlistItemMarkedAsPurchased, WishlistItemRemoved, WishlistNameChanged, WishlistUnarchived,
};
use super::value_objects::{MeasurementUnit, Priority};
use crate::aggregate::{AggregateRoot, EventBuffer};
use crate::error::DomainError;
use crate::message::CommandMetadata;

/// A single entry on a wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    id: ItemId,
    name: String,
    quantity: u32,
    measurement_unit: MeasurementUnit,
    priority: Priority,
    is_purchased: bool,
}

impl WishlistItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn measurement_unit(&self) -> &MeasurementUnit {
        &self.measurement_unit
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_purchased(&self) -> bool {
        self.is_purchased
    }
}

/// Wishlist aggregate root.
///
/// Owns its items; every item change goes through the wishlist so the
/// wishlist's event buffer sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wishlist {
    id: WishlistId,
    owner: Username,
    name: String,
    items: Vec<WishlistItem>,
    is_archived: bool,

    #[serde(skip)]
    events: EventBuffer,
}

impl AggregateRoot for Wishlist {
    type Id = WishlistId;

    fn aggregate_type() -> &'static str {
        "Wishlist"
    }

    fn id(&self) -> &WishlistId {
        &self.id
    }

    fn events(&self) -> &EventBuffer {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

// Query methods
impl Wishlist {
    pub fn wishlist_id(&self) -> WishlistId {
        self.id
    }

    pub fn owner(&self) -> &Username {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn item(&self, item_id: ItemId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn is_archived(&self) -> bool {
        self.is_archived
    }

    /// Fails with `Forbidden` unless the command's principal may act for
    /// this wishlist's owner.
    pub fn ensure_accessible_by(
        &self,
        metadata: &CommandMetadata,
        action: &'static str,
    ) -> Result<(), DomainError> {
        metadata.authorize(&self.owner, action)
    }
}

// Behaviour methods (mutate and record)
impl Wishlist {
    /// Creates an empty wishlist and records `WishlistCreated`.
    pub fn create(
        id: WishlistId,
        owner: impl Into<Username>,
        name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = validate_name(name.into())?;
        let mut wishlist = Self {
            id,
            owner: owner.into(),
            name,
            items: Vec::new(),
            is_archived: false,
            events: EventBuffer::default(),
        };
        wishlist.events.record(WishlistCreated {
            wishlist_id: id,
            owner: wishlist.owner.clone(),
            name: wishlist.name.clone(),
        });
        Ok(wishlist)
    }

    pub fn change_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        self.name = validate_name(name.into())?;
        self.events.record(WishlistNameChanged {
            wishlist_id: self.id,
            name: self.name.clone(),
        });
        Ok(())
    }

    pub fn add_item(
        &mut self,
        item_id: ItemId,
        name: impl Into<String>,
        quantity: u32,
        measurement_unit: MeasurementUnit,
        priority: Priority,
    ) -> Result<(), DomainError> {
        let name = validate_name(name.into())?;
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity });
        }

        self.items.push(WishlistItem {
            id: item_id,
            name: name.clone(),
            quantity,
            measurement_unit: measurement_unit.clone(),
            priority,
            is_purchased: false,
        });
        self.events.record(WishlistItemAdded {
            wishlist_id: self.id,
            item_id,
            name,
            quantity,
            measurement_unit,
            priority,
        });
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: ItemId) -> Result<(), DomainError> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(DomainError::WishlistItemNotFound {
                wishlist_id: self.id,
                item_id,
            })?;
        self.items.remove(position);
        self.events.record(WishlistItemRemoved {
            wishlist_id: self.id,
            item_id,
        });
        Ok(())
    }

    pub fn mark_item_as_purchased(&mut self, item_id: ItemId) -> Result<(), DomainError> {
        let item = self.item_mut(item_id)?;
        if item.is_purchased {
            return Err(DomainError::ItemAlreadyPurchased { item_id });
        }
        item.is_purchased = true;
        self.events.record(WishlistItemMarkedAsPurchased {
            wishlist_id: self.id,
            item_id,
        });
        Ok(())
    }

    pub fn mark_item_as_not_purchased(&mut self, item_id: ItemId) -> Result<(), DomainError> {
        let item = self.item_mut(item_id)?;
        if !item.is_purchased {
            return Err(DomainError::ItemNotPurchased { item_id });
        }
        item.is_purchased = false;
        self.events.record(WishlistItemMarkedAsNotPurchased {
            wishlist_id: self.id,
            item_id,
        });
        Ok(())
    }

    pub fn archive(&mut self) -> Result<(), DomainError> {
        if self.is_archived {
            return Err(DomainError::WishlistAlreadyArchived {
                wishlist_id: self.id,
            });
        }
        self.is_archived = true;
        self.events.record(WishlistArchived {
            wishlist_id: self.id,
            owner: self.owner.clone(),
        });
        Ok(())
    }

    pub fn unarchive(&mut self) -> Result<(), DomainError> {
        if !self.is_archived {
            return Err(DomainError::WishlistNotArchived {
                wishlist_id: self.id,
            });
        }
        self.is_archived = false;
        self.events.record(WishlistUnarchived {
            wishlist_id: self.id,
        });
        Ok(())
    }

    fn item_mut(&mut self, item_id: ItemId) -> Result<&mut WishlistItem, DomainError> {
        let wishlist_id = self.id;
        self.items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(DomainError::WishlistItemNotFound {
                wishlist_id,
                item_id,
            })
    }
}

fn validate_name(name: String) -> Result<String, DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::EmptyName);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;
    use uuid::Uuid;

    fn wishlist() -> Wishlist {
        Wishlist::create(WishlistId::from_uuid(Uuid::new_v4()), "alice", "Birthday").unwrap()
    }

    fn item_id() -> ItemId {
        ItemId::from_uuid(Uuid::new_v4())
    }

    fn drain(wishlist: &mut Wishlist) -> Vec<&'static str> {
        std::iter::from_fn(|| wishlist.pop_event())
            .map(|event| event.event_type())
            .collect()
    }

    #[test]
    fn create_records_wishlist_created() {
        let mut wishlist = wishlist();
        assert_eq!(drain(&mut wishlist), vec!["WishlistCreated"]);
        assert!(!wishlist.is_archived());
        assert!(wishlist.items().is_empty());
    }

    #[test]
    fn create_rejects_blank_name() {
        let result = Wishlist::create(WishlistId::from_uuid(Uuid::new_v4()), "alice", "  ");
        assert!(matches!(result, Err(DomainError::EmptyName)));
    }

    #[test]
    fn item_lifecycle() {
        let mut wishlist = wishlist();
        let id = item_id();

        wishlist
            .add_item(id, "Book", 2, MeasurementUnit::default(), Priority::new(3))
            .unwrap();
        wishlist.mark_item_as_purchased(id).unwrap();
        assert!(wishlist.item(id).unwrap().is_purchased());
        wishlist.mark_item_as_not_purchased(id).unwrap();
        wishlist.remove_item(id).unwrap();

        assert_eq!(
            drain(&mut wishlist),
            vec![
                "WishlistCreated",
                "WishlistItemAdded",
                "WishlistItemMarkedAsPurchased",
                "WishlistItemMarkedAsNotPurchased",
                "WishlistItemRemoved",
            ]
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut wishlist = wishlist();
        let result = wishlist.add_item(
            item_id(),
            "Book",
            0,
            MeasurementUnit::default(),
            Priority::default(),
        );
        assert!(matches!(
            result,
            Err(DomainError::InvalidQuantity { quantity: 0 })
        ));
        assert_eq!(wishlist.events().len(), 1);
    }

    #[test]
    fn missing_item_is_not_found() {
        let mut wishlist = wishlist();
        let id = item_id();

        assert!(matches!(
            wishlist.remove_item(id),
            Err(DomainError::WishlistItemNotFound { .. })
        ));
        assert!(matches!(
            wishlist.mark_item_as_purchased(id),
            Err(DomainError::WishlistItemNotFound { .. })
        ));
    }

    #[test]
    fn purchasing_twice_conflicts() {
        let mut wishlist = wishlist();
        let id = item_id();
        wishlist
            .add_item(id, "Book", 1, MeasurementUnit::default(), Priority::default())
            .unwrap();
        wishlist.mark_item_as_purchased(id).unwrap();

        let result = wishlist.mark_item_as_purchased(id);
        assert!(matches!(
            result,
            Err(DomainError::ItemAlreadyPurchased { .. })
        ));
    }

    #[test]
    fn archive_and_unarchive_guard_state() {
        let mut wishlist = wishlist();

        assert!(wishlist.unarchive().is_err());
        wishlist.archive().unwrap();
        assert!(wishlist.is_archived());
        assert!(matches!(
            wishlist.archive(),
            Err(DomainError::WishlistAlreadyArchived { .. })
        ));
        wishlist.unarchive().unwrap();
        assert!(!wishlist.is_archived());
    }

    #[test]
    fn access_is_limited_to_owner_and_superusers() {
        let wishlist = wishlist();

        assert!(wishlist
            .ensure_accessible_by(&CommandMetadata::by("alice"), "rename wishlist")
            .is_ok());
        assert!(wishlist
            .ensure_accessible_by(&CommandMetadata::superuser("root"), "rename wishlist")
            .is_ok());

        let err = wishlist
            .ensure_accessible_by(&CommandMetadata::by("mallory"), "rename wishlist")
            .unwrap_err();
        assert_eq!(err.to_string(), "mallory is not allowed to rename wishlist");
    }
}
