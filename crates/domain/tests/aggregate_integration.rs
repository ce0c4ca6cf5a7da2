//! Integration tests for the User and Wishlist aggregates.
//!
//! These tests exercise the public surface only: behaviour methods, event
//! draining through `AggregateRoot`, and the serialized state that storage
//! backends persist.

use common::{ItemId, Username, WishlistId};
use domain::{
    AggregateRoot, Command, CommandMetadata, DomainError, ErrorKind, Event, MeasurementUnit,
    MessageType, Priority, User, UserCreated, Wishlist, WishlistArchived,
};
use uuid::Uuid;

fn drain<A: AggregateRoot>(aggregate: &mut A) -> Vec<Event> {
    std::iter::from_fn(|| aggregate.pop_event()).collect()
}

mod event_buffer {
    use super::*;

    #[test]
    fn events_drain_in_recording_order_exactly_once() {
        let mut user = User::register("alice", "a@x.com", "hash").unwrap();
        user.activate().unwrap();
        user.change_email("alice@x.com").unwrap();
        user.deactivate().unwrap();

        let names: Vec<_> = drain(&mut user).iter().map(Event::name).collect();
        assert_eq!(
            names,
            vec![
                "UserCreated",
                "UserActivated",
                "EmailChanged",
                "UserDeactivated"
            ]
        );

        assert!(drain(&mut user).is_empty());
        assert!(!user.has_pending_events());
    }

    #[test]
    fn failed_behaviour_records_nothing() {
        let mut user = User::register("alice", "a@x.com", "hash").unwrap();
        drain(&mut user);

        assert!(user.deactivate().is_err());
        assert!(user.change_email("no-at-sign").is_err());
        assert!(!user.has_pending_events());
    }

    #[test]
    fn drained_events_carry_their_payload() {
        let mut user = User::register("alice", "a@x.com", "hash").unwrap();
        let event = user.pop_event().unwrap();

        let created = <UserCreated as MessageType<Event>>::try_from_message(event).unwrap();
        assert_eq!(created.username, Username::from("alice"));
        assert_eq!(created.email, "a@x.com");
    }
}

mod wishlist_lifecycle {
    use super::*;

    #[test]
    fn archive_event_names_the_owner() {
        let id = WishlistId::from_uuid(Uuid::new_v4());
        let mut wishlist = Wishlist::create(id, "alice", "Groceries").unwrap();
        wishlist.archive().unwrap();

        let events = drain(&mut wishlist);
        let archived =
            <WishlistArchived as MessageType<Event>>::try_from_message_ref(&events[1]).unwrap();
        assert_eq!(archived.wishlist_id, id);
        assert_eq!(archived.owner, Username::from("alice"));
    }

    #[test]
    fn serialized_state_round_trips_without_events() {
        let id = WishlistId::from_uuid(Uuid::new_v4());
        let item = ItemId::from_uuid(Uuid::new_v4());
        let mut wishlist = Wishlist::create(id, "alice", "Groceries").unwrap();
        wishlist
            .add_item(item, "Milk", 2, MeasurementUnit::new("l"), Priority::new(1))
            .unwrap();

        let row = serde_json::to_value(&wishlist).unwrap();
        let restored: Wishlist = serde_json::from_value(row.clone()).unwrap();

        assert_eq!(restored.wishlist_id(), id);
        assert_eq!(restored.item(item).unwrap().measurement_unit().as_str(), "l");
        assert!(!restored.has_pending_events());
        assert_eq!(serde_json::to_value(&restored).unwrap(), row);
    }
}

mod errors {
    use super::*;

    #[test]
    fn every_rejection_has_a_kind() {
        let id = WishlistId::from_uuid(Uuid::new_v4());
        let mut wishlist = Wishlist::create(id, "alice", "Groceries").unwrap();

        let missing = wishlist
            .remove_item(ItemId::from_uuid(Uuid::new_v4()))
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let empty = wishlist.change_name("").unwrap_err();
        assert_eq!(empty, DomainError::EmptyName);
        assert_eq!(empty.kind(), ErrorKind::Validation);

        let forbidden = wishlist
            .ensure_accessible_by(&CommandMetadata::by("bob"), "archive wishlist")
            .unwrap_err();
        assert_eq!(forbidden.kind(), ErrorKind::Forbidden);
    }
}

mod serialization {
    use super::*;
    use domain::CreateUser;

    #[test]
    fn commands_deserialize_without_metadata() {
        let json = serde_json::json!({
            "type": "CreateUser",
            "data": {
                "username": "alice",
                "email": "a@x.com",
                "password": "Passw0rd1"
            }
        });

        let command: Command = serde_json::from_value(json).unwrap();
        let create = <CreateUser as MessageType<Command>>::try_from_message(command).unwrap();
        assert_eq!(create.username, Username::from("alice"));
        assert!(create.metadata.username.is_none());
    }
}
