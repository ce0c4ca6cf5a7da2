//! Core aggregate and domain event traits.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use crate::message::Event;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Clone + fmt::Debug + Send + Sync {
    /// Returns the event type name.
    ///
    /// This is the key handlers are registered under.
    fn event_type(&self) -> &'static str;
}

/// Ordered log of events an aggregate recorded but nobody has consumed yet.
///
/// Events only enter the buffer through the owning aggregate's behaviour
/// methods and only leave it, front first, through [`EventBuffer::pop`]. A
/// popped event is gone for good.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBuffer {
    pending: VecDeque<Event>,
}

impl EventBuffer {
    pub(crate) fn record(&mut self, event: impl Into<Event>) {
        self.pending.push_back(event.into());
    }

    /// Removes and returns the oldest pending event.
    pub fn pop(&mut self) -> Option<Event> {
        self.pending.pop_front()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterates over the pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.pending.iter()
    }
}

/// Trait for aggregate roots.
///
/// An aggregate is a cluster of domain objects that can be treated as a single unit.
/// Its behaviour methods enforce invariants, mutate state and record exactly one
/// event per successful change; recorded events wait in the aggregate's
/// [`EventBuffer`] until a unit of work drains them.
pub trait AggregateRoot: Send + Sync {
    /// Stable identity used by repositories and identity maps.
    type Id: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the pending events.
    fn events(&self) -> &EventBuffer;

    /// Returns the pending events for draining.
    fn events_mut(&mut self) -> &mut EventBuffer;

    /// Removes and returns the oldest pending event.
    fn pop_event(&mut self) -> Option<Event> {
        self.events_mut().pop()
    }

    /// Returns true if the aggregate has recorded events nobody drained yet.
    fn has_pending_events(&self) -> bool {
        !self.events().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{PasswordChanged, UserActivated};
    use common::Username;

    #[test]
    fn buffer_pops_in_recording_order() {
        let mut buffer = EventBuffer::default();
        buffer.record(UserActivated {
            username: Username::from("alice"),
        });
        buffer.record(PasswordChanged {
            username: Username::from("alice"),
        });

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.pop().unwrap().event_type(), "UserActivated");
        assert_eq!(buffer.pop().unwrap().event_type(), "PasswordChanged");
        assert!(buffer.pop().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn iter_does_not_consume() {
        let mut buffer = EventBuffer::default();
        buffer.record(UserActivated {
            username: Username::from("alice"),
        });

        assert_eq!(buffer.iter().count(), 1);
        assert_eq!(buffer.len(), 1);
    }
}
