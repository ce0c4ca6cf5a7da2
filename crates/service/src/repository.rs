//! Transaction-scoped repositories backed by an identity map.
//!
//! Every aggregate a transaction touches is registered in its repository's
//! [`IdentityMap`] under its id. Later lookups of the same id return the same
//! in-memory instance, so a mutation made through one lookup is visible
//! through every other and its events are recorded exactly once.
//!
//! Listings read rows without locking them. An aggregate that came from a
//! listing is re-read under its row lock the first time it is loaded by id,
//! and before it is written back, so a change another transaction committed
//! in between is never overwritten.

use std::collections::HashSet;

use common::Username;
use common::RoleName;
use domain::{AggregateRoot, DomainError, Event, Role, User, Wishlist};
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use store::Session;

use crate::{Result, ServiceError};

/// An aggregate that can be stored as a JSON row.
pub trait Persistent: AggregateRoot + Serialize + DeserializeOwned {
    /// Table the rows live in.
    const TABLE: &'static str;

    /// The error reported when no row exists for `id`.
    fn not_found(id: &Self::Id) -> DomainError;
}

impl Persistent for User {
    const TABLE: &'static str = "users";

    fn not_found(id: &Username) -> DomainError {
        DomainError::UserNotFound {
            username: id.clone(),
        }
    }
}

impl Persistent for Wishlist {
    const TABLE: &'static str = "wishlists";

    fn not_found(id: &common::WishlistId) -> DomainError {
        DomainError::WishlistNotFound { wishlist_id: *id }
    }
}

impl Persistent for Role {
    const TABLE: &'static str = "roles";

    fn not_found(id: &RoleName) -> DomainError {
        DomainError::RoleNotFound {
            role_name: id.clone(),
        }
    }
}

struct Tracked<A> {
    aggregate: A,
    /// Row as last read from or written to the session.
    snapshot: Value,
    /// Whether the session holds the row lock.
    locked: bool,
}

impl<A: Persistent> Tracked<A> {
    /// Marks the entry locked, given its row as read under the lock.
    ///
    /// An untouched instance is replaced when the row moved on since it was
    /// listed. A touched one cannot be reconciled and fails with
    /// [`ServiceError::StaleAggregate`].
    fn lock_with(&mut self, row: Value) -> Result<()> {
        if row != self.snapshot {
            let touched = self.aggregate.has_pending_events()
                || serde_json::to_value(&self.aggregate)? != self.snapshot;
            if touched {
                return Err(self.stale());
            }
            self.aggregate = serde_json::from_value(row.clone())?;
            self.snapshot = row;
        }
        self.locked = true;
        Ok(())
    }

    fn stale(&self) -> ServiceError {
        ServiceError::StaleAggregate {
            table: A::TABLE,
            id: self.aggregate.id().to_string(),
        }
    }
}

/// Aggregates seen by one transaction, in first-seen order.
pub struct IdentityMap<A: Persistent> {
    entries: IndexMap<A::Id, Tracked<A>>,
}

impl<A: Persistent> Default for IdentityMap<A> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<A: Persistent> IdentityMap<A> {
    /// Returns the number of aggregates seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if an aggregate with `id` has been seen.
    pub fn contains(&self, id: &A::Id) -> bool {
        self.entries.contains_key(id)
    }

    /// Forgets every aggregate, dropping any events they still buffer.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pops the oldest event of the first aggregate that still has one.
    pub(crate) fn pop_event(&mut self) -> Option<Event> {
        self.entries
            .values_mut()
            .find_map(|tracked| tracked.aggregate.pop_event())
    }

    /// Drains every buffered event, aggregate by aggregate.
    pub(crate) fn take_pending(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.pop_event()).collect()
    }

    /// Writes every aggregate whose serialized state differs from its last
    /// known row. Returns the number of rows written.
    ///
    /// A changed aggregate whose row was never locked is only written if the
    /// row still matches what was listed; otherwise the flush fails with
    /// [`ServiceError::StaleAggregate`].
    pub(crate) fn flush<S: Session>(&mut self, session: &mut S) -> Result<usize> {
        let mut written = 0;
        for (id, tracked) in self.entries.iter_mut() {
            let row = serde_json::to_value(&tracked.aggregate)?;
            if row == tracked.snapshot {
                continue;
            }
            let key = id.to_string();
            if !tracked.locked {
                let current = session.fetch_for_update(A::TABLE, &key)?;
                if current.as_ref() != Some(&tracked.snapshot) {
                    tracing::warn!(table = A::TABLE, id = %key, "listed row changed before write");
                    return Err(tracked.stale());
                }
            }
            session.update(A::TABLE, &key, row.clone())?;
            tracked.snapshot = row;
            tracked.locked = true;
            written += 1;
        }
        Ok(written)
    }

    fn register(&mut self, row: Value, locked: bool) -> Result<A::Id> {
        let aggregate: A = serde_json::from_value(row.clone())?;
        let id = aggregate.id().clone();
        self.entries.entry(id.clone()).or_insert(Tracked {
            aggregate,
            snapshot: row,
            locked,
        });
        Ok(id)
    }
}

/// A view of one repository inside a transaction.
///
/// Views are cheap and consumed by each call so the returned references can
/// live as long as the transaction borrow they came from. Obtain a fresh view
/// from the transaction for every operation.
pub struct Repository<'t, A: Persistent, S: Session> {
    map: &'t mut IdentityMap<A>,
    session: &'t mut S,
}

impl<'t, A: Persistent, S: Session> Repository<'t, A, S> {
    pub(crate) fn new(map: &'t mut IdentityMap<A>, session: &'t mut S) -> Self {
        Self { map, session }
    }

    /// Loads an aggregate, locking its row for the rest of the transaction.
    ///
    /// Returns the identity-map instance if the aggregate was already seen.
    /// Fails with the aggregate's not-found error if no row exists.
    pub fn get(mut self, id: &A::Id) -> Result<&'t mut A> {
        if !self.load(id)? {
            return Err(A::not_found(id).into());
        }
        let Self { map, .. } = self;
        map.entries
            .get_mut(id)
            .map(|tracked| &mut tracked.aggregate)
            .ok_or_else(|| A::not_found(id).into())
    }

    /// Returns true if an aggregate with `id` exists.
    ///
    /// An existing aggregate is registered exactly as by [`get`](Self::get).
    pub fn contains(mut self, id: &A::Id) -> Result<bool> {
        self.load(id)
    }

    /// Stages a new aggregate and registers it.
    ///
    /// Fails with `DuplicateKey` if a row with the same id already exists.
    pub fn add(self, aggregate: A) -> Result<&'t mut A> {
        let Self { map, session } = self;
        let id = aggregate.id().clone();
        let row = serde_json::to_value(&aggregate)?;
        session.insert(A::TABLE, &id.to_string(), row.clone())?;
        tracing::trace!(table = A::TABLE, id = %id, "aggregate added");

        let tracked = map.entries.entry(id).or_insert(Tracked {
            aggregate,
            snapshot: row,
            locked: true,
        });
        Ok(&mut tracked.aggregate)
    }

    /// Returns every aggregate in the table.
    pub fn list_all(self) -> Result<Vec<&'t mut A>> {
        self.list_where(|_| true)
    }

    fn list_where(self, mut keep: impl FnMut(&A) -> bool) -> Result<Vec<&'t mut A>> {
        let Self { map, session } = self;
        let rows = session.scan(A::TABLE)?;
        let mut selected = HashSet::new();
        for (_, row) in rows {
            let id = map.register(row, false)?;
            let aggregate = map
                .entries
                .get(&id)
                .map(|tracked| &tracked.aggregate);
            if aggregate.is_some_and(&mut keep) {
                selected.insert(id);
            }
        }

        Ok(map
            .entries
            .iter_mut()
            .filter(|(id, _)| selected.contains(*id))
            .map(|(_, tracked)| &mut tracked.aggregate)
            .collect())
    }

    /// Makes sure `id` is registered and locked. Returns false if no row
    /// exists.
    fn load(&mut self, id: &A::Id) -> Result<bool> {
        if self.map.entries.get(id).is_some_and(|tracked| tracked.locked) {
            return Ok(true);
        }

        let Some(row) = self.session.fetch_for_update(A::TABLE, &id.to_string())? else {
            return Ok(false);
        };
        match self.map.entries.get_mut(id) {
            Some(tracked) => tracked.lock_with(row)?,
            None => {
                self.map.register(row, true)?;
            }
        }
        Ok(true)
    }
}

impl<'t, S: Session> Repository<'t, Wishlist, S> {
    /// Returns every wishlist owned by `owner`.
    pub fn list_owned_by(self, owner: &Username) -> Result<Vec<&'t mut Wishlist>> {
        self.list_where(|wishlist| wishlist.owner() == owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{Backend, InMemoryBackend};

    fn seeded_backend() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();
        Repository::new(&mut users, &mut session)
            .add(User::register("alice", "a@x.com", "hash").unwrap())
            .unwrap();
        session.commit().unwrap();
        backend
    }

    #[test]
    fn get_twice_returns_the_same_instance() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();
        let alice = Username::from("alice");

        let first: *const User = Repository::new(&mut users, &mut session)
            .get(&alice)
            .unwrap();
        let second: *const User = Repository::new(&mut users, &mut session)
            .get(&alice)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        let err = Repository::new(&mut users, &mut session)
            .get(&Username::from("ghost"))
            .unwrap_err();
        assert_eq!(err.kind(), domain::ErrorKind::NotFound);
        assert!(users.is_empty());
    }

    #[test]
    fn flush_writes_only_changed_aggregates() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        Repository::new(&mut users, &mut session)
            .get(&Username::from("alice"))
            .unwrap();
        assert_eq!(users.flush(&mut session).unwrap(), 0);

        Repository::new(&mut users, &mut session)
            .get(&Username::from("alice"))
            .unwrap()
            .activate()
            .unwrap();
        assert_eq!(users.flush(&mut session).unwrap(), 1);
        assert_eq!(users.flush(&mut session).unwrap(), 0);
    }

    #[test]
    fn listing_prefers_identity_map_instances() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        Repository::new(&mut users, &mut session)
            .get(&Username::from("alice"))
            .unwrap()
            .activate()
            .unwrap();

        let listed = Repository::new(&mut users, &mut session).list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_active());
    }

    #[test]
    fn events_pop_aggregate_by_aggregate() {
        let backend = InMemoryBackend::new();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        Repository::new(&mut users, &mut session)
            .add(User::register("alice", "a@x.com", "hash").unwrap())
            .unwrap()
            .activate()
            .unwrap();
        Repository::new(&mut users, &mut session)
            .add(User::register("bob", "b@x.com", "hash").unwrap())
            .unwrap();

        let names: Vec<_> = users.take_pending().iter().map(Event::name).collect();
        assert_eq!(names, vec!["UserCreated", "UserActivated", "UserCreated"]);
        assert!(users.pop_event().is_none());
    }

    fn change_email_elsewhere(backend: &InMemoryBackend, email: &str) {
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();
        Repository::new(&mut users, &mut session)
            .get(&Username::from("alice"))
            .unwrap()
            .change_email(email)
            .unwrap();
        users.flush(&mut session).unwrap();
        session.commit().unwrap();
    }

    #[test]
    fn loading_a_listed_aggregate_picks_up_later_commits() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        let listed = Repository::new(&mut users, &mut session).list_all().unwrap();
        assert_eq!(listed[0].email(), "a@x.com");

        change_email_elsewhere(&backend, "new@x.com");

        let alice = Repository::new(&mut users, &mut session)
            .get(&Username::from("alice"))
            .unwrap();
        assert_eq!(alice.email(), "new@x.com");
        alice.activate().unwrap();
        assert_eq!(users.flush(&mut session).unwrap(), 1);
        session.commit().unwrap();

        let row = backend.committed_row("users", "alice").unwrap();
        assert_eq!(row["email"], "new@x.com");
        assert_eq!(row["is_active"], true);
    }

    #[test]
    fn changed_listed_aggregate_never_overwrites_a_later_commit() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        let mut listed = Repository::new(&mut users, &mut session).list_all().unwrap();
        listed[0].activate().unwrap();

        change_email_elsewhere(&backend, "new@x.com");

        let err = users.flush(&mut session).unwrap_err();
        assert!(matches!(err, ServiceError::StaleAggregate { table: "users", .. }));
        assert_eq!(err.kind(), domain::ErrorKind::Conflict);
        session.rollback();

        let row = backend.committed_row("users", "alice").unwrap();
        assert_eq!(row["email"], "new@x.com");
        assert_eq!(row["is_active"], false);
    }

    #[test]
    fn loading_a_changed_listed_aggregate_after_a_later_commit_fails() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        let mut listed = Repository::new(&mut users, &mut session).list_all().unwrap();
        listed[0].activate().unwrap();

        change_email_elsewhere(&backend, "new@x.com");

        let err = Repository::new(&mut users, &mut session)
            .get(&Username::from("alice"))
            .unwrap_err();
        assert_eq!(err.kind(), domain::ErrorKind::Conflict);
    }

    #[test]
    fn unchanged_listing_writes_after_locking() {
        let backend = seeded_backend();
        let mut session = backend.begin().unwrap();
        let mut users: IdentityMap<User> = IdentityMap::default();

        let mut listed = Repository::new(&mut users, &mut session).list_all().unwrap();
        listed[0].activate().unwrap();
        assert_eq!(users.flush(&mut session).unwrap(), 1);
        session.commit().unwrap();

        assert_eq!(
            backend.committed_row("users", "alice").unwrap()["is_active"],
            true
        );
    }

    #[test]
    fn roles_are_keyed_by_name() {
        let backend = InMemoryBackend::new();
        let mut session = backend.begin().unwrap();
        let mut roles: IdentityMap<Role> = IdentityMap::default();

        Repository::new(&mut roles, &mut session)
            .add(Role::create("editor").unwrap())
            .unwrap();
        assert!(
            Repository::new(&mut roles, &mut session)
                .contains(&RoleName::from("editor"))
                .unwrap()
        );
        let err = Repository::new(&mut roles, &mut session)
            .get(&RoleName::from("viewer"))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::RoleNotFound { .. })
        ));
    }
}
