//! Unit of Work: transaction scope plus the identity maps of every repository.

use std::collections::VecDeque;

use domain::{Event, Role, User, Wishlist};
use store::{Backend, Session};

use crate::Result;
use crate::repository::{IdentityMap, Repository};

/// Owns the repositories' identity maps and opens transactions against a
/// backend.
///
/// One unit of work serves one message-bus operation. Handlers call
/// [`enter`](UnitOfWork::enter) to start a transaction and the bus calls
/// [`collect_new_events`](UnitOfWork::collect_new_events) after every handler
/// to pick up whatever the aggregates recorded.
pub struct UnitOfWork<B: Backend> {
    backend: B,
    users: IdentityMap<User>,
    wishlists: IdentityMap<Wishlist>,
    roles: IdentityMap<Role>,
    /// Events of committed aggregates that were still buffered when the next
    /// transaction started.
    carried: VecDeque<Event>,
    commits: usize,
}

impl<B: Backend> UnitOfWork<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            users: IdentityMap::default(),
            wishlists: IdentityMap::default(),
            roles: IdentityMap::default(),
            carried: VecDeque::new(),
            commits: 0,
        }
    }

    /// Returns the backend transactions are opened against.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Starts a transaction.
    ///
    /// The returned guard rolls back when dropped unless
    /// [`Transaction::commit`] consumed it first.
    pub fn enter(&mut self) -> Result<Transaction<'_, B>> {
        self.carried.extend(self.users.take_pending());
        self.carried.extend(self.wishlists.take_pending());
        self.carried.extend(self.roles.take_pending());
        self.users.clear();
        self.wishlists.clear();
        self.roles.clear();

        let session = self.backend.begin()?;
        tracing::trace!("transaction started");
        Ok(Transaction {
            uow: self,
            session,
            finished: false,
        })
    }

    /// Drains every event the seen aggregates have recorded.
    ///
    /// Carried events come first, then users, wishlists and roles; aggregates in
    /// the order they were first seen and each aggregate's events oldest
    /// first. The iterator is lazy: events it does not yield stay buffered.
    pub fn collect_new_events(&mut self) -> impl Iterator<Item = Event> + '_ {
        std::iter::from_fn(move || {
            self.carried
                .pop_front()
                .or_else(|| self.users.pop_event())
                .or_else(|| self.wishlists.pop_event())
                .or_else(|| self.roles.pop_event())
        })
    }

    /// Drops every pending event without dispatching it. Returns how many
    /// were dropped.
    pub fn discard_new_events(&mut self) -> usize {
        self.collect_new_events().count()
    }

    /// Returns true once any transaction of this unit of work has committed.
    pub fn committed(&self) -> bool {
        self.commits > 0
    }

    /// Returns how many transactions have committed.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

/// An open transaction of a [`UnitOfWork`].
pub struct Transaction<'u, B: Backend> {
    uow: &'u mut UnitOfWork<B>,
    session: B::Session,
    finished: bool,
}

impl<'u, B: Backend> Transaction<'u, B> {
    pub fn users(&mut self) -> Repository<'_, User, B::Session> {
        Repository::new(&mut self.uow.users, &mut self.session)
    }

    pub fn wishlists(&mut self) -> Repository<'_, Wishlist, B::Session> {
        Repository::new(&mut self.uow.wishlists, &mut self.session)
    }

    pub fn roles(&mut self) -> Repository<'_, Role, B::Session> {
        Repository::new(&mut self.uow.roles, &mut self.session)
    }

    /// Writes every changed aggregate and commits the session.
    ///
    /// On failure the transaction is rolled back as if dropped.
    #[tracing::instrument(skip(self))]
    pub fn commit(mut self) -> Result<()> {
        let written = self.uow.users.flush(&mut self.session)?
            + self.uow.wishlists.flush(&mut self.session)?
            + self.uow.roles.flush(&mut self.session)?;
        self.session.commit()?;
        self.finished = true;
        self.uow.commits += 1;
        tracing::debug!(rows = written, "transaction committed");
        Ok(())
    }

    /// Discards every change made in this transaction.
    pub fn rollback(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.session.rollback();
        self.uow.users.clear();
        self.uow.wishlists.clear();
        self.uow.roles.clear();
        tracing::debug!("transaction rolled back");
    }
}

impl<B: Backend> Drop for Transaction<'_, B> {
    fn drop(&mut self) {
        self.abort();
    }
}
