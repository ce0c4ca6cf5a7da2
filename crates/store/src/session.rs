use serde_json::Value;

use crate::Result;

/// A storage backend able to open transactional sessions.
///
/// Backends are shared between concurrent operations, so implementations
/// must be thread-safe (Send + Sync). Each operation opens its own session.
pub trait Backend: Send + Sync {
    /// The session type produced by this backend.
    type Session: Session;

    /// Opens a new session (begins a transaction).
    fn begin(&self) -> Result<Self::Session>;
}

/// One transaction against a [`Backend`].
///
/// Writes are visible to this session immediately and to other sessions only
/// after [`commit`](Session::commit). Dropping an open session must behave
/// like [`rollback`](Session::rollback).
pub trait Session {
    /// Reads a row and locks it until the session ends.
    ///
    /// Blocks while another session holds the lock. Returns `None` if the row
    /// does not exist.
    fn fetch_for_update(&mut self, table: &str, key: &str) -> Result<Option<Value>>;

    /// Inserts a new row, locking its key.
    ///
    /// Fails with `DuplicateKey` if the row already exists.
    fn insert(&mut self, table: &str, key: &str, row: Value) -> Result<()>;

    /// Replaces an existing row, locking it if not already locked.
    fn update(&mut self, table: &str, key: &str, row: Value) -> Result<()>;

    /// Returns every row of a table, ordered by key, without taking locks.
    fn scan(&mut self, table: &str) -> Result<Vec<(String, Value)>>;

    /// Makes all staged writes durable and releases the session's locks.
    fn commit(&mut self) -> Result<()>;

    /// Discards all staged writes and releases the session's locks.
    ///
    /// Rolling back a closed session is a no-op.
    fn rollback(&mut self);

    /// Returns true until the session is committed or rolled back.
    fn is_open(&self) -> bool;
}
