use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde_json::Value;

use crate::{
    Result, StoreError,
    session::{Backend, Session},
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type Table = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct RowKey {
    table: String,
    key: String,
}

impl RowKey {
    fn new(table: &str, key: &str) -> Self {
        Self {
            table: table.to_string(),
            key: key.to_string(),
        }
    }
}

#[derive(Default)]
struct Shared {
    tables: Mutex<HashMap<String, Table>>,
    /// Row lock table: row -> id of the owning session.
    locks: Mutex<HashMap<RowKey, u64>>,
    released: Condvar,
    next_session: AtomicU64,
}

impl Shared {
    fn acquire(&self, row: &RowKey, session: u64, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut locks = self.locks.lock();
        loop {
            match locks.get(row) {
                None => {
                    locks.insert(row.clone(), session);
                    return Ok(());
                }
                Some(owner) if *owner == session => return Ok(()),
                Some(_) if Instant::now() >= deadline => {
                    tracing::warn!(table = %row.table, key = %row.key, "row lock timeout");
                    return Err(StoreError::LockTimeout {
                        table: row.table.clone(),
                        key: row.key.clone(),
                    });
                }
                Some(_) => {
                    self.released.wait_until(&mut locks, deadline);
                }
            }
        }
    }

    fn release_all(&self, session: u64) {
        let mut locks = self.locks.lock();
        locks.retain(|_, owner| *owner != session);
        self.released.notify_all();
    }
}

/// In-memory backend for tests and single-process deployments.
///
/// Cloning is cheap and every clone shares the same tables, so one backend
/// can serve many concurrent units of work.
#[derive(Clone)]
pub struct InMemoryBackend {
    shared: Arc<Shared>,
    lock_timeout: Duration,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates an empty backend with the default lock timeout.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an empty backend that gives up waiting for a row lock after
    /// `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            lock_timeout,
        }
    }

    /// Returns the number of committed rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.shared
            .tables
            .lock()
            .get(table)
            .map_or(0, BTreeMap::len)
    }

    /// Returns a committed row, bypassing sessions and locks.
    pub fn committed_row(&self, table: &str, key: &str) -> Option<Value> {
        self.shared
            .tables
            .lock()
            .get(table)
            .and_then(|rows| rows.get(key))
            .cloned()
    }
}

impl Backend for InMemoryBackend {
    type Session = InMemorySession;

    fn begin(&self) -> Result<InMemorySession> {
        let id = self.shared.next_session.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(session = id, "session opened");
        Ok(InMemorySession {
            id,
            shared: Arc::clone(&self.shared),
            lock_timeout: self.lock_timeout,
            staged: BTreeMap::new(),
            open: true,
        })
    }
}

/// A transaction against an [`InMemoryBackend`].
pub struct InMemorySession {
    id: u64,
    shared: Arc<Shared>,
    lock_timeout: Duration,
    staged: BTreeMap<RowKey, Value>,
    open: bool,
}

impl InMemorySession {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::TransactionClosed)
        }
    }

    fn read(&self, row: &RowKey) -> Option<Value> {
        if let Some(staged) = self.staged.get(row) {
            return Some(staged.clone());
        }
        self.shared
            .tables
            .lock()
            .get(&row.table)
            .and_then(|rows| rows.get(&row.key))
            .cloned()
    }

    fn finish(&mut self) {
        self.open = false;
        self.staged.clear();
        self.shared.release_all(self.id);
    }
}

impl Session for InMemorySession {
    fn fetch_for_update(&mut self, table: &str, key: &str) -> Result<Option<Value>> {
        self.ensure_open()?;
        let row = RowKey::new(table, key);
        self.shared.acquire(&row, self.id, self.lock_timeout)?;
        Ok(self.read(&row))
    }

    fn insert(&mut self, table: &str, key: &str, value: Value) -> Result<()> {
        self.ensure_open()?;
        let row = RowKey::new(table, key);
        self.shared.acquire(&row, self.id, self.lock_timeout)?;
        if self.read(&row).is_some() {
            return Err(StoreError::DuplicateKey {
                table: row.table,
                key: row.key,
            });
        }
        self.staged.insert(row, value);
        Ok(())
    }

    fn update(&mut self, table: &str, key: &str, value: Value) -> Result<()> {
        self.ensure_open()?;
        let row = RowKey::new(table, key);
        self.shared.acquire(&row, self.id, self.lock_timeout)?;
        if self.read(&row).is_none() {
            return Err(StoreError::RowNotFound {
                table: row.table,
                key: row.key,
            });
        }
        self.staged.insert(row, value);
        Ok(())
    }

    fn scan(&mut self, table: &str) -> Result<Vec<(String, Value)>> {
        self.ensure_open()?;
        let mut rows = self
            .shared
            .tables
            .lock()
            .get(table)
            .cloned()
            .unwrap_or_default();
        for (row, value) in self.staged.iter().filter(|(row, _)| row.table == table) {
            rows.insert(row.key.clone(), value.clone());
        }
        Ok(rows.into_iter().collect())
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let written = self.staged.len();
        {
            let mut tables = self.shared.tables.lock();
            for (row, value) in std::mem::take(&mut self.staged) {
                tables.entry(row.table).or_default().insert(row.key, value);
            }
        }
        self.finish();
        metrics::counter!("store_commits").increment(1);
        tracing::debug!(session = self.id, rows = written, "session committed");
        Ok(())
    }

    fn rollback(&mut self) {
        if !self.open {
            return;
        }
        let discarded = self.staged.len();
        self.finish();
        metrics::counter!("store_rollbacks").increment(1);
        tracing::debug!(session = self.id, rows = discarded, "session rolled back");
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.rollback();
    }
}
