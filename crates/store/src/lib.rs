//! Backing storage for the wishlist backend.
//!
//! Rows are JSON documents addressed by `(table, key)`. A [`Session`] is one
//! transaction: its writes stay private until [`Session::commit`], and every
//! row it fetches for update stays locked against other sessions until the
//! session ends.

pub mod error;
pub mod memory;
pub mod session;

pub use error::{Result, StoreError};
pub use memory::{InMemoryBackend, InMemorySession};
pub use session::{Backend, Session};
