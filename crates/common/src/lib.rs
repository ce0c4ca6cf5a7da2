//! Identifier newtypes shared by every crate in the workspace.

mod types;

pub use types::{ItemId, RoleName, Username, WishlistId};
