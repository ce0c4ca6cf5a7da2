//! Wishlist aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod value_objects;

pub use aggregate::{Wishlist, WishlistItem};
pub use commands::*;
pub use events::*;
pub use value_objects::{MeasurementUnit, Priority};
