//! User aggregate and related types.

mod aggregate;
mod commands;
mod events;

pub use aggregate::User;
pub use commands::*;
pub use events::*;
