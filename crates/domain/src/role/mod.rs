//! Role aggregate: named sets of permissions granted to users.

mod aggregate;
mod commands;
mod events;
mod value_objects;

pub use aggregate::Role;
pub use commands::*;
pub use events::*;
pub use value_objects::Permission;
