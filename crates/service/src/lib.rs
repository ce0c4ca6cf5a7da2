//! Service layer for the wishlist backend.
//!
//! This crate provides:
//! - Transaction-scoped repositories with an identity map
//! - The Unit of Work that owns them
//! - The Messagebus and its handler registry
//! - User and wishlist handlers, wired by [`bootstrap::bootstrap`]
//! - Collaborator interfaces with real and fake implementations
//! - Configuration and tracing setup

pub mod bootstrap;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod handlers;
pub mod messagebus;
pub mod registry;
pub mod repository;
pub mod telemetry;
pub mod unit_of_work;

pub use bootstrap::{bootstrap, new_bus};
pub use config::Config;
pub use dependencies::Dependencies;
pub use error::{NotificationError, Result, ServiceError, TokenError};
pub use messagebus::{CommandOutput, HandlerFailure, Messagebus};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use repository::{IdentityMap, Persistent, Repository};
pub use unit_of_work::{Transaction, UnitOfWork};
