//! Gantry Registry
//!
//! The node kind catalog: for each [`NodeKind`] a display label, a default
//! configuration document, and the ordered list of kinds it may connect to.
//!
//! The registry is an explicitly constructed, immutable value. Callers build
//! one (usually [`NodeKindRegistry::standard`]) and pass it by reference into
//! the graph and validator code; there is no global instance.
//!
//! [`NodeKind`]: gantry_config::NodeKind

mod error;
mod registry;
mod validator;

pub use error::RegistryError;
pub use registry::{KindSpec, NodeKindRegistry, RegistryBuilder};
pub use validator::ConnectionValidator;
