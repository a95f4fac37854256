//! Gantry Export
//!
//! Derived artifacts of a flow, none of which mutate it:
//! - [`to_api_definition`]: the gateway API definition a flow describes
//! - [`serialize`] / [`deserialize`]: text adapters for moving flows in and out
//!   of the builder as JSON or YAML documents

mod definition;
mod error;
mod format;

pub use definition::{
  ApiDefinition, DEFAULT_AUTH_TYPE, DEFAULT_LISTEN_PATH, DEFAULT_TARGET_URL, RateLimitConfig,
  to_api_definition,
};
pub use error::ImportError;
pub use format::{FlowFormat, deserialize, serialize};
