use gantry_flow::FlowError;
use thiserror::Error;

/// Errors surfaced when importing a flow document.
#[derive(Debug, Error)]
pub enum ImportError {
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),

  /// The document parsed but is not an object.
  #[error("flow document must be an object")]
  NotAnObject,

  /// A field every flow must expose is absent.
  #[error("flow document is missing required field '{field}'")]
  MissingField { field: &'static str },

  /// The document describes a structurally broken flow.
  #[error("invalid flow: {0}")]
  InvalidFlow(#[from] FlowError),
}
