use gantry_config::NodeKind;
use thiserror::Error;

/// Errors raised while assembling a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  /// The same kind was registered twice.
  #[error("node kind registered twice: {kind}")]
  DuplicateKind { kind: NodeKind },

  /// A kind listed trigger as a downstream target.
  #[error("{kind} lists trigger as a downstream kind; triggers cannot be connection targets")]
  TriggerAsTarget { kind: NodeKind },

  /// Output is terminal and must not allow downstream kinds.
  #[error("output must not allow downstream kinds")]
  OutputNotTerminal,

  /// A default configuration document was not a JSON object.
  #[error("defaults for {kind} must be a JSON object")]
  InvalidDefaults { kind: NodeKind },
}
