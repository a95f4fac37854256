use gantry_export::ImportError;
use gantry_flow::FlowError;
use gantry_store::StoreError;
use thiserror::Error;

/// Errors surfaced by an editor session.
///
/// None of these leave the flow half-modified: every failing operation
/// returns before mutating anything.
#[derive(Debug, Error)]
pub enum EditorError {
  /// A mutation was rejected (illegal connection, unknown kind, ...).
  #[error(transparent)]
  Flow(#[from] FlowError),

  /// The primary write of a save or publish failed.
  #[error("save failed: {0}")]
  Store(#[from] StoreError),

  /// An imported document was rejected.
  #[error("import failed: {0}")]
  Import(#[from] ImportError),

  #[error("a publish is already in progress")]
  AlreadyPublishing,

  /// The publish control is disabled in the current state.
  #[error("publish is not available: nothing has changed since the last save")]
  PublishDisabled,

  #[error("no publish in progress")]
  NotPublishing,
}
