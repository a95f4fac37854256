use gantry_config::NodeKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
  /// The target kind is not in the source kind's allow-list.
  #[error("cannot connect {source_kind} to {target_kind}")]
  InvalidConnection {
    source_kind: NodeKind,
    target_kind: NodeKind,
  },

  /// The edge is legal by kind but would close a cycle, and the policy forbids it.
  #[error("connection would create a cycle: {source_id} -> {target_id}")]
  WouldCreateCycle {
    source_id: String,
    target_id: String,
  },

  /// The kind has no entry in the registry.
  #[error("node kind not registered: {kind}")]
  UnknownKind { kind: NodeKind },

  #[error("duplicate node id: {node_id}")]
  DuplicateNodeId { node_id: String },

  #[error("duplicate edge id: {edge_id}")]
  DuplicateEdgeId { edge_id: String },

  /// An edge references a node that is not in the flow.
  #[error("edge '{edge_id}' references unknown node '{node_id}'")]
  InvalidEdge { edge_id: String, node_id: String },
}
