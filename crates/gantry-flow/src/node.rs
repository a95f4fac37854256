use gantry_config::{NodeData, NodeKind, Position, label_of};
use gantry_registry::NodeKindRegistry;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::ids::{edge_id, new_node_id};

/// A pipeline stage placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub kind: NodeKind,
  #[serde(default)]
  pub position: Position,
  #[serde(default)]
  pub data: NodeData,
}

impl Node {
  /// Instantiate a node with the kind's defaults and an optional label override.
  pub fn create(
    registry: &NodeKindRegistry,
    kind: NodeKind,
    position: Position,
    label: Option<&str>,
  ) -> Result<Self, FlowError> {
    let mut data = registry
      .defaults_for(kind)
      .cloned()
      .ok_or(FlowError::UnknownKind { kind })?;

    if let Some(label) = label {
      data.insert("label".to_string(), label.into());
    }

    Ok(Self {
      id: new_node_id(kind),
      kind,
      position,
      data,
    })
  }

  /// Display label from the node's data, falling back to its id.
  pub fn label(&self) -> &str {
    label_of(&self.data).unwrap_or(&self.id)
  }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub id: String,
  pub source: String,
  pub target: String,
  /// Render-only.
  #[serde(default)]
  pub animated: bool,
}

impl Edge {
  pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
    let source = source.into();
    let target = target.into();
    Self {
      id: edge_id(&source, &target),
      source,
      target,
      animated: true,
    }
  }

  /// Whether the edge starts or ends at the given node.
  pub fn touches(&self, node_id: &str) -> bool {
    self.source == node_id || self.target == node_id
  }
}
