use std::fmt;
use std::str::FromStr;

use gantry_flow::FlowGraph;
use gantry_registry::NodeKindRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;

/// Fields a document must expose before it is accepted as a flow.
const REQUIRED_FIELDS: [&str; 3] = ["id", "nodes", "edges"];

/// Text formats a flow can be moved in and out as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowFormat {
  #[default]
  Json,
  Yaml,
}

impl FlowFormat {
  pub fn extension(&self) -> &'static str {
    match self {
      FlowFormat::Json => "json",
      FlowFormat::Yaml => "yaml",
    }
  }
}

impl fmt::Display for FlowFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.extension())
  }
}

impl FromStr for FlowFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "json" => Ok(FlowFormat::Json),
      "yaml" | "yml" => Ok(FlowFormat::Yaml),
      _ => Err(format!("unknown format: {s}")),
    }
  }
}

/// Render a flow as text.
pub fn serialize(flow: &FlowGraph, format: FlowFormat) -> Result<String, ImportError> {
  Ok(match format {
    FlowFormat::Json => serde_json::to_string_pretty(flow)?,
    FlowFormat::Yaml => serde_yaml::to_string(flow)?,
  })
}

/// Parse a flow from text.
///
/// The document must be an object exposing `id`, `nodes` and `edges`, the
/// resulting flow must be structurally valid, and every edge must be allowed
/// by `registry`. Any failure is reported with the underlying message; nothing
/// is partially applied.
pub fn deserialize(
  text: &str,
  format: FlowFormat,
  registry: &NodeKindRegistry,
) -> Result<FlowGraph, ImportError> {
  let value: Value = match format {
    FlowFormat::Json => serde_json::from_str(text)?,
    FlowFormat::Yaml => serde_yaml::from_str(text)?,
  };

  let object = value.as_object().ok_or(ImportError::NotAnObject)?;
  for field in REQUIRED_FIELDS {
    if !object.contains_key(field) {
      return Err(ImportError::MissingField { field });
    }
  }

  let flow: FlowGraph = serde_json::from_value(value)?;
  flow.validate()?;
  flow.validate_connections(registry)?;
  Ok(flow)
}

#[cfg(test)]
mod tests {
  use gantry_config::{ConnectionPolicy, NodeKind, Position};
  use gantry_flow::{Edge, FlowError, Node};

  use super::*;

  fn sample_flow() -> FlowGraph {
    let registry = NodeKindRegistry::standard();
    let mut flow = FlowGraph::new(&registry, "Orders", "alice").unwrap();
    let trigger = flow.first_of_kind(NodeKind::Trigger).unwrap().id.clone();
    let endpoint = Node::create(
      &registry,
      NodeKind::Endpoint,
      Position::new(1.0, 2.0),
      Some("Orders API"),
    )
    .unwrap();
    let endpoint = flow.add_node(endpoint).unwrap().id.clone();
    flow
      .connect(&registry, ConnectionPolicy::default(), &trigger, &endpoint)
      .unwrap();
    flow
  }

  #[test]
  fn test_round_trip_preserves_nodes_and_edges() {
    let flow = sample_flow();
    for format in [FlowFormat::Json, FlowFormat::Yaml] {
      let text = serialize(&flow, format).unwrap();
      let parsed = deserialize(&text, format, &NodeKindRegistry::standard()).unwrap();

      assert_eq!(parsed.id, flow.id, "{format}");
      assert_eq!(parsed.edges, flow.edges, "{format}");
      assert_eq!(parsed.nodes.len(), flow.nodes.len(), "{format}");
      for (a, b) in parsed.nodes.iter().zip(&flow.nodes) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.data, b.data);
      }
    }
  }

  #[test]
  fn test_missing_required_field() {
    let err = deserialize(
      r#"{"id": "f", "nodes": []}"#,
      FlowFormat::Json,
      &NodeKindRegistry::standard(),
    )
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "flow document is missing required field 'edges'"
    );
  }

  #[test]
  fn test_non_object_document() {
    let err = deserialize("- 1\n- 2\n", FlowFormat::Yaml, &NodeKindRegistry::standard()).unwrap_err();
    assert!(matches!(err, ImportError::NotAnObject));
  }

  #[test]
  fn test_malformed_text() {
    let err = deserialize("{not json", FlowFormat::Json, &NodeKindRegistry::standard()).unwrap_err();
    assert!(matches!(err, ImportError::Json(_)));
  }

  #[test]
  fn test_dangling_edge_is_rejected() {
    let mut flow = sample_flow();
    flow.nodes.retain(|n| n.kind != NodeKind::Output);
    let text = serialize(&flow, FlowFormat::Json).unwrap();

    let err = deserialize(&text, FlowFormat::Json, &NodeKindRegistry::standard()).unwrap_err();
    assert!(matches!(err, ImportError::InvalidFlow(_)));
  }

  #[test]
  fn test_edge_outside_allow_list_is_rejected() {
    let mut flow = sample_flow();
    let trigger = flow.first_of_kind(NodeKind::Trigger).unwrap().id.clone();
    let output = flow.first_of_kind(NodeKind::Output).unwrap().id.clone();
    flow.edges.push(Edge::new(&output, &trigger));
    let text = serialize(&flow, FlowFormat::Json).unwrap();

    let err = deserialize(&text, FlowFormat::Json, &NodeKindRegistry::standard()).unwrap_err();
    assert!(matches!(
      err,
      ImportError::InvalidFlow(FlowError::InvalidConnection {
        source_kind: NodeKind::Output,
        target_kind: NodeKind::Trigger,
      })
    ));
    assert_eq!(err.to_string(), "invalid flow: cannot connect output to trigger");
  }

  #[test]
  fn test_format_from_str() {
    assert_eq!("YML".parse::<FlowFormat>(), Ok(FlowFormat::Yaml));
    assert!("xml".parse::<FlowFormat>().is_err());
  }
}
