use std::collections::HashSet;

use chrono::{DateTime, Utc};
use gantry_config::{ConnectionPolicy, NodeKind, Position};
use gantry_registry::{ConnectionValidator, NodeKindRegistry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FlowError;
use crate::graph::Graph;
use crate::ids::{copy_id, new_flow_id};
use crate::node::{Edge, Node};

/// The complete node/edge document for one API flow.
///
/// Nodes and edges are kept in insertion order, so anything derived from a
/// flow (exports, listings) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGraph {
  pub id: String,
  pub name: String,
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
  #[serde(default)]
  pub created_by: String,
  pub created_at: DateTime<Utc>,
  pub last_updated: DateTime<Utc>,
  /// Only ever goes false -> true for a given flow.
  #[serde(default)]
  pub published: bool,
}

impl FlowGraph {
  /// A fresh flow: one trigger connected to one output.
  pub fn new(
    registry: &NodeKindRegistry,
    name: impl Into<String>,
    created_by: impl Into<String>,
  ) -> Result<Self, FlowError> {
    let now = Utc::now();
    let trigger = Node::create(registry, NodeKind::Trigger, Position::new(250.0, 50.0), None)?;
    let output = Node::create(registry, NodeKind::Output, Position::new(250.0, 350.0), None)?;
    let edge = Edge::new(&trigger.id, &output.id);

    Ok(Self {
      id: new_flow_id(),
      name: name.into(),
      nodes: vec![trigger, output],
      edges: vec![edge],
      created_by: created_by.into(),
      created_at: now,
      last_updated: now,
      published: false,
    })
  }

  /// Get a node by ID.
  pub fn node(&self, node_id: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  /// Get an edge by ID.
  pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
    self.edges.iter().find(|e| e.id == edge_id)
  }

  /// First node of a kind, in insertion order.
  pub fn first_of_kind(&self, kind: NodeKind) -> Option<&Node> {
    self.nodes.iter().find(|n| n.kind == kind)
  }

  /// Number of nodes of a kind.
  pub fn count_of_kind(&self, kind: NodeKind) -> usize {
    self.nodes.iter().filter(|n| n.kind == kind).count()
  }

  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.nodes, &self.edges)
  }

  /// Append a node. Fails only if its id is already taken.
  pub fn add_node(&mut self, node: Node) -> Result<&Node, FlowError> {
    if self.node(&node.id).is_some() {
      return Err(FlowError::DuplicateNodeId { node_id: node.id });
    }
    debug!(flow_id = %self.id, node_id = %node.id, kind = %node.kind, "node added");
    self.nodes.push(node);
    Ok(&self.nodes[self.nodes.len() - 1])
  }

  /// Copy a node under the id `<id>-copy`, shifted by `offset`.
  ///
  /// If that id is taken the copy becomes `<id>-copy-2`, `<id>-copy-3`, ...
  /// Returns `None` when the node does not exist.
  pub fn duplicate_node(&mut self, node_id: &str, offset: Position) -> Option<&Node> {
    let original = self.node(node_id)?;

    let mut attempt = 1;
    let mut id = copy_id(&original.id, attempt);
    while self.node(&id).is_some() {
      attempt += 1;
      id = copy_id(&original.id, attempt);
    }

    let copy = Node {
      id,
      kind: original.kind,
      position: original.position + offset,
      data: original.data.clone(),
    };

    debug!(flow_id = %self.id, node_id, copy_id = %copy.id, "node duplicated");
    self.nodes.push(copy);
    self.nodes.last()
  }

  /// Remove a node and every edge touching it.
  /// Returns the removed node, or `None` when it does not exist.
  pub fn delete_node(&mut self, node_id: &str) -> Option<Node> {
    let index = self.nodes.iter().position(|n| n.id == node_id)?;
    let node = self.nodes.remove(index);

    let before = self.edges.len();
    self.edges.retain(|e| !e.touches(node_id));

    debug!(
      flow_id = %self.id,
      node_id,
      edges_removed = before - self.edges.len(),
      "node deleted"
    );
    Some(node)
  }

  /// Connect two nodes.
  ///
  /// - `Ok(Some(edge))`: the edge was added
  /// - `Ok(None)`: either id is unknown, or the pair is already connected; nothing changed
  /// - `Err(_)`: the registry or policy rejects the edge; nothing changed
  pub fn connect(
    &mut self,
    registry: &NodeKindRegistry,
    policy: ConnectionPolicy,
    source_id: &str,
    target_id: &str,
  ) -> Result<Option<&Edge>, FlowError> {
    let (Some(source), Some(target)) = (self.node(source_id), self.node(target_id)) else {
      return Ok(None);
    };

    let validator = ConnectionValidator::new(registry);
    if !validator.is_valid(source.kind, target.kind) {
      return Err(FlowError::InvalidConnection {
        source_kind: source.kind,
        target_kind: target.kind,
      });
    }

    if self
      .edges
      .iter()
      .any(|e| e.source == source_id && e.target == target_id)
    {
      return Ok(None);
    }

    if policy.forbid_cycles && self.graph().reaches(target_id, source_id) {
      return Err(FlowError::WouldCreateCycle {
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
      });
    }

    // Ids containing '-' can derive the same edge id for different pairs
    let mut edge = Edge::new(source_id, target_id);
    let base_id = edge.id.clone();
    let mut attempt = 1;
    while self.edge(&edge.id).is_some() {
      attempt += 1;
      edge.id = format!("{base_id}-{attempt}");
    }

    debug!(flow_id = %self.id, edge_id = %edge.id, "edge connected");
    self.edges.push(edge);
    Ok(self.edges.last())
  }

  /// Remove an edge. Returns `None` when it does not exist.
  pub fn disconnect(&mut self, edge_id: &str) -> Option<Edge> {
    let index = self.edges.iter().position(|e| e.id == edge_id)?;
    debug!(flow_id = %self.id, edge_id, "edge removed");
    Some(self.edges.remove(index))
  }

  /// A copy of this flow under a new id and name, unpublished.
  pub fn duplicate(&self, name: impl Into<String>) -> Self {
    let now = Utc::now();
    Self {
      id: new_flow_id(),
      name: name.into(),
      nodes: self.nodes.clone(),
      edges: self.edges.clone(),
      created_by: self.created_by.clone(),
      created_at: now,
      last_updated: now,
      published: false,
    }
  }

  /// Check structural integrity: unique ids and no dangling edges.
  pub fn validate(&self) -> Result<(), FlowError> {
    let mut node_ids = HashSet::new();
    for node in &self.nodes {
      if !node_ids.insert(node.id.as_str()) {
        return Err(FlowError::DuplicateNodeId {
          node_id: node.id.clone(),
        });
      }
    }

    let mut edge_ids = HashSet::new();
    for edge in &self.edges {
      if !edge_ids.insert(edge.id.as_str()) {
        return Err(FlowError::DuplicateEdgeId {
          edge_id: edge.id.clone(),
        });
      }
      for endpoint in [&edge.source, &edge.target] {
        if !node_ids.contains(endpoint.as_str()) {
          return Err(FlowError::InvalidEdge {
            edge_id: edge.id.clone(),
            node_id: endpoint.clone(),
          });
        }
      }
    }

    Ok(())
  }

  /// Check every edge against the registry's allow-lists.
  pub fn validate_connections(&self, registry: &NodeKindRegistry) -> Result<(), FlowError> {
    let validator = ConnectionValidator::new(registry);
    for edge in &self.edges {
      let (Some(source), Some(target)) = (self.node(&edge.source), self.node(&edge.target)) else {
        return Err(FlowError::InvalidEdge {
          edge_id: edge.id.clone(),
          node_id: if self.node(&edge.source).is_none() {
            edge.source.clone()
          } else {
            edge.target.clone()
          },
        });
      };
      if !validator.is_valid(source.kind, target.kind) {
        return Err(FlowError::InvalidConnection {
          source_kind: source.kind,
          target_kind: target.kind,
        });
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_flow() -> (NodeKindRegistry, FlowGraph) {
    let registry = NodeKindRegistry::standard();
    let flow = FlowGraph::new(&registry, "Orders", "alice").unwrap();
    (registry, flow)
  }

  fn add(flow: &mut FlowGraph, registry: &NodeKindRegistry, kind: NodeKind) -> String {
    let node = Node::create(registry, kind, Position::default(), None).unwrap();
    flow.add_node(node).unwrap().id.clone()
  }

  fn trigger_id(flow: &FlowGraph) -> String {
    flow.first_of_kind(NodeKind::Trigger).unwrap().id.clone()
  }

  fn output_id(flow: &FlowGraph) -> String {
    flow.first_of_kind(NodeKind::Output).unwrap().id.clone()
  }

  fn assert_no_dangling_edges(flow: &FlowGraph) {
    for edge in &flow.edges {
      assert!(flow.node(&edge.source).is_some(), "dangling source {}", edge.id);
      assert!(flow.node(&edge.target).is_some(), "dangling target {}", edge.id);
    }
  }

  #[test]
  fn test_new_flow_has_trigger_connected_to_output() {
    let (_, flow) = new_flow();

    assert_eq!(flow.nodes.len(), 2);
    assert_eq!(flow.count_of_kind(NodeKind::Trigger), 1);
    assert_eq!(flow.count_of_kind(NodeKind::Output), 1);
    assert_eq!(flow.edges.len(), 1);
    assert_eq!(flow.edges[0].source, trigger_id(&flow));
    assert_eq!(flow.edges[0].target, output_id(&flow));
    assert!(!flow.published);
    assert!(flow.id.starts_with("flow-"));
    assert!(flow.validate().is_ok());
  }

  #[test]
  fn test_duplicate_node_copies_data_and_offsets_position() {
    let (registry, mut flow) = new_flow();
    let mut node = Node::create(
      &registry,
      NodeKind::RateLimit,
      Position::new(100.0, 200.0),
      None,
    )
    .unwrap();
    node.data.insert("rate".to_string(), 5.into());
    let id = flow.add_node(node).unwrap().id.clone();

    let copy = flow
      .duplicate_node(&id, Position::new(50.0, 50.0))
      .unwrap()
      .clone();

    let original = flow.node(&id).unwrap();
    assert_eq!(copy.id, format!("{id}-copy"));
    assert_eq!(copy.kind, original.kind);
    assert_eq!(copy.data, original.data);
    assert_eq!(copy.position, Position::new(150.0, 250.0));
    assert_eq!(flow.nodes.len(), 4);
  }

  #[test]
  fn test_duplicate_twice_keeps_ids_unique() {
    let (_, mut flow) = new_flow();
    let id = output_id(&flow);

    let first = flow.duplicate_node(&id, Position::default()).unwrap().id.clone();
    let second = flow.duplicate_node(&id, Position::default()).unwrap().id.clone();

    assert_eq!(first, format!("{id}-copy"));
    assert_eq!(second, format!("{id}-copy-2"));
    assert!(flow.validate().is_ok());
  }

  #[test]
  fn test_duplicate_missing_node_is_noop() {
    let (_, mut flow) = new_flow();
    assert!(flow.duplicate_node("nope", Position::default()).is_none());
    assert_eq!(flow.nodes.len(), 2);
  }

  #[test]
  fn test_delete_node_removes_every_touching_edge() {
    let (registry, mut flow) = new_flow();
    let trigger = trigger_id(&flow);
    let output = output_id(&flow);
    let endpoint = add(&mut flow, &registry, NodeKind::Endpoint);
    let cache = add(&mut flow, &registry, NodeKind::Cache);
    let policy = ConnectionPolicy::default();

    flow.connect(&registry, policy, &trigger, &endpoint).unwrap();
    flow.connect(&registry, policy, &endpoint, &output).unwrap();
    flow.connect(&registry, policy, &endpoint, &cache).unwrap();
    flow.connect(&registry, policy, &cache, &output).unwrap();
    assert_eq!(flow.edges.len(), 5);

    let removed = flow.delete_node(&endpoint).unwrap();
    assert_eq!(removed.id, endpoint);
    assert!(flow.node(&endpoint).is_none());
    assert!(flow.edges.iter().all(|e| !e.touches(&endpoint)));
    assert_eq!(flow.edges.len(), 2);
    assert_no_dangling_edges(&flow);
  }

  #[test]
  fn test_delete_missing_node_is_noop() {
    let (_, mut flow) = new_flow();
    assert!(flow.delete_node("nope").is_none());
    assert_eq!(flow.nodes.len(), 2);
    assert_eq!(flow.edges.len(), 1);
  }

  #[test]
  fn test_connect_adds_animated_edge_with_deterministic_id() {
    let (registry, mut flow) = new_flow();
    let trigger = trigger_id(&flow);
    let endpoint = add(&mut flow, &registry, NodeKind::Endpoint);

    let edge = flow
      .connect(&registry, ConnectionPolicy::default(), &trigger, &endpoint)
      .unwrap()
      .unwrap();

    assert_eq!(edge.id, format!("e{trigger}-{endpoint}"));
    assert!(edge.animated);
  }

  #[test]
  fn test_connect_rejects_disallowed_kinds() {
    let (registry, mut flow) = new_flow();
    let output = output_id(&flow);
    let endpoint = add(&mut flow, &registry, NodeKind::Endpoint);

    let err = flow
      .connect(&registry, ConnectionPolicy::default(), &output, &endpoint)
      .unwrap_err();

    assert_eq!(err.to_string(), "cannot connect output to endpoint");
    assert_eq!(flow.edges.len(), 1);
  }

  #[test]
  fn test_connect_unknown_ids_is_silent_noop() {
    let (registry, mut flow) = new_flow();
    let trigger = trigger_id(&flow);

    let result = flow.connect(&registry, ConnectionPolicy::default(), &trigger, "ghost");
    assert_eq!(result, Ok(None));
    assert_eq!(flow.edges.len(), 1);
  }

  #[test]
  fn test_connect_existing_pair_is_noop() {
    let (registry, mut flow) = new_flow();
    let trigger = trigger_id(&flow);
    let output = output_id(&flow);

    let result = flow.connect(&registry, ConnectionPolicy::default(), &trigger, &output);
    assert_eq!(result, Ok(None));
    assert_eq!(flow.edges.len(), 1);
  }

  #[test]
  fn test_connect_pairs_with_colliding_edge_ids() {
    let (registry, mut flow) = new_flow();
    for id in ["a-b", "c", "a", "b-c"] {
      let mut node = Node::create(&registry, NodeKind::Transform, Position::default(), None).unwrap();
      node.id = id.to_string();
      flow.add_node(node).unwrap();
    }

    let policy = ConnectionPolicy::default();
    let first = flow.connect(&registry, policy, "a-b", "c").unwrap().unwrap().id.clone();
    let second = flow.connect(&registry, policy, "a", "b-c").unwrap().unwrap().id.clone();

    assert_eq!(first, "ea-b-c");
    assert_eq!(second, "ea-b-c-2");
    assert_eq!(flow.edges.len(), 3);
    assert_eq!(flow.validate(), Ok(()));

    assert_eq!(flow.connect(&registry, policy, "a", "b-c"), Ok(None));
  }

  #[test]
  fn test_cycles_allowed_by_default_and_rejected_by_policy() {
    let (registry, mut flow) = new_flow();
    let a = add(&mut flow, &registry, NodeKind::Transform);
    let b = add(&mut flow, &registry, NodeKind::Transform);

    let lenient = ConnectionPolicy::default();
    flow.connect(&registry, lenient, &a, &b).unwrap().unwrap();
    let strict = ConnectionPolicy {
      forbid_cycles: true,
    };
    let err = flow.connect(&registry, strict, &b, &a).unwrap_err();
    assert!(matches!(err, FlowError::WouldCreateCycle { .. }));
    assert!(!flow.graph().has_cycle());

    flow.connect(&registry, lenient, &b, &a).unwrap().unwrap();
    assert!(flow.graph().has_cycle());
  }

  #[test]
  fn test_disconnect() {
    let (_, mut flow) = new_flow();
    let edge_id = flow.edges[0].id.clone();

    assert!(flow.disconnect("nope").is_none());
    assert_eq!(flow.disconnect(&edge_id).unwrap().id, edge_id);
    assert!(flow.edges.is_empty());
  }

  #[test]
  fn test_duplicate_flow_is_unpublished_copy() {
    let (_, mut flow) = new_flow();
    flow.published = true;

    let copy = flow.duplicate("Orders (copy)");
    assert_ne!(copy.id, flow.id);
    assert_eq!(copy.name, "Orders (copy)");
    assert_eq!(copy.nodes, flow.nodes);
    assert_eq!(copy.edges, flow.edges);
    assert!(!copy.published);
  }

  #[test]
  fn test_validate_reports_dangling_edge() {
    let (_, mut flow) = new_flow();
    let trigger = trigger_id(&flow);
    flow.edges.push(Edge::new(&trigger, "ghost"));

    let err = flow.validate().unwrap_err();
    assert_eq!(
      err,
      FlowError::InvalidEdge {
        edge_id: format!("e{trigger}-ghost"),
        node_id: "ghost".to_string(),
      }
    );
  }

  #[test]
  fn test_validate_connections_rejects_disallowed_edge() {
    let (registry, mut flow) = new_flow();
    assert_eq!(flow.validate_connections(&registry), Ok(()));

    let trigger = trigger_id(&flow);
    let output = output_id(&flow);
    flow.edges.push(Edge::new(&output, &trigger));

    assert_eq!(flow.validate(), Ok(()));
    assert_eq!(
      flow.validate_connections(&registry),
      Err(FlowError::InvalidConnection {
        source_kind: NodeKind::Output,
        target_kind: NodeKind::Trigger,
      })
    );
  }

  #[test]
  fn test_serialized_field_names() {
    let (_, flow) = new_flow();
    let json = serde_json::to_value(&flow).unwrap();
    assert!(json.get("createdBy").is_some());
    assert!(json.get("lastUpdated").is_some());
    assert_eq!(json["nodes"][0]["kind"], "trigger");
  }
}
