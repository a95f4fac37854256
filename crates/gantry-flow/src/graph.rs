use std::collections::{HashMap, HashSet};

use crate::node::{Edge, Node};

/// Adjacency view of a flow, for traversal and analysis.
///
/// Built on demand from the node and edge lists; never stored.
#[derive(Debug, Clone)]
pub struct Graph {
  outgoing: HashMap<String, Vec<String>>,
  incoming: HashMap<String, Vec<String>>,
  /// Nodes nothing points at, in node order.
  roots: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Open,
  Closed,
}

impl Graph {
  pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
    let mut outgoing: HashMap<String, Vec<String>> =
      nodes.iter().map(|n| (n.id.clone(), Vec::new())).collect();
    let mut incoming = outgoing.clone();

    for edge in edges {
      outgoing
        .entry(edge.source.clone())
        .or_default()
        .push(edge.target.clone());
      incoming
        .entry(edge.target.clone())
        .or_default()
        .push(edge.source.clone());
    }

    let roots = nodes
      .iter()
      .filter(|n| incoming.get(&n.id).is_none_or(Vec::is_empty))
      .map(|n| n.id.clone())
      .collect();

    Self {
      outgoing,
      incoming,
      roots,
    }
  }

  /// Nodes with no incoming edges.
  pub fn entry_points(&self) -> &[String] {
    &self.roots
  }

  /// Direct successors of a node. Empty for unknown ids.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self.outgoing.get(node_id).map(Vec::as_slice).unwrap_or_default()
  }

  /// Direct predecessors of a node. Empty for unknown ids.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self.incoming.get(node_id).map(Vec::as_slice).unwrap_or_default()
  }

  /// Whether `to` is reachable from `from` by following edges.
  /// A node always reaches itself.
  pub fn reaches(&self, from: &str, to: &str) -> bool {
    let mut stack = vec![from];
    let mut seen: HashSet<&str> = HashSet::new();

    while let Some(current) = stack.pop() {
      if current == to {
        return true;
      }
      if seen.insert(current) {
        stack.extend(self.downstream(current).iter().map(String::as_str));
      }
    }

    false
  }

  /// Whether any directed cycle exists, self-loops included.
  pub fn has_cycle(&self) -> bool {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    self
      .outgoing
      .keys()
      .any(|id| !marks.contains_key(id.as_str()) && self.visit(id, &mut marks))
  }

  /// Depth-first walk; true when it runs into a node still on the path.
  fn visit<'a>(&'a self, node_id: &'a str, marks: &mut HashMap<&'a str, Mark>) -> bool {
    marks.insert(node_id, Mark::Open);

    for next in self.downstream(node_id) {
      match marks.get(next.as_str()) {
        Some(Mark::Open) => return true,
        Some(Mark::Closed) => {}
        None => {
          if self.visit(next, marks) {
            return true;
          }
        }
      }
    }

    marks.insert(node_id, Mark::Closed);
    false
  }
}
