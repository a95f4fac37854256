//! Identifier generation.
//!
//! Flow and node ids are UUID-based so uniqueness does not depend on luck.
//! Edge and copy ids are derived from the ids they relate to.

use gantry_config::NodeKind;
use uuid::Uuid;

/// Fresh id for a flow.
pub fn new_flow_id() -> String {
  format!("flow-{}", Uuid::new_v4().simple())
}

/// Fresh id for a node of the given kind, e.g. `endpoint-1f0c...`.
pub fn new_node_id(kind: NodeKind) -> String {
  format!("{}-{}", kind.as_str(), Uuid::new_v4().simple())
}

/// Deterministic edge id for a source/target pair.
pub fn edge_id(source_id: &str, target_id: &str) -> String {
  format!("e{source_id}-{target_id}")
}

/// Id for the `attempt`-th copy of a node: `<id>-copy`, then `<id>-copy-2`, ...
pub fn copy_id(original_id: &str, attempt: usize) -> String {
  if attempt <= 1 {
    format!("{original_id}-copy")
  } else {
    format!("{original_id}-copy-{attempt}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_edge_id_format() {
    assert_eq!(edge_id("a", "b"), "ea-b");
  }

  #[test]
  fn test_copy_id_sequence() {
    assert_eq!(copy_id("n1", 1), "n1-copy");
    assert_eq!(copy_id("n1", 2), "n1-copy-2");
  }

  #[test]
  fn test_node_ids_are_prefixed_and_unique() {
    let a = new_node_id(NodeKind::RateLimit);
    let b = new_node_id(NodeKind::RateLimit);
    assert!(a.starts_with("rate_limit-"));
    assert_ne!(a, b);
  }
}
