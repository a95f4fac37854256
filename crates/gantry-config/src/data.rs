//! Node configuration documents.
//!
//! Each node carries a free-form JSON object whose shape depends on its kind.
//! For example a trigger holds `{"method": "GET", "path": "/api/v1"}` and a
//! rate limit holds `{"rate": 100, "per": 60}`. Every document also carries a
//! display `label`.

/// Configuration document attached to a node.
pub type NodeData = serde_json::Map<String, serde_json::Value>;

/// Read the display label out of a node's data, if present.
pub fn label_of(data: &NodeData) -> Option<&str> {
  data.get("label").and_then(|v| v.as_str())
}
