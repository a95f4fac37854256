use chrono::{DateTime, Utc};
use gantry_flow::FlowGraph;
use serde::{Deserialize, Serialize};

/// An immutable snapshot of a flow taken at a save or publish point.
///
/// Stored as the plain flow document, so history arrays are just arrays of
/// flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry {
  snapshot: FlowGraph,
}

impl HistoryEntry {
  pub fn new(flow: &FlowGraph) -> Self {
    Self {
      snapshot: flow.clone(),
    }
  }

  /// The flow as it was when the snapshot was taken.
  pub fn flow(&self) -> &FlowGraph {
    &self.snapshot
  }

  /// When the snapshotted flow was last updated.
  pub fn saved_at(&self) -> DateTime<Utc> {
    self.snapshot.last_updated
  }

  pub fn published(&self) -> bool {
    self.snapshot.published
  }

  pub fn into_flow(self) -> FlowGraph {
    self.snapshot
  }
}
