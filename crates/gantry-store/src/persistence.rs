use chrono::{DateTime, Utc};
use gantry_flow::FlowGraph;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::history::HistoryEntry;
use crate::kv::KvStore;

/// Key holding the ids of every stored flow.
pub const INDEX_KEY: &str = "flows:index";

/// Default number of history snapshots kept per flow.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Key of a flow document.
pub fn flow_key(flow_id: &str) -> String {
  format!("flow:{flow_id}")
}

/// Key of a flow's history array.
pub fn history_key(flow_id: &str) -> String {
  format!("flow:{flow_id}:history")
}

/// Listing row for a stored flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
  pub id: String,
  pub name: String,
  pub published: bool,
  pub node_count: usize,
  pub last_updated: DateTime<Utc>,
}

impl From<&FlowGraph> for FlowSummary {
  fn from(flow: &FlowGraph) -> Self {
    Self {
      id: flow.id.clone(),
      name: flow.name.clone(),
      published: flow.published,
      node_count: flow.nodes.len(),
      last_updated: flow.last_updated,
    }
  }
}

/// Save/load of flows and their capped version history.
///
/// Writes are whole-document replaces: the last caller to save wins.
pub struct FlowPersistence<S: KvStore> {
  store: S,
  history_limit: usize,
}

impl<S: KvStore> FlowPersistence<S> {
  pub fn new(store: S) -> Self {
    Self::with_history_limit(store, DEFAULT_HISTORY_LIMIT)
  }

  pub fn with_history_limit(store: S, history_limit: usize) -> Self {
    Self {
      store,
      history_limit: history_limit.max(1),
    }
  }

  /// The underlying backing.
  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn history_limit(&self) -> usize {
    self.history_limit
  }

  /// Register the flow in the index, then write its document.
  ///
  /// An error means the document was not written. An index entry without a
  /// document is skipped by `list_flows`.
  pub async fn save_flow(&self, flow: &FlowGraph) -> Result<(), StoreError> {
    let document = serde_json::to_string(flow)?;

    let mut index = self.load_index().await?;
    if !index.contains(&flow.id) {
      index.push(flow.id.clone());
      self.store_index(&index).await?;
    }

    self.store.set(&flow_key(&flow.id), document).await?;

    debug!(flow_id = %flow.id, "flow saved");
    Ok(())
  }

  /// Read a flow document.
  pub async fn load_flow(&self, flow_id: &str) -> Result<Option<FlowGraph>, StoreError> {
    match self.store.get(&flow_key(flow_id)).await? {
      Some(document) => Ok(Some(serde_json::from_str(&document)?)),
      None => Ok(None),
    }
  }

  /// Remove a flow's live record.
  ///
  /// The last stored version is pushed into history first, so a deleted flow
  /// can still be recovered from its history.
  pub async fn delete_flow(&self, flow_id: &str) -> Result<(), StoreError> {
    if let Some(current) = self.load_flow(flow_id).await? {
      self.push_history_best_effort(&current).await;
    }

    self.store.delete(&flow_key(flow_id)).await?;

    let mut index = self.load_index().await?;
    index.retain(|id| id != flow_id);
    self.store_index(&index).await?;

    info!(flow_id, "flow deleted");
    Ok(())
  }

  /// Append a snapshot to the flow's history, evicting the oldest beyond the limit.
  pub async fn push_history(&self, flow: &FlowGraph) -> Result<(), StoreError> {
    let key = history_key(&flow.id);
    let mut entries = self.load_history_raw(&key).await?;

    entries.push(HistoryEntry::new(flow));
    if entries.len() > self.history_limit {
      let excess = entries.len() - self.history_limit;
      entries.drain(..excess);
    }

    self.store.set(&key, serde_json::to_string(&entries)?).await
  }

  /// History for a flow, most recent first.
  pub async fn load_history(&self, flow_id: &str) -> Result<Vec<HistoryEntry>, StoreError> {
    let mut entries = self.load_history_raw(&history_key(flow_id)).await?;
    entries.reverse();
    Ok(entries)
  }

  /// Persist a flow and record it in history.
  ///
  /// Only the flow write can fail the commit. A history failure is logged and
  /// swallowed.
  pub async fn commit(&self, flow: &FlowGraph) -> Result<(), StoreError> {
    self.save_flow(flow).await?;
    self.push_history_best_effort(flow).await;
    Ok(())
  }

  /// Summaries of every stored flow, in creation order.
  pub async fn list_flows(&self) -> Result<Vec<FlowSummary>, StoreError> {
    let mut summaries = Vec::new();
    for flow_id in self.load_index().await? {
      match self.load_flow(&flow_id).await? {
        Some(flow) => summaries.push(FlowSummary::from(&flow)),
        None => warn!(flow_id = %flow_id, "indexed flow has no document"),
      }
    }
    Ok(summaries)
  }

  /// Store an unpublished copy of a flow under a new id.
  pub async fn duplicate_flow(
    &self,
    flow_id: &str,
    name: impl Into<String>,
  ) -> Result<Option<FlowGraph>, StoreError> {
    let Some(flow) = self.load_flow(flow_id).await? else {
      return Ok(None);
    };

    let copy = flow.duplicate(name);
    self.save_flow(&copy).await?;
    info!(flow_id, copy_id = %copy.id, "flow duplicated");
    Ok(Some(copy))
  }

  async fn push_history_best_effort(&self, flow: &FlowGraph) {
    if let Err(e) = self.push_history(flow).await {
      warn!(flow_id = %flow.id, error = %e, "failed to append history snapshot");
    }
  }

  async fn load_history_raw(&self, key: &str) -> Result<Vec<HistoryEntry>, StoreError> {
    match self.store.get(key).await? {
      Some(document) => Ok(serde_json::from_str(&document)?),
      None => Ok(Vec::new()),
    }
  }

  async fn load_index(&self) -> Result<Vec<String>, StoreError> {
    match self.store.get(INDEX_KEY).await? {
      Some(document) => Ok(serde_json::from_str(&document)?),
      None => Ok(Vec::new()),
    }
  }

  async fn store_index(&self, index: &[String]) -> Result<(), StoreError> {
    self.store.set(INDEX_KEY, serde_json::to_string(index)?).await
  }
}

#[cfg(test)]
mod tests {
  use gantry_registry::NodeKindRegistry;

  use super::*;
  use crate::kv::InMemoryKvStore;

  fn new_flow(name: &str) -> FlowGraph {
    FlowGraph::new(&NodeKindRegistry::standard(), name, "tester").unwrap()
  }

  #[test]
  fn test_keys() {
    assert_eq!(flow_key("abc"), "flow:abc");
    assert_eq!(history_key("abc"), "flow:abc:history");
  }

  #[tokio::test]
  async fn test_save_and_load() {
    let persistence = FlowPersistence::new(InMemoryKvStore::new());
    let flow = new_flow("Orders");

    assert_eq!(persistence.load_flow(&flow.id).await.unwrap(), None);
    persistence.save_flow(&flow).await.unwrap();
    assert_eq!(persistence.load_flow(&flow.id).await.unwrap(), Some(flow));
  }

  #[tokio::test]
  async fn test_history_is_stored_newest_last_and_loaded_newest_first() {
    let persistence = FlowPersistence::new(InMemoryKvStore::new());
    let mut flow = new_flow("Orders");

    for name in ["v1", "v2", "v3"] {
      flow.name = name.to_string();
      persistence.push_history(&flow).await.unwrap();
    }

    let raw = persistence
      .store()
      .get(&history_key(&flow.id))
      .await
      .unwrap()
      .unwrap();
    let stored: Vec<FlowGraph> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.last().unwrap().name, "v3");

    let history = persistence.load_history(&flow.id).await.unwrap();
    let names: Vec<_> = history.iter().map(|h| h.flow().name.as_str()).collect();
    assert_eq!(names, vec!["v3", "v2", "v1"]);
  }

  #[tokio::test]
  async fn test_delete_pushes_last_version_into_history() {
    let persistence = FlowPersistence::new(InMemoryKvStore::new());
    let flow = new_flow("Orders");
    persistence.save_flow(&flow).await.unwrap();

    persistence.delete_flow(&flow.id).await.unwrap();

    assert_eq!(persistence.load_flow(&flow.id).await.unwrap(), None);
    let history = persistence.load_history(&flow.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].flow(), &flow);
    assert!(persistence.list_flows().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_list_and_duplicate() {
    let persistence = FlowPersistence::new(InMemoryKvStore::new());
    let mut flow = new_flow("Orders");
    flow.published = true;
    persistence.save_flow(&flow).await.unwrap();
    persistence.save_flow(&flow).await.unwrap();

    let copy = persistence
      .duplicate_flow(&flow.id, "Orders v2")
      .await
      .unwrap()
      .unwrap();
    assert!(!copy.published);

    let listed = persistence.list_flows().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, flow.id);
    assert_eq!(listed[1].name, "Orders v2");

    assert_eq!(persistence.duplicate_flow("missing", "x").await.unwrap(), None);
  }
}
