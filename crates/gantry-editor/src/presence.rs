//! Collaborator presence.
//!
//! Presence is cosmetic: who else has the flow open and where their cursor
//! is. It never writes into a flow and is not merged with anything.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use gantry_config::Position;
use gantry_store::StoreError;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One editor's presence on a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
  pub id: String,
  pub name: String,
  /// Display colour, e.g. `#e91e63`.
  pub color: String,
  #[serde(default)]
  pub cursor_position: Option<Position>,
  pub last_active: DateTime<Utc>,
}

/// The set of collaborators to draw over the canvas.
#[derive(Debug, Clone)]
pub struct PresenceOverlay {
  local_id: String,
  entries: Vec<Presence>,
}

impl PresenceOverlay {
  /// An empty overlay for the editor identified by `local_id`.
  pub fn new(local_id: impl Into<String>) -> Self {
    Self {
      local_id: local_id.into(),
      entries: Vec::new(),
    }
  }

  pub fn local_id(&self) -> &str {
    &self.local_id
  }

  /// Replace the overlay contents with a fresh poll result.
  pub fn refresh(&mut self, entries: Vec<Presence>) {
    self.entries = entries;
  }

  /// Collaborators to render, in the order they were reported.
  ///
  /// Excludes the local editor and anyone without a cursor position.
  pub fn list_active_collaborators(&self) -> Vec<&Presence> {
    self
      .entries
      .iter()
      .filter(|p| p.id != self.local_id && p.cursor_position.is_some())
      .collect()
  }
}

/// Where presence data comes from.
#[async_trait]
pub trait PresenceSource: Send + Sync {
  /// Everyone currently present on `flow_id`, local editor included.
  async fn fetch(&self, flow_id: &str) -> Result<Vec<Presence>, StoreError>;
}

/// Seconds an entry counts as present without a fresh announce.
pub const DEFAULT_PRESENCE_TTL_SECS: i64 = 30;

/// Presence held in process memory, one entry list per flow.
///
/// Entries are never written to flow storage. An editor that stops
/// announcing drops out once its `last_active` is older than the TTL.
pub struct PresenceBoard {
  entries: RwLock<HashMap<String, Vec<Presence>>>,
  ttl: TimeDelta,
}

impl Default for PresenceBoard {
  fn default() -> Self {
    Self::new()
  }
}

impl PresenceBoard {
  pub fn new() -> Self {
    Self::with_ttl(TimeDelta::seconds(DEFAULT_PRESENCE_TTL_SECS))
  }

  pub fn with_ttl(ttl: TimeDelta) -> Self {
    Self {
      entries: RwLock::new(HashMap::new()),
      ttl,
    }
  }

  /// Insert or replace `presence` in the flow's entry list.
  pub async fn announce(&self, flow_id: &str, presence: Presence) {
    let mut entries = self.entries.write().await;
    let list = entries.entry(flow_id.to_string()).or_default();
    match list.iter_mut().find(|p| p.id == presence.id) {
      Some(existing) => *existing = presence,
      None => list.push(presence),
    }
  }

  /// Remove an editor from the flow's entry list.
  pub async fn leave(&self, flow_id: &str, editor_id: &str) {
    let mut entries = self.entries.write().await;
    if let Some(list) = entries.get_mut(flow_id) {
      list.retain(|p| p.id != editor_id);
      if list.is_empty() {
        entries.remove(flow_id);
      }
    }
  }

  /// Drop entries older than the TTL, across every flow.
  pub async fn prune(&self) {
    let cutoff = Utc::now() - self.ttl;
    let mut entries = self.entries.write().await;
    for list in entries.values_mut() {
      list.retain(|p| p.last_active >= cutoff);
    }
    entries.retain(|_, list| !list.is_empty());
  }
}

#[async_trait]
impl PresenceSource for PresenceBoard {
  async fn fetch(&self, flow_id: &str) -> Result<Vec<Presence>, StoreError> {
    let cutoff = Utc::now() - self.ttl;
    let entries = self.entries.read().await;
    Ok(
      entries
        .get(flow_id)
        .map(|list| {
          list
            .iter()
            .filter(|p| p.last_active >= cutoff)
            .cloned()
            .collect()
        })
        .unwrap_or_default(),
    )
  }
}

/// Periodically refreshes a [`PresenceOverlay`] and publishes the active
/// collaborators on a watch channel.
pub struct PresencePoller {
  source: Arc<dyn PresenceSource>,
  flow_id: String,
  overlay: PresenceOverlay,
  interval: Duration,
}

impl PresencePoller {
  pub fn new(
    source: Arc<dyn PresenceSource>,
    flow_id: impl Into<String>,
    local_id: impl Into<String>,
    interval: Duration,
  ) -> Self {
    Self {
      source,
      flow_id: flow_id.into(),
      overlay: PresenceOverlay::new(local_id),
      interval,
    }
  }

  /// Poll until `cancel` fires or every receiver is gone.
  ///
  /// A failed fetch keeps the last published list; stale entries are fine.
  pub async fn run(mut self, sender: watch::Sender<Vec<Presence>>, cancel: CancellationToken) {
    info!(flow_id = %self.flow_id, "starting presence poller");
    let mut interval = tokio::time::interval(self.interval);

    loop {
      tokio::select! {
          _ = cancel.cancelled() => {
              info!(flow_id = %self.flow_id, "presence poller cancelled");
              break;
          }
          _ = interval.tick() => {
              match self.source.fetch(&self.flow_id).await {
                  Ok(entries) => {
                      self.overlay.refresh(entries);
                      let active: Vec<Presence> = self
                          .overlay
                          .list_active_collaborators()
                          .into_iter()
                          .cloned()
                          .collect();
                      debug!(flow_id = %self.flow_id, collaborators = active.len(), "presence refreshed");

                      if sender.send(active).is_err() {
                          info!(flow_id = %self.flow_id, "presence receivers dropped");
                          break;
                      }
                  }
                  Err(e) => {
                      warn!(flow_id = %self.flow_id, error = %e, "presence fetch failed");
                  }
              }
          }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn presence(id: &str, cursor: Option<(f64, f64)>) -> Presence {
    Presence {
      id: id.to_string(),
      name: id.to_uppercase(),
      color: "#2196f3".to_string(),
      cursor_position: cursor.map(|(x, y)| Position::new(x, y)),
      last_active: Utc::now(),
    }
  }

  #[test]
  fn test_overlay_filters_local_and_cursorless_entries() {
    let mut overlay = PresenceOverlay::new("me");
    overlay.refresh(vec![
      presence("bob", Some((1.0, 2.0))),
      presence("me", Some((0.0, 0.0))),
      presence("carol", None),
      presence("dave", Some((5.0, 5.0))),
    ]);

    let ids: Vec<_> = overlay
      .list_active_collaborators()
      .iter()
      .map(|p| p.id.as_str())
      .collect();
    assert_eq!(ids, vec!["bob", "dave"]);
  }

  #[test]
  fn test_refresh_replaces_entries() {
    let mut overlay = PresenceOverlay::new("me");
    overlay.refresh(vec![presence("bob", Some((1.0, 1.0)))]);
    overlay.refresh(vec![]);
    assert!(overlay.list_active_collaborators().is_empty());
  }

  #[tokio::test]
  async fn test_board_announce_and_leave() {
    let board = PresenceBoard::new();

    board.announce("flow-1", presence("bob", None)).await;
    board.announce("flow-1", presence("bob", Some((3.0, 4.0)))).await;
    board.announce("flow-1", presence("carol", None)).await;

    let entries = board.fetch("flow-1").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].cursor_position, Some(Position::new(3.0, 4.0)));

    board.leave("flow-1", "bob").await;
    let entries = board.fetch("flow-1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "carol");

    assert!(board.fetch("flow-2").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_stale_entries_are_not_fetched() {
    let board = PresenceBoard::with_ttl(TimeDelta::seconds(30));
    let mut stale = presence("bob", Some((1.0, 1.0)));
    stale.last_active = Utc::now() - TimeDelta::minutes(5);
    board.announce("flow-1", stale).await;
    board.announce("flow-1", presence("carol", Some((2.0, 2.0)))).await;

    let entries = board.fetch("flow-1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "carol");

    board.prune().await;
    assert_eq!(board.entries.read().await["flow-1"].len(), 1);
  }

  #[tokio::test]
  async fn test_prune_drops_flows_with_no_live_entries() {
    let board = PresenceBoard::with_ttl(TimeDelta::seconds(30));
    let mut stale = presence("bob", None);
    stale.last_active = Utc::now() - TimeDelta::hours(1);
    board.announce("flow-1", stale).await;

    board.prune().await;
    assert!(board.entries.read().await.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_poller_publishes_until_cancelled() {
    let source = Arc::new(PresenceBoard::new());
    source.announce("flow-1", presence("bob", Some((1.0, 1.0)))).await;
    source.announce("flow-1", presence("me", Some((2.0, 2.0)))).await;

    let (sender, mut receiver) = watch::channel(Vec::new());
    let cancel = CancellationToken::new();
    let poller = PresencePoller::new(source.clone(), "flow-1", "me", Duration::from_secs(1));
    let handle = tokio::spawn(poller.run(sender, cancel.clone()));

    receiver.changed().await.unwrap();
    let active = receiver.borrow_and_update().clone();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "bob");

    source.leave("flow-1", "bob").await;
    loop {
      receiver.changed().await.unwrap();
      if receiver.borrow_and_update().is_empty() {
        break;
      }
    }

    cancel.cancel();
    handle.await.unwrap();
  }
}
