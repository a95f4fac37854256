use std::sync::Arc;

use chrono::Utc;
use gantry_config::{EditorConfig, NodeKind, Position};
use gantry_export::{ApiDefinition, FlowFormat, deserialize, serialize, to_api_definition};
use gantry_flow::{FlowGraph, Node};
use gantry_registry::NodeKindRegistry;
use gantry_store::{FlowPersistence, KvStore};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::EditorError;
use crate::events::{EditorEvent, EditorNotifier, NoopNotifier};
use crate::keymap::{EditorAction, FocusContext, KeyChord, resolve_shortcut};
use crate::publish::{EditorStatus, PublishStateMachine, PublishStep};

/// An editing session over one flow.
///
/// The editor is the single writer for its flow. Mutations are synchronous;
/// save and publish go through [`FlowPersistence`] and report their outcome as
/// [`EditorEvent`]s as well as return values.
///
/// Missing node or edge references are no-ops, never errors.
pub struct FlowEditor<S: KvStore> {
  flow: FlowGraph,
  registry: Arc<NodeKindRegistry>,
  persistence: Arc<FlowPersistence<S>>,
  config: EditorConfig,
  state: PublishStateMachine,
  notifier: Arc<dyn EditorNotifier>,
}

impl<S: KvStore> FlowEditor<S> {
  /// Edit an existing flow document.
  pub fn new(
    flow: FlowGraph,
    registry: Arc<NodeKindRegistry>,
    persistence: Arc<FlowPersistence<S>>,
    config: EditorConfig,
  ) -> Self {
    let state = PublishStateMachine::new(flow.published, config.publish_step);
    Self {
      flow,
      registry,
      persistence,
      config,
      state,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Start a fresh flow (trigger -> output). Nothing is persisted until `save`.
  pub fn create(
    name: impl Into<String>,
    created_by: impl Into<String>,
    registry: Arc<NodeKindRegistry>,
    persistence: Arc<FlowPersistence<S>>,
    config: EditorConfig,
  ) -> Result<Self, EditorError> {
    let flow = FlowGraph::new(&registry, name, created_by)?;
    info!(flow_id = %flow.id, "flow created");
    Ok(Self::new(flow, registry, persistence, config))
  }

  /// Open a stored flow. Returns `None` when no flow has that id.
  pub async fn open(
    flow_id: &str,
    registry: Arc<NodeKindRegistry>,
    persistence: Arc<FlowPersistence<S>>,
    config: EditorConfig,
  ) -> Result<Option<Self>, EditorError> {
    let Some(flow) = persistence.load_flow(flow_id).await? else {
      return Ok(None);
    };
    debug!(flow_id, nodes = flow.nodes.len(), "flow opened");
    Ok(Some(Self::new(flow, registry, persistence, config)))
  }

  /// Route editor events to `notifier`.
  pub fn with_notifier(mut self, notifier: Arc<dyn EditorNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn flow(&self) -> &FlowGraph {
    &self.flow
  }

  pub fn registry(&self) -> &NodeKindRegistry {
    &self.registry
  }

  pub fn config(&self) -> &EditorConfig {
    &self.config
  }

  pub fn status(&self) -> EditorStatus {
    self.state.status()
  }

  pub fn unsaved_changes(&self) -> bool {
    self.state.unsaved_changes()
  }

  pub fn is_publishing(&self) -> bool {
    self.state.is_publishing()
  }

  /// Whether the publish control is enabled.
  pub fn can_publish(&self) -> bool {
    self.state.can_publish()
  }

  /// The gateway definition for the current flow.
  pub fn api_definition(&self) -> ApiDefinition {
    to_api_definition(&self.flow)
  }

  // ---------------------------------------------------------------------------
  // Mutations
  // ---------------------------------------------------------------------------

  /// Add a node of `kind` with the kind's defaults. Returns the new node id.
  pub fn add_node(
    &mut self,
    kind: NodeKind,
    position: Position,
    label: Option<&str>,
  ) -> Result<String, EditorError> {
    let node = Node::create(&self.registry, kind, position, label)?;
    let node_id = self.flow.add_node(node)?.id.clone();

    self.state.mark_dirty();
    self.emit(EditorEvent::NodeAdded {
      node_id: node_id.clone(),
      kind,
    });
    Ok(node_id)
  }

  /// Copy a node, offset by the configured delta. Returns the copy's id.
  pub fn duplicate_node(&mut self, node_id: &str) -> Option<String> {
    let copy_id = self
      .flow
      .duplicate_node(node_id, self.config.duplicate_offset)?
      .id
      .clone();

    self.state.mark_dirty();
    self.emit(EditorEvent::NodeDuplicated {
      node_id: node_id.to_string(),
      copy_id: copy_id.clone(),
    });
    Some(copy_id)
  }

  /// Delete a node along with its edges. Returns whether anything was removed.
  pub fn delete_node(&mut self, node_id: &str) -> bool {
    if self.flow.delete_node(node_id).is_none() {
      return false;
    }

    self.state.mark_dirty();
    self.emit(EditorEvent::NodeDeleted {
      node_id: node_id.to_string(),
    });
    true
  }

  /// Connect two nodes. Returns the new edge id.
  ///
  /// `Ok(None)` when either node is missing or the pair is already connected.
  /// A rejected connection leaves the flow and dirty state untouched and
  /// emits [`EditorEvent::ConnectionRejected`].
  pub fn connect(&mut self, source_id: &str, target_id: &str) -> Result<Option<String>, EditorError> {
    let result = self.flow.connect(
      &self.registry,
      self.config.connection_policy,
      source_id,
      target_id,
    );

    match result {
      Ok(Some(edge)) => {
        let edge_id = edge.id.clone();
        self.state.mark_dirty();
        self.emit(EditorEvent::EdgeConnected {
          edge_id: edge_id.clone(),
        });
        Ok(Some(edge_id))
      }
      Ok(None) => Ok(None),
      Err(e) => {
        debug!(flow_id = %self.flow.id, source_id, target_id, reason = %e, "connection rejected");
        self.emit(EditorEvent::ConnectionRejected {
          reason: e.to_string(),
        });
        Err(e.into())
      }
    }
  }

  /// Remove an edge. Returns whether it existed.
  pub fn disconnect(&mut self, edge_id: &str) -> bool {
    if self.flow.disconnect(edge_id).is_none() {
      return false;
    }

    self.state.mark_dirty();
    self.emit(EditorEvent::EdgeRemoved {
      edge_id: edge_id.to_string(),
    });
    true
  }

  /// Set one field of a node's configuration. Returns whether the node exists.
  pub fn set_node_field(&mut self, node_id: &str, field: &str, value: Value) -> bool {
    let Some(node) = self.flow.nodes.iter_mut().find(|n| n.id == node_id) else {
      return false;
    };
    node.data.insert(field.to_string(), value);

    self.state.mark_dirty();
    self.emit(EditorEvent::NodeUpdated {
      node_id: node_id.to_string(),
    });
    true
  }

  /// Replace the live flow with an imported document.
  ///
  /// On failure the live flow is untouched and the error is both returned
  /// and emitted as [`EditorEvent::ImportFailed`].
  pub fn import(&mut self, text: &str, format: FlowFormat) -> Result<(), EditorError> {
    let mut imported = match deserialize(text, format, &self.registry) {
      Ok(flow) => flow,
      Err(e) => {
        warn!(flow_id = %self.flow.id, error = %e, "import rejected");
        self.emit(EditorEvent::ImportFailed {
          error: e.to_string(),
        });
        return Err(e.into());
      }
    };

    // Publication is a property of what was stored, not of the document
    imported.published = self.flow.published || imported.published;
    if imported.published {
      self.state.mark_published();
    }
    self.flow = imported;

    self.state.mark_dirty();
    self.emit(EditorEvent::Imported {
      flow_id: self.flow.id.clone(),
    });
    Ok(())
  }

  /// Serialize the live flow.
  pub fn export(&self, format: FlowFormat) -> Result<String, EditorError> {
    Ok(serialize(&self.flow, format)?)
  }

  // ---------------------------------------------------------------------------
  // Save / publish
  // ---------------------------------------------------------------------------

  /// Persist the live flow and append it to history.
  ///
  /// Always available, including while a publish is running.
  pub async fn save(&mut self) -> Result<(), EditorError> {
    let revision = self.state.revision();
    self.flow.last_updated = Utc::now();

    match self.persistence.commit(&self.flow).await {
      Ok(()) => {
        self.state.mark_saved(revision);
        info!(flow_id = %self.flow.id, "flow saved");
        self.emit(EditorEvent::Saved {
          flow_id: self.flow.id.clone(),
        });
        Ok(())
      }
      Err(e) => {
        warn!(flow_id = %self.flow.id, error = %e, "save failed");
        self.emit(EditorEvent::SaveFailed {
          flow_id: self.flow.id.clone(),
          error: e.to_string(),
        });
        Err(e.into())
      }
    }
  }

  /// Begin publishing a snapshot of the live flow.
  ///
  /// Drive it with [`tick_publish`](Self::tick_publish), or use
  /// [`publish`](Self::publish) to run the whole timed sequence.
  pub fn start_publish(&mut self) -> Result<(), EditorError> {
    self
      .state
      .begin_publish(self.flow.clone(), self.state.revision())?;
    info!(flow_id = %self.flow.id, "publish started");
    self.emit(EditorEvent::PublishProgress {
      flow_id: self.flow.id.clone(),
      progress: 0,
    });
    Ok(())
  }

  /// Advance the running publish by one step; commits the snapshot at 100.
  pub async fn tick_publish(&mut self) -> Result<EditorStatus, EditorError> {
    match self.state.advance()? {
      PublishStep::Progress(progress) => {
        self.emit(EditorEvent::PublishProgress {
          flow_id: self.flow.id.clone(),
          progress,
        });
      }
      PublishStep::Complete {
        mut snapshot,
        revision,
      } => {
        self.emit(EditorEvent::PublishProgress {
          flow_id: self.flow.id.clone(),
          progress: 100,
        });
        snapshot.last_updated = Utc::now();

        if let Err(e) = self.persistence.commit(&snapshot).await {
          self.state.abort_publish();
          warn!(flow_id = %self.flow.id, error = %e, "publish failed");
          self.emit(EditorEvent::SaveFailed {
            flow_id: self.flow.id.clone(),
            error: e.to_string(),
          });
          return Err(e.into());
        }

        self.state.finish_publish(revision);
        self.flow.published = true;
        if !self.state.unsaved_changes() {
          self.flow.last_updated = snapshot.last_updated;
        }

        info!(flow_id = %self.flow.id, "flow published");
        self.emit(EditorEvent::Published {
          flow_id: self.flow.id.clone(),
        });
      }
    }
    Ok(self.state.status())
  }

  /// Run a complete publish: one step per configured tick until done.
  ///
  /// The sequence cannot be cancelled once started.
  pub async fn publish(&mut self) -> Result<(), EditorError> {
    self.start_publish()?;

    let mut interval = tokio::time::interval(self.config.publish_tick);
    // The first tick completes immediately
    interval.tick().await;

    while self.state.is_publishing() {
      interval.tick().await;
      self.tick_publish().await?;
    }
    Ok(())
  }

  /// Handle a key press. Returns whether it was bound to an action.
  pub async fn on_key(&mut self, chord: KeyChord, focus: FocusContext) -> Result<bool, EditorError> {
    match resolve_shortcut(chord, focus) {
      Some(EditorAction::Save) => {
        self.save().await?;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  fn emit(&self, event: EditorEvent) {
    self.notifier.notify(event);
  }
}
