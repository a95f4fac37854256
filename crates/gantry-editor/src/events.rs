//! Editor events and notifiers.
//!
//! Every user-visible outcome (saved, rejected connection, publish progress,
//! ...) is emitted as an [`EditorEvent`] so the embedding UI can show toasts
//! or progress bars without polling editor state.

use gantry_config::NodeKind;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorEvent {
  NodeAdded { node_id: String, kind: NodeKind },

  NodeDuplicated { node_id: String, copy_id: String },

  NodeDeleted { node_id: String },

  NodeUpdated { node_id: String },

  EdgeConnected { edge_id: String },

  /// A connection attempt was refused. `reason` is human readable.
  ConnectionRejected { reason: String },

  EdgeRemoved { edge_id: String },

  Saved { flow_id: String },

  SaveFailed { flow_id: String, error: String },

  PublishProgress { flow_id: String, progress: u8 },

  Published { flow_id: String },

  Imported { flow_id: String },

  ImportFailed { error: String },
}

/// Trait for receiving editor events.
///
/// The editor calls `notify` for each event; implementations decide what to
/// do with them (render a toast, log, ignore, etc.).
pub trait EditorNotifier: Send + Sync {
  /// Called when an editor event occurs.
  fn notify(&self, event: EditorEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl EditorNotifier for NoopNotifier {
  fn notify(&self, _event: EditorEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded: editing must never wait on a slow toast consumer
  sender: mpsc::UnboundedSender<EditorEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<EditorEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with its receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<EditorEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl EditorNotifier for ChannelNotifier {
  fn notify(&self, event: EditorEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
