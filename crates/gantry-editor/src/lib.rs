//! Gantry Editor
//!
//! The editing session for one flow.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FlowEditor                           │
//! │  - owns the live FlowGraph                                  │
//! │  - node/edge mutations, gated by the kind registry          │
//! │  - save / publish, keyboard shortcut                        │
//! └─────────────────────────────────────────────────────────────┘
//!          │                     │                      │
//!          ▼                     ▼                      ▼
//! ┌──────────────────┐ ┌──────────────────┐ ┌───────────────────┐
//! │ PublishState-    │ │ FlowPersistence  │ │ EditorNotifier    │
//! │ Machine          │ │ (gantry-store)   │ │ (toasts, logs)    │
//! │ clean/dirty/     │ │ save + history   │ │                   │
//! │ publishing       │ │                  │ │                   │
//! └──────────────────┘ └──────────────────┘ └───────────────────┘
//! ```
//!
//! [`PresenceOverlay`] sits beside the editor and never touches the flow.

mod editor;
mod error;
mod events;
mod keymap;
mod presence;
mod publish;

pub use editor::FlowEditor;
pub use error::EditorError;
pub use events::{ChannelNotifier, EditorEvent, EditorNotifier, NoopNotifier};
pub use keymap::{EditorAction, FocusContext, KeyChord, resolve_shortcut};
pub use presence::{
  DEFAULT_PRESENCE_TTL_SECS, Presence, PresenceBoard, PresenceOverlay, PresencePoller,
  PresenceSource,
};
pub use publish::{EditorStatus, PublishStateMachine, PublishStep};
