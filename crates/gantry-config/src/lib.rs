//! Gantry Config
//!
//! This crate contains the leaf types shared by every other gantry crate:
//! the fixed set of node kinds, canvas positions, node configuration data,
//! and the editor/store configuration structs.
//!
//! Nothing here knows about graphs or persistence. The registry, flow and
//! store crates build on these types.

mod data;
mod editor;
mod kind;
mod position;
mod store;

pub use data::{NodeData, label_of};
pub use editor::{ConnectionPolicy, EditorConfig};
pub use kind::{NodeKind, ParseNodeKindError};
pub use position::Position;
pub use store::{PersistenceMode, StoreConfig};
