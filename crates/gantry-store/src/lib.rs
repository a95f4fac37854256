//! Gantry Store
//!
//! Persistence for flows and their version history.
//!
//! Storage is a plain key-value seam ([`KvStore`]) with two backings:
//! - [`FsKvStore`]: durable, one JSON file per key
//! - [`InMemoryKvStore`]: ephemeral
//!
//! [`SwitchableStore`] routes to one or the other according to the external
//! [`PersistenceMode`](gantry_config::PersistenceMode) toggle, and
//! [`FlowPersistence`] lays flows and history out on top of whichever backing
//! is selected:
//!
//! ```text
//! flow:<flowId>           current flow document
//! flow:<flowId>:history   array of up to 10 snapshots, newest last
//! flows:index             ids of every stored flow
//! ```

mod error;
mod fs;
mod history;
mod kv;
mod persistence;
mod switchable;

pub use error::StoreError;
pub use fs::FsKvStore;
pub use history::HistoryEntry;
pub use kv::{InMemoryKvStore, KvStore};
pub use persistence::{
  DEFAULT_HISTORY_LIMIT, FlowPersistence, FlowSummary, INDEX_KEY, flow_key, history_key,
};
pub use switchable::SwitchableStore;
