//! Gantry Flow
//!
//! The node/edge document for one API flow, and the structural mutations the
//! builder applies to it.
//!
//! Invariants held by every mutation in this crate:
//! - edges only reference nodes present in the same flow
//! - deleting a node removes every edge touching it
//! - an edge is only added when the registry allows `source kind -> target kind`
//! - node and edge ids are unique within a flow
//!
//! Mutations that reference a node id which no longer exists are silent
//! no-ops and return `None`; they never raise.

mod error;
mod flow;
mod graph;
mod ids;
mod node;

pub use error::FlowError;
pub use flow::FlowGraph;
pub use graph::Graph;
pub use ids::{copy_id, edge_id, new_flow_id, new_node_id};
pub use node::{Edge, Node};
