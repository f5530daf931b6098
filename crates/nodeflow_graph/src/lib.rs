// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph model for the nodeflow canvas.
//!
//! This crate owns the data the interaction layer works on:
//! - Typed coordinate spaces (graph units vs. screen pixels) and the
//!   pan/zoom viewport transform between them
//! - Nodes with typed input/output ports, and directed connections
//! - The [`store::GraphStore`], the single mutable source of truth,
//!   with invariant-preserving mutation operations
//! - A closed vocabulary of mutation events with synchronous, ordered
//!   delivery, which is the contract undo stacks and reactive
//!   consumers build on
//! - Topology queries and the serialization document shapes
//!
//! Everything here is single-threaded by design: operations execute on
//! the host's UI thread and never block.

pub mod connection;
pub mod document;
pub mod event;
pub mod node;
pub mod port;
pub mod space;
pub mod store;
pub mod topology;
pub mod viewport;

pub use connection::{Connection, ConnectionId};
pub use document::GraphDocument;
pub use event::{EventBus, GraphEvent, ListenerId, NodeMove, NodeResize, SessionKind};
pub use node::{Node, NodeId};
pub use port::{Port, PortDirection, PortId};
pub use space::{
    GraphPoint, GraphRect, GraphSize, GraphVector, ScreenPoint, ScreenRect, ScreenSize,
    ScreenVector,
};
pub use store::{ConnectError, GraphStore};
pub use topology::CycleError;
pub use viewport::{Viewport, ZoomLimits};
