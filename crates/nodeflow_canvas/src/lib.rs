// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interaction engine for the nodeflow canvas.
//!
//! This crate turns pointer input into coherent graph mutations on top
//! of [`nodeflow_graph`]:
//! - [`session`]: the state machines for node drags, resizes,
//!   connection drags, and marquee selection, with undo-ready event
//!   emission
//! - [`visibility`]: axis-aligned culling that keeps rendering and
//!   hit-testing tractable at hundreds to thousands of nodes
//! - [`hit`] and [`layout`]: graph-space hit-testing and the port
//!   geometry seam
//! - [`debounce`]: the quiescence trigger for derived recomputation
//! - [`extension`]: the ordered registry for pluggable behaviors
//! - [`controller`]: the assembled facade hosts embed
//!
//! Everything runs on the host's UI thread; nothing blocks and nothing
//! locks.

pub mod controller;
pub mod debounce;
pub mod extension;
pub mod hit;
pub mod layout;
pub mod session;
pub mod visibility;

pub use controller::{CanvasConfig, CanvasController};
pub use debounce::Debouncer;
pub use extension::{CanvasExtension, ExtensionId, ExtensionRegistry};
pub use layout::{PortLayout, PortLocator};
pub use session::{
    ConnectionRequest, ConnectionValidator, ConnectionVerdict, SessionConfig, SessionError,
    SessionManager,
};
pub use visibility::{
    connections_touching, ChordPathProvider, ConnectionPathProvider, VisibilityIndex,
    VisibilityOptions, VisibleSet,
};
