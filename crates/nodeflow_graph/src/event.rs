// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed mutation events and the synchronous listener registry.
//!
//! Every committed mutation produces exactly one [`GraphEvent`], emitted
//! synchronously within the mutating call, in invocation order. Each
//! variant carries enough prior-state data for a consumer to construct
//! the inverse operation, which is what undo stacks and reactive
//! re-evaluators build on. The event set is deliberately closed:
//! consumers dispatch with an exhaustive `match`.

use crate::connection::{Connection, ConnectionId};
use crate::document::GraphDocument;
use crate::node::{Node, NodeId};
use crate::port::PortId;
use crate::space::{GraphPoint, GraphSize};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    /// Moving one or more nodes
    NodeDrag,
    /// Resizing a node
    Resize,
    /// Dragging out a new connection
    ConnectionDrag,
    /// Marquee selection
    SelectionBox,
}

/// One node's position before and after a committed drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMove {
    /// Node id
    pub id: NodeId,
    /// Position when the session started
    pub from: GraphPoint,
    /// Position at commit
    pub to: GraphPoint,
}

/// One node's size before and after a committed resize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResize {
    /// Node id
    pub id: NodeId,
    /// Size when the session started
    pub from: GraphSize,
    /// Size at commit
    pub to: GraphSize,
}

/// A committed mutation, with enough prior state to invert it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphEvent {
    /// A node was added to the store.
    NodeAdded {
        /// The node as stored
        node: Node,
    },
    /// A node was removed; its incident connections were removed in the
    /// same atomic step.
    NodeRemoved {
        /// Full copy of the removed node
        node: Node,
        /// Connections removed by the cascade
        connections: Vec<Connection>,
    },
    /// A node moved through a store operation.
    NodeMoved {
        /// Node id
        id: NodeId,
        /// New position
        position: GraphPoint,
        /// Position before the move
        previous_position: GraphPoint,
    },
    /// A node's size changed through a store operation.
    NodeResized {
        /// Node id
        id: NodeId,
        /// New size
        size: GraphSize,
        /// Size before the change
        previous_size: GraphSize,
    },
    /// A node's visibility flag changed.
    NodeVisibilityChanged {
        /// Node id
        id: NodeId,
        /// New visibility
        visible: bool,
    },
    /// A node's lock flag changed.
    NodeLockChanged {
        /// Node id
        id: NodeId,
        /// New lock state
        locked: bool,
    },
    /// A node's group membership changed.
    NodeGroupChanged {
        /// Node id
        id: NodeId,
        /// New group tag
        group: Option<String>,
        /// Group tag before the change
        previous_group: Option<String>,
    },
    /// A node was brought to the front of the z-order.
    NodeRaised {
        /// Node id
        id: NodeId,
        /// New z-index
        z_index: i32,
        /// Z-index before the change
        previous_z_index: i32,
    },
    /// A connection was added.
    ConnectionAdded {
        /// The connection as stored
        connection: Connection,
    },
    /// A connection was removed.
    ConnectionRemoved {
        /// Full copy of the removed connection
        connection: Connection,
    },
    /// The selection changed.
    SelectionChanged {
        /// Selected node ids after the change
        nodes: Vec<NodeId>,
        /// Selected connection ids after the change
        connections: Vec<ConnectionId>,
        /// Selected node ids before the change
        previous_nodes: Vec<NodeId>,
        /// Selected connection ids before the change
        previous_connections: Vec<ConnectionId>,
    },
    /// The viewport changed.
    ViewportChanged {
        /// Viewport after the change
        viewport: Viewport,
        /// Viewport before the change
        previous: Viewport,
    },
    /// The graph was emptied.
    GraphCleared {
        /// Nodes removed by the clear
        nodes: Vec<Node>,
        /// Connections removed by the clear
        connections: Vec<Connection>,
    },
    /// The graph was atomically replaced from a document.
    GraphLoaded {
        /// Snapshot of the store before the load
        previous: GraphDocument,
    },
    /// A node-drag session started.
    DragStarted {
        /// Nodes owned by the session
        ids: Vec<NodeId>,
        /// Session anchor in graph space
        anchor: GraphPoint,
    },
    /// A node-drag session committed.
    DragEnded {
        /// Final positions with their pre-session originals
        moves: Vec<NodeMove>,
    },
    /// A resize session started.
    ResizeStarted {
        /// Nodes owned by the session
        ids: Vec<NodeId>,
        /// Session anchor in graph space
        anchor: GraphPoint,
    },
    /// A resize session committed.
    ResizeEnded {
        /// Final sizes with their pre-session originals
        resizes: Vec<NodeResize>,
    },
    /// A connection-drag session started.
    ConnectStarted {
        /// Node the drag originated from
        node: NodeId,
        /// Port the drag originated from
        port: PortId,
    },
    /// A connection drag ended without committing a connection. Not an
    /// error; hosts use it for user feedback.
    ConnectionDropped {
        /// Node the drag originated from
        node: NodeId,
        /// Port the drag originated from
        port: PortId,
        /// Denial reason, when a validator supplied one
        reason: Option<String>,
    },
    /// A marquee-selection session started.
    MarqueeStarted {
        /// Session anchor in graph space
        anchor: GraphPoint,
    },
    /// An active session was cancelled; any entity state it touched has
    /// been restored, so there is no mutation to invert.
    SessionCancelled {
        /// Kind of the cancelled session
        kind: SessionKind,
    },
}

impl GraphEvent {
    /// Short variant name, mainly for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NodeAdded { .. } => "node_added",
            Self::NodeRemoved { .. } => "node_removed",
            Self::NodeMoved { .. } => "node_moved",
            Self::NodeResized { .. } => "node_resized",
            Self::NodeVisibilityChanged { .. } => "node_visibility_changed",
            Self::NodeLockChanged { .. } => "node_lock_changed",
            Self::NodeGroupChanged { .. } => "node_group_changed",
            Self::NodeRaised { .. } => "node_raised",
            Self::ConnectionAdded { .. } => "connection_added",
            Self::ConnectionRemoved { .. } => "connection_removed",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::ViewportChanged { .. } => "viewport_changed",
            Self::GraphCleared { .. } => "graph_cleared",
            Self::GraphLoaded { .. } => "graph_loaded",
            Self::DragStarted { .. } => "drag_started",
            Self::DragEnded { .. } => "drag_ended",
            Self::ResizeStarted { .. } => "resize_started",
            Self::ResizeEnded { .. } => "resize_ended",
            Self::ConnectStarted { .. } => "connect_started",
            Self::ConnectionDropped { .. } => "connection_dropped",
            Self::MarqueeStarted { .. } => "marquee_started",
            Self::SessionCancelled { .. } => "session_cancelled",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&GraphEvent)>;

/// Ordered listener registry with synchronous delivery.
///
/// Listeners are invoked in registration order. The listener list is
/// snapshotted at the start of each delivery, so registration changes
/// take effect only between deliveries.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it will receive every event emitted after
    /// this call returns.
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(entry, _)| *entry != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver an event to every listener registered at the time of the
    /// call, in registration order.
    pub fn emit(&mut self, event: &GraphEvent) {
        let count = self.listeners.len();
        for index in 0..count {
            (self.listeners[index].1)(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample_event(tag: i32) -> GraphEvent {
        GraphEvent::NodeRaised {
            id: "n".into(),
            z_index: tag,
            previous_z_index: 0,
        }
    }

    #[test]
    fn test_listeners_receive_events_in_registration_order() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut bus = EventBus::new();
        let first = log.clone();
        bus.subscribe(Box::new(move |_| first.borrow_mut().push("first")));
        let second = log.clone();
        bus.subscribe(Box::new(move |_| second.borrow_mut().push("second")));

        bus.emit(&sample_event(1));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let log: Rc<RefCell<Vec<i32>>> = Rc::default();
        let mut bus = EventBus::new();
        let sink = log.clone();
        let id = bus.subscribe(Box::new(move |event| {
            if let GraphEvent::NodeRaised { z_index, .. } = event {
                sink.borrow_mut().push(*z_index);
            }
        }));

        bus.emit(&sample_event(1));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&sample_event(2));
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn test_event_names_are_stable() {
        assert_eq!(sample_event(0).name(), "node_raised");
        let cleared = GraphEvent::GraphCleared {
            nodes: Vec::new(),
            connections: Vec::new(),
        };
        assert_eq!(cleared.name(), "graph_cleared");
    }
}
