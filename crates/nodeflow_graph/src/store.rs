// SPDX-License-Identifier: MIT OR Apache-2.0
//! The authoritative graph store: nodes, connections, selection.
//!
//! The store is the single mutable source of truth. Every mutation goes
//! through the operations below; each successful mutation emits exactly
//! one [`GraphEvent`] synchronously before the call returns. Operations
//! on ids that do not exist are no-ops signalled through the return
//! value, never a panic: this code runs inside input-handling paths
//! where a fault would destroy an in-flight gesture.
//!
//! Invariants maintained here:
//! - node and connection ids are unique; duplicate adds are rejected
//! - connection endpoints always reference present nodes; removing a
//!   node cascades to its incident connections in one atomic step
//! - node selection and connection selection are mutually exclusive;
//!   removing an entity removes it from the selection

use crate::connection::{Connection, ConnectionId};
use crate::document::{ConnectionRecord, GraphDocument, NodeRecord};
use crate::event::{EventBus, GraphEvent, ListenerId};
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortId};
use crate::space::{GraphPoint, GraphSize, GraphVector};
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Error when creating a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Referenced node not found
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Referenced port not found on its node
    #[error("port not found: {0}")]
    PortNotFound(PortId),

    /// A connection with this id already exists
    #[error("duplicate connection id: {0}")]
    DuplicateId(ConnectionId),

    /// Ports have the wrong directions or incompatible data types
    #[error("incompatible ports")]
    IncompatiblePorts,

    /// Target input accepts a single connection and already has one
    #[error("input port already connected: {0}")]
    PortOccupied(PortId),

    /// Source and target are the same node
    #[error("self-connection not allowed")]
    SelfLoop,
}

/// Owns the node/connection sets and the selection state.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,
    connections: IndexMap<ConnectionId, Connection>,
    selected_nodes: IndexSet<NodeId>,
    selected_connections: IndexSet<ConnectionId>,
    events: EventBus,
}

impl GraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // --- events -----------------------------------------------------

    /// Register an event listener; it receives every subsequent event in
    /// emission order.
    pub fn subscribe(&mut self, listener: Box<dyn FnMut(&GraphEvent)>) -> ListenerId {
        self.events.subscribe(listener)
    }

    /// Remove an event listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Deliver an event to every listener.
    ///
    /// Exposed for the interaction layer, which reports session
    /// lifecycle and viewport changes through the same ordered stream.
    pub fn emit(&mut self, event: GraphEvent) {
        trace!(event = event.name(), "emit");
        self.events.emit(&event);
    }

    // --- nodes ------------------------------------------------------

    /// Add a node. Rejected (returning `false`) when a node with the
    /// same id already exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            debug!(node = %node.id, "add_node rejected: duplicate id");
            return false;
        }
        self.nodes.insert(node.id.clone(), node.clone());
        self.emit(GraphEvent::NodeAdded { node });
        true
    }

    /// Remove a node, cascading to every connection that references it,
    /// as a single atomic step. The selection drops the removed ids
    /// without a separate selection event; the emitted [`GraphEvent::NodeRemoved`]
    /// carries full copies of everything removed.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(id)?;
        let removed: Vec<Connection> = self
            .connections
            .values()
            .filter(|c| c.involves_node(id))
            .cloned()
            .collect();
        for connection in &removed {
            self.connections.shift_remove(&connection.id);
            self.selected_connections.shift_remove(&connection.id);
        }
        self.selected_nodes.shift_remove(id);
        debug!(node = %id, cascaded = removed.len(), "node removed");
        self.emit(GraphEvent::NodeRemoved {
            node: node.clone(),
            connections: removed,
        });
        Some(node)
    }

    /// Translate a node by a graph-space delta.
    pub fn move_node(&mut self, id: &NodeId, delta: GraphVector) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let previous_position = node.position;
        node.position += delta;
        let position = node.position;
        self.emit(GraphEvent::NodeMoved {
            id: id.clone(),
            position,
            previous_position,
        });
        true
    }

    /// Set a node's absolute position.
    pub fn set_node_position(&mut self, id: &NodeId, position: GraphPoint) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let previous_position = node.position;
        node.position = position;
        self.emit(GraphEvent::NodeMoved {
            id: id.clone(),
            position,
            previous_position,
        });
        true
    }

    /// Set a node's size. Negative extents are clamped to zero.
    pub fn set_node_size(&mut self, id: &NodeId, size: GraphSize) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let size = GraphSize::new(size.width.max(0.0), size.height.max(0.0));
        let previous_size = node.size;
        node.size = size;
        self.emit(GraphEvent::NodeResized {
            id: id.clone(),
            size,
            previous_size,
        });
        true
    }

    /// Set a node's visibility flag. Setting the current value is a
    /// no-op without an event.
    pub fn set_node_visibility(&mut self, id: &NodeId, visible: bool) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if node.visible == visible {
            return false;
        }
        node.visible = visible;
        self.emit(GraphEvent::NodeVisibilityChanged {
            id: id.clone(),
            visible,
        });
        true
    }

    /// Set a node's lock flag. Setting the current value is a no-op
    /// without an event.
    pub fn set_node_locked(&mut self, id: &NodeId, locked: bool) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if node.locked == locked {
            return false;
        }
        node.locked = locked;
        self.emit(GraphEvent::NodeLockChanged {
            id: id.clone(),
            locked,
        });
        true
    }

    /// Set a node's group membership tag.
    pub fn set_node_group(&mut self, id: &NodeId, group: Option<String>) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if node.group == group {
            return false;
        }
        let previous_group = node.group.take();
        node.group = group.clone();
        self.emit(GraphEvent::NodeGroupChanged {
            id: id.clone(),
            group,
            previous_group,
        });
        true
    }

    /// Reassign a node's z-index to one above the current maximum.
    pub fn bring_to_front(&mut self, id: &NodeId) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        let top = self.nodes.values().map(|n| n.z_index).max().unwrap_or(0);
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let previous_z_index = node.z_index;
        node.z_index = top + 1;
        self.emit(GraphEvent::NodeRaised {
            id: id.clone(),
            z_index: top + 1,
            previous_z_index,
        });
        true
    }

    /// Get a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access to a node.
    ///
    /// This is the sanctioned escape hatch for the interaction layer: an
    /// active session transiently owns `position`, `size`, `selected`,
    /// and `dragging` and writes them directly while it runs, reporting
    /// the net change through its own session events. All other writes
    /// must go through store operations so the event stream stays
    /// complete.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- connections ------------------------------------------------

    /// Create and add a connection between an output port and an input
    /// port, generating a fresh id.
    pub fn connect(
        &mut self,
        source_node: &NodeId,
        source_port: &PortId,
        target_node: &NodeId,
        target_port: &PortId,
    ) -> Result<ConnectionId, ConnectError> {
        self.add_connection(Connection::new(
            source_node.clone(),
            source_port.clone(),
            target_node.clone(),
            target_port.clone(),
        ))
    }

    /// Add a pre-built connection after validating it: unique id, both
    /// endpoints present, output-to-input direction, compatible data
    /// types, and a free target input unless it accepts fan-in.
    pub fn add_connection(&mut self, connection: Connection) -> Result<ConnectionId, ConnectError> {
        if self.connections.contains_key(&connection.id) {
            return Err(ConnectError::DuplicateId(connection.id));
        }
        if connection.source_node == connection.target_node {
            return Err(ConnectError::SelfLoop);
        }
        let source = self
            .nodes
            .get(&connection.source_node)
            .ok_or_else(|| ConnectError::NodeNotFound(connection.source_node.clone()))?;
        let target = self
            .nodes
            .get(&connection.target_node)
            .ok_or_else(|| ConnectError::NodeNotFound(connection.target_node.clone()))?;
        let source_port = source
            .port(&connection.source_port)
            .ok_or_else(|| ConnectError::PortNotFound(connection.source_port.clone()))?;
        let target_port = target
            .port(&connection.target_port)
            .ok_or_else(|| ConnectError::PortNotFound(connection.target_port.clone()))?;
        if source_port.direction != PortDirection::Output
            || target_port.direction != PortDirection::Input
        {
            return Err(ConnectError::IncompatiblePorts);
        }
        if !source_port.compatible_with(target_port) {
            return Err(ConnectError::IncompatiblePorts);
        }
        if !target_port.multi_connect
            && self.connections.values().any(|c| {
                c.target_node == connection.target_node && c.target_port == connection.target_port
            })
        {
            return Err(ConnectError::PortOccupied(connection.target_port));
        }

        let id = connection.id.clone();
        debug!(connection = %id, "connection added");
        self.connections.insert(id.clone(), connection.clone());
        self.emit(GraphEvent::ConnectionAdded { connection });
        Ok(id)
    }

    /// Remove a connection.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(id)?;
        self.selected_connections.shift_remove(id);
        debug!(connection = %id, "connection removed");
        self.emit(GraphEvent::ConnectionRemoved {
            connection: connection.clone(),
        });
        Some(connection)
    }

    /// Get a connection by ID.
    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Connections with either endpoint on the given node.
    pub fn connections_for_node<'a>(
        &'a self,
        id: &'a NodeId,
    ) -> impl Iterator<Item = &'a Connection> {
        self.connections.values().filter(move |c| c.involves_node(id))
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // --- selection --------------------------------------------------

    fn selection_snapshot(&self) -> (Vec<NodeId>, Vec<ConnectionId>) {
        (
            self.selected_nodes.iter().cloned().collect(),
            self.selected_connections.iter().cloned().collect(),
        )
    }

    fn apply_node_selection(&mut self, ids: IndexSet<NodeId>) -> bool {
        let ids: IndexSet<NodeId> = ids
            .into_iter()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        if ids == self.selected_nodes {
            return false;
        }
        let (previous_nodes, previous_connections) = self.selection_snapshot();
        // Selection is exclusive by kind: picking nodes drops any
        // selected connections.
        if !ids.is_empty() {
            self.selected_connections.clear();
        }
        self.selected_nodes = ids;
        for node in self.nodes.values_mut() {
            node.selected = self.selected_nodes.contains(&node.id);
        }
        let event = GraphEvent::SelectionChanged {
            nodes: self.selected_nodes.iter().cloned().collect(),
            connections: self.selected_connections.iter().cloned().collect(),
            previous_nodes,
            previous_connections,
        };
        self.emit(event);
        true
    }

    fn apply_connection_selection(&mut self, ids: IndexSet<ConnectionId>) -> bool {
        let ids: IndexSet<ConnectionId> = ids
            .into_iter()
            .filter(|id| self.connections.contains_key(id))
            .collect();
        if ids == self.selected_connections {
            return false;
        }
        let (previous_nodes, previous_connections) = self.selection_snapshot();
        if !ids.is_empty() {
            self.selected_nodes.clear();
            for node in self.nodes.values_mut() {
                node.selected = false;
            }
        }
        self.selected_connections = ids;
        let event = GraphEvent::SelectionChanged {
            nodes: self.selected_nodes.iter().cloned().collect(),
            connections: self.selected_connections.iter().cloned().collect(),
            previous_nodes,
            previous_connections,
        };
        self.emit(event);
        true
    }

    /// Select a node, optionally keeping the current node selection.
    pub fn select_node(&mut self, id: &NodeId, additive: bool) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        let mut ids = if additive {
            self.selected_nodes.clone()
        } else {
            IndexSet::new()
        };
        ids.insert(id.clone());
        self.apply_node_selection(ids)
    }

    /// Replace the node selection with the given set.
    pub fn select_nodes(&mut self, ids: &[NodeId]) -> bool {
        self.apply_node_selection(ids.iter().cloned().collect())
    }

    /// Toggle a node's membership in the selection.
    pub fn toggle_node_selection(&mut self, id: &NodeId) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        let mut ids = self.selected_nodes.clone();
        if !ids.shift_remove(id) {
            ids.insert(id.clone());
        }
        self.apply_node_selection(ids)
    }

    /// Clear the node selection, leaving any connection selection alone.
    pub fn clear_node_selection(&mut self) -> bool {
        self.apply_node_selection(IndexSet::new())
    }

    /// Select every node.
    pub fn select_all_nodes(&mut self) -> bool {
        self.apply_node_selection(self.nodes.keys().cloned().collect())
    }

    /// Select a connection, optionally keeping the current connection
    /// selection.
    pub fn select_connection(&mut self, id: &ConnectionId, additive: bool) -> bool {
        if !self.connections.contains_key(id) {
            return false;
        }
        let mut ids = if additive {
            self.selected_connections.clone()
        } else {
            IndexSet::new()
        };
        ids.insert(id.clone());
        self.apply_connection_selection(ids)
    }

    /// Replace the connection selection with the given set.
    pub fn select_connections(&mut self, ids: &[ConnectionId]) -> bool {
        self.apply_connection_selection(ids.iter().cloned().collect())
    }

    /// Toggle a connection's membership in the selection.
    pub fn toggle_connection_selection(&mut self, id: &ConnectionId) -> bool {
        if !self.connections.contains_key(id) {
            return false;
        }
        let mut ids = self.selected_connections.clone();
        if !ids.shift_remove(id) {
            ids.insert(id.clone());
        }
        self.apply_connection_selection(ids)
    }

    /// Clear the connection selection, leaving any node selection alone.
    pub fn clear_connection_selection(&mut self) -> bool {
        self.apply_connection_selection(IndexSet::new())
    }

    /// Select every connection.
    pub fn select_all_connections(&mut self) -> bool {
        self.apply_connection_selection(self.connections.keys().cloned().collect())
    }

    /// Currently selected node ids.
    pub fn selected_node_ids(&self) -> &IndexSet<NodeId> {
        &self.selected_nodes
    }

    /// Currently selected connection ids.
    pub fn selected_connection_ids(&self) -> &IndexSet<ConnectionId> {
        &self.selected_connections
    }

    // --- whole-graph operations -------------------------------------

    /// Remove every node and connection and clear the selection. The
    /// event carries copies of everything removed.
    pub fn clear_graph(&mut self) -> bool {
        if self.nodes.is_empty() && self.connections.is_empty() {
            return false;
        }
        let nodes: Vec<Node> = self.nodes.drain(..).map(|(_, node)| node).collect();
        let connections: Vec<Connection> = self
            .connections
            .drain(..)
            .map(|(_, connection)| connection)
            .collect();
        self.selected_nodes.clear();
        self.selected_connections.clear();
        debug!(nodes = nodes.len(), connections = connections.len(), "graph cleared");
        self.emit(GraphEvent::GraphCleared { nodes, connections });
        true
    }

    /// Atomically replace the graph with the contents of a document.
    ///
    /// Duplicate node ids and connections whose endpoints cannot be
    /// resolved are dropped with a warning; the selection is cleared.
    pub fn load_graph(&mut self, document: GraphDocument) {
        let previous = self.export_graph();
        self.nodes.clear();
        self.connections.clear();
        self.selected_nodes.clear();
        self.selected_connections.clear();

        for record in document.nodes {
            let node = record.into_node();
            if self.nodes.contains_key(&node.id) {
                warn!(node = %node.id, "load: duplicate node id dropped");
                continue;
            }
            self.nodes.insert(node.id.clone(), node);
        }
        for record in document.connections {
            let connection = record.into_connection();
            let resolvable = self
                .nodes
                .get(&connection.source_node)
                .is_some_and(|n| n.port(&connection.source_port).is_some())
                && self
                    .nodes
                    .get(&connection.target_node)
                    .is_some_and(|n| n.port(&connection.target_port).is_some());
            if !resolvable || self.connections.contains_key(&connection.id) {
                warn!(connection = %connection.id, "load: unresolvable connection dropped");
                continue;
            }
            self.connections.insert(connection.id.clone(), connection);
        }
        debug!(
            nodes = self.nodes.len(),
            connections = self.connections.len(),
            "graph loaded"
        );
        self.emit(GraphEvent::GraphLoaded { previous });
    }

    /// Snapshot the store as a document.
    pub fn export_graph(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.values().map(NodeRecord::from).collect(),
            connections: self
                .connections
                .values()
                .map(ConnectionRecord::from)
                .collect(),
        }
    }
}
