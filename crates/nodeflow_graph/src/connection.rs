// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use crate::port::PortId;
use crate::space::GraphPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a connection.
///
/// Ids are plain strings so hosts can supply their own;
/// [`ConnectionId::new`] generates a random one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a new random connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A directed connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Source node ID
    pub source_node: NodeId,
    /// Source (output) port ID
    pub source_port: PortId,
    /// Target node ID
    pub target_node: NodeId,
    /// Target (input) port ID
    pub target_port: PortId,
    /// Optional routing control points in graph space
    pub control_points: Vec<GraphPoint>,
}

impl Connection {
    /// Create a new connection with a random id and no control points.
    pub fn new(
        source_node: NodeId,
        source_port: PortId,
        target_node: NodeId,
        target_port: PortId,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            source_node,
            source_port,
            target_node,
            target_port,
            control_points: Vec::new(),
        }
    }

    /// Replace the id with a host-supplied one.
    pub fn with_id(mut self, id: impl Into<ConnectionId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the routing control points.
    pub fn with_control_points(mut self, control_points: Vec<GraphPoint>) -> Self {
        self.control_points = control_points;
        self
    }

    /// Check if this connection involves a specific node.
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        self.source_node == *node_id || self.target_node == *node_id
    }

    /// Check if this connection involves a specific port.
    pub fn involves_port(&self, port_id: &PortId) -> bool {
        self.source_port == *port_id || self.target_port == *port_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involves_node() {
        let c = Connection::new("a".into(), "out".into(), "b".into(), "in".into());
        assert!(c.involves_node(&"a".into()));
        assert!(c.involves_node(&"b".into()));
        assert!(!c.involves_node(&"c".into()));
    }

    #[test]
    fn test_involves_port() {
        let c = Connection::new("a".into(), "out".into(), "b".into(), "in".into());
        assert!(c.involves_port(&"out".into()));
        assert!(c.involves_port(&"in".into()));
        assert!(!c.involves_port(&"other".into()));
    }
}
