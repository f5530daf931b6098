// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph model.

use crate::port::{Port, PortId};
use crate::space::{GraphPoint, GraphRect, GraphSize};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Width given to nodes created without an explicit size.
pub const DEFAULT_NODE_WIDTH: f64 = 180.0;
/// Height given to nodes created without an explicit size.
pub const DEFAULT_NODE_HEIGHT: f64 = 100.0;

/// Unique identifier for a node.
///
/// Ids are plain strings so hosts can supply their own; [`NodeId::new`]
/// generates a random one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A node instance in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Host-defined node type identifier
    pub node_type: String,
    /// Position of the top-left corner in graph space
    pub position: GraphPoint,
    /// Extent in graph units
    pub size: GraphSize,
    /// Render/hit-test priority; larger is frontmost
    pub z_index: i32,
    /// Whether the node participates in rendering and visibility queries
    pub visible: bool,
    /// Locked nodes cannot be dragged or resized
    pub locked: bool,
    /// Transient selection flag, kept in sync by the store's selection ops
    pub selected: bool,
    /// Transient flag set while an active drag session owns this node
    pub dragging: bool,
    /// Optional group membership tag
    pub group: Option<String>,
    /// Opaque host payload carried through serialization
    pub data: serde_json::Value,
    /// Input ports
    pub inputs: Vec<Port>,
    /// Output ports
    pub outputs: Vec<Port>,
}

impl Node {
    /// Create a new node of the given type with a random id and default
    /// size at the origin.
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.into(),
            position: GraphPoint::zero(),
            size: GraphSize::new(DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT),
            z_index: 0,
            visible: true,
            locked: false,
            selected: false,
            dragging: false,
            group: None,
            data: serde_json::Value::Null,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Replace the id with a host-supplied one.
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the position.
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = GraphPoint::new(x, y);
        self
    }

    /// Set the size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = GraphSize::new(width, height);
        self
    }

    /// Set the z-index.
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Set the group membership tag.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attach a host payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Set the input ports.
    pub fn with_inputs(mut self, inputs: Vec<Port>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the output ports.
    pub fn with_outputs(mut self, outputs: Vec<Port>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Bounding rectangle in graph space.
    pub fn rect(&self) -> GraphRect {
        GraphRect::new(self.position, self.size)
    }

    /// Get a port by ID, searching inputs then outputs.
    pub fn port(&self, port_id: &PortId) -> Option<&Port> {
        self.inputs
            .iter()
            .find(|p| p.id == *port_id)
            .or_else(|| self.outputs.iter().find(|p| p.id == *port_id))
    }

    /// All ports, inputs first.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }
}
