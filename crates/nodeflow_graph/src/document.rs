// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serialization boundary for graph documents.
//!
//! The record types here define the host-facing JSON shape (camelCase
//! keys, `{x, y}` points). Round-tripping a store through a document
//! reproduces the same node and connection sets; transient state
//! (selection, dragging) is not persisted.

use crate::connection::{Connection, ConnectionId};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortDirection, PortId};
use crate::space::{GraphPoint, GraphSize};
use serde::{Deserialize, Serialize};

/// A point as serialized in documents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointRecord {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl From<GraphPoint> for PointRecord {
    fn from(point: GraphPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

impl From<PointRecord> for GraphPoint {
    fn from(record: PointRecord) -> Self {
        GraphPoint::new(record.x, record.y)
    }
}

/// An extent as serialized in documents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeRecord {
    /// Width in graph units
    pub width: f64,
    /// Height in graph units
    pub height: f64,
}

impl From<GraphSize> for SizeRecord {
    fn from(size: GraphSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

impl From<SizeRecord> for GraphSize {
    fn from(record: SizeRecord) -> Self {
        GraphSize::new(record.width, record.height)
    }
}

/// A port as serialized in documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    /// Port id
    pub id: PortId,
    /// Port name
    #[serde(default)]
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Host-defined data type
    #[serde(default = "default_data_type")]
    pub data_type: String,
    /// Whether multiple connections may attach; defaults by direction
    /// when absent (outputs fan out, inputs do not).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_connect: Option<bool>,
}

fn default_data_type() -> String {
    crate::port::DATA_TYPE_ANY.to_owned()
}

impl From<&Port> for PortRecord {
    fn from(port: &Port) -> Self {
        Self {
            id: port.id.clone(),
            name: port.name.clone(),
            direction: port.direction,
            data_type: port.data_type.clone(),
            multi_connect: Some(port.multi_connect),
        }
    }
}

impl PortRecord {
    /// Convert into a live port.
    pub fn into_port(self) -> Port {
        let multi_connect = self
            .multi_connect
            .unwrap_or(self.direction == PortDirection::Output);
        Port {
            id: self.id,
            name: self.name,
            direction: self.direction,
            data_type: self.data_type,
            multi_connect,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_size() -> SizeRecord {
    SizeRecord {
        width: crate::node::DEFAULT_NODE_WIDTH,
        height: crate::node::DEFAULT_NODE_HEIGHT,
    }
}

/// A node as serialized in documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node id
    pub id: NodeId,
    /// Host-defined node type identifier
    #[serde(rename = "type")]
    pub node_type: String,
    /// Top-left corner in graph space
    pub position: PointRecord,
    /// Extent in graph units
    #[serde(default = "default_size")]
    pub size: SizeRecord,
    /// Render/hit-test priority
    #[serde(default)]
    pub z_index: i32,
    /// Visibility flag
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Lock flag
    #[serde(default)]
    pub locked: bool,
    /// Group membership tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Opaque host payload
    #[serde(default)]
    pub data: serde_json::Value,
    /// Input ports
    #[serde(default)]
    pub input_ports: Vec<PortRecord>,
    /// Output ports
    #[serde(default)]
    pub output_ports: Vec<PortRecord>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            position: node.position.into(),
            size: node.size.into(),
            z_index: node.z_index,
            visible: node.visible,
            locked: node.locked,
            group: node.group.clone(),
            data: node.data.clone(),
            input_ports: node.inputs.iter().map(PortRecord::from).collect(),
            output_ports: node.outputs.iter().map(PortRecord::from).collect(),
        }
    }
}

impl NodeRecord {
    /// Convert into a live node. Transient flags start cleared.
    pub fn into_node(self) -> Node {
        let mut node = Node::new(self.node_type).with_id(self.id);
        node.position = self.position.into();
        node.size = self.size.into();
        node.z_index = self.z_index;
        node.visible = self.visible;
        node.locked = self.locked;
        node.group = self.group;
        node.data = self.data;
        node.inputs = self
            .input_ports
            .into_iter()
            .map(PortRecord::into_port)
            .collect();
        node.outputs = self
            .output_ports
            .into_iter()
            .map(PortRecord::into_port)
            .collect();
        node
    }
}

/// A connection as serialized in documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    /// Connection id
    pub id: ConnectionId,
    /// Source node id
    pub source_node_id: NodeId,
    /// Source port id
    pub source_port_id: PortId,
    /// Target node id
    pub target_node_id: NodeId,
    /// Target port id
    pub target_port_id: PortId,
    /// Routing control points
    #[serde(default)]
    pub control_points: Vec<PointRecord>,
}

impl From<&Connection> for ConnectionRecord {
    fn from(connection: &Connection) -> Self {
        Self {
            id: connection.id.clone(),
            source_node_id: connection.source_node.clone(),
            source_port_id: connection.source_port.clone(),
            target_node_id: connection.target_node.clone(),
            target_port_id: connection.target_port.clone(),
            control_points: connection
                .control_points
                .iter()
                .map(|p| PointRecord::from(*p))
                .collect(),
        }
    }
}

impl ConnectionRecord {
    /// Convert into a live connection.
    pub fn into_connection(self) -> Connection {
        Connection {
            id: self.id,
            source_node: self.source_node_id,
            source_port: self.source_port_id,
            target_node: self.target_node_id,
            target_port: self.target_port_id,
            control_points: self
                .control_points
                .into_iter()
                .map(GraphPoint::from)
                .collect(),
        }
    }
}

/// A complete serialized graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Serialized nodes
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Serialized connections
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

impl GraphDocument {
    /// Whether the document contains no entities.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }
}
