// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port anchor geometry.
//!
//! The engine never paints ports, but connection hit-testing and the
//! default connection bounds both need to know where a port sits on its
//! node. [`PortLocator`] is the seam: hosts with custom node chrome
//! supply their own implementation; [`PortLayout`] is the stock
//! left-edge-inputs / right-edge-outputs arrangement.

use nodeflow_graph::node::Node;
use nodeflow_graph::port::PortId;
use nodeflow_graph::space::GraphPoint;

/// Maps a port to its anchor point in graph space.
pub trait PortLocator {
    /// Anchor position for a port on `node`, or `None` when the port is
    /// not present on the node.
    fn anchor(&self, node: &Node, port_id: &PortId) -> Option<GraphPoint>;
}

/// Stock port arrangement: inputs stacked down the left edge, outputs
/// down the right edge, both starting below a header strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortLayout {
    /// Height of the node header strip in graph units.
    pub header_height: f64,
    /// Vertical distance between consecutive port anchors.
    pub port_spacing: f64,
}

impl Default for PortLayout {
    fn default() -> Self {
        Self {
            header_height: 28.0,
            port_spacing: 22.0,
        }
    }
}

impl PortLayout {
    fn row_y(&self, node: &Node, index: usize) -> f64 {
        node.position.y + self.header_height + index as f64 * self.port_spacing
            + self.port_spacing / 2.0
    }
}

impl PortLocator for PortLayout {
    fn anchor(&self, node: &Node, port_id: &PortId) -> Option<GraphPoint> {
        if let Some(index) = node.inputs.iter().position(|p| p.id == *port_id) {
            return Some(GraphPoint::new(node.position.x, self.row_y(node, index)));
        }
        if let Some(index) = node.outputs.iter().position(|p| p.id == *port_id) {
            return Some(GraphPoint::new(
                node.position.x + node.size.width,
                self.row_y(node, index),
            ));
        }
        None
    }
}
