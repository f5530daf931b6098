// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visibility culling.
//!
//! Restricts rendering and hit-testing work to the entities that
//! actually overlap the visible area. A linear scan with axis-aligned
//! bounding-box tests is deliberate: at the target scale (on the order
//! of a thousand nodes and two thousand connections) a full scan sits
//! comfortably inside a frame budget, and a spatial tree would be
//! complexity without payoff. Swap in an R-tree here if graphs grow
//! past a few thousand nodes.

use crate::layout::{PortLayout, PortLocator};
use nodeflow_graph::connection::{Connection, ConnectionId};
use nodeflow_graph::node::NodeId;
use nodeflow_graph::space::{GraphPoint, GraphRect, ScreenSize, ScreenVector};
use nodeflow_graph::store::GraphStore;
use nodeflow_graph::viewport::Viewport;

/// Tuning knobs for visibility queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityOptions {
    /// Extra screen pixels added around the visible area so entities do
    /// not pop in at the edges during pans.
    pub margin: f64,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self { margin: 32.0 }
    }
}

/// Supplies the bounding boxes of a connection's rendered path
/// segments.
///
/// The index is agnostic to curve geometry; whatever layer paints the
/// connections knows their true extents and implements this.
pub trait ConnectionPathProvider {
    /// Bounding boxes covering the connection's rendered path.
    fn segment_bounds(&self, store: &GraphStore, connection: &Connection) -> Vec<GraphRect>;
}

/// Default path provider: one box spanning the two port anchors and any
/// control points. Exact for straight connections, conservative enough
/// for shallow curves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChordPathProvider {
    /// Port geometry used to find the endpoint anchors.
    pub layout: PortLayout,
}

impl ConnectionPathProvider for ChordPathProvider {
    fn segment_bounds(&self, store: &GraphStore, connection: &Connection) -> Vec<GraphRect> {
        let mut points: Vec<GraphPoint> = Vec::with_capacity(connection.control_points.len() + 2);
        for (node_id, port_id) in [
            (&connection.source_node, &connection.source_port),
            (&connection.target_node, &connection.target_port),
        ] {
            let Some(node) = store.node(node_id) else {
                continue;
            };
            match self.layout.anchor(node, port_id) {
                Some(anchor) => points.push(anchor),
                // Port unknown to the layout: fall back to the node body.
                None => {
                    let rect = node.rect();
                    points.push(rect.origin);
                    points.push(GraphPoint::new(rect.max_x(), rect.max_y()));
                }
            }
        }
        points.extend(connection.control_points.iter().copied());
        if points.len() < 2 {
            return Vec::new();
        }
        vec![euclid::Box2D::from_points(points).to_rect()]
    }
}

/// Result of a full visibility query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    /// Visible node ids in store order
    pub nodes: Vec<NodeId>,
    /// Visible connection ids in store order
    pub connections: Vec<ConnectionId>,
}

/// Computes which entities intersect the visible area for the current
/// viewport and screen size.
pub struct VisibilityIndex {
    /// Query tuning.
    pub options: VisibilityOptions,
    provider: Box<dyn ConnectionPathProvider>,
}

impl Default for VisibilityIndex {
    fn default() -> Self {
        Self::new(
            VisibilityOptions::default(),
            Box::new(ChordPathProvider::default()),
        )
    }
}

impl VisibilityIndex {
    /// Create an index with explicit options and path provider.
    pub fn new(options: VisibilityOptions, provider: Box<dyn ConnectionPathProvider>) -> Self {
        Self { options, provider }
    }

    /// The culling rectangle: the visible area inflated by the margin.
    /// Empty when the screen is degenerate.
    pub fn culling_area(&self, viewport: &Viewport, screen: ScreenSize) -> GraphRect {
        let area = viewport.visible_area(screen);
        if area.size.width <= 0.0 || area.size.height <= 0.0 {
            return GraphRect::zero();
        }
        let margin = viewport.to_graph_offset(ScreenVector::new(
            self.options.margin,
            self.options.margin,
        ));
        area.inflate(margin.x, margin.y)
    }

    /// Visible nodes: the `visible` flag set and bounds overlapping the
    /// culling area.
    pub fn visible_nodes(
        &self,
        store: &GraphStore,
        viewport: &Viewport,
        screen: ScreenSize,
    ) -> Vec<NodeId> {
        let area = self.culling_area(viewport, screen);
        if area.size.width <= 0.0 || area.size.height <= 0.0 {
            return Vec::new();
        }
        store
            .nodes()
            .filter(|node| node.visible && area.intersects(&node.rect()))
            .map(|node| node.id.clone())
            .collect()
    }

    /// Visible connections: any path segment box overlapping the
    /// culling area.
    pub fn visible_connections(
        &self,
        store: &GraphStore,
        viewport: &Viewport,
        screen: ScreenSize,
    ) -> Vec<ConnectionId> {
        let area = self.culling_area(viewport, screen);
        if area.size.width <= 0.0 || area.size.height <= 0.0 {
            return Vec::new();
        }
        store
            .connections()
            .filter(|connection| {
                self.provider
                    .segment_bounds(store, connection)
                    .iter()
                    .any(|bounds| area.intersects(bounds))
            })
            .map(|connection| connection.id.clone())
            .collect()
    }

    /// Full visibility query for one frame.
    pub fn visible_set(
        &self,
        store: &GraphStore,
        viewport: &Viewport,
        screen: ScreenSize,
    ) -> VisibleSet {
        VisibleSet {
            nodes: self.visible_nodes(store, viewport, screen),
            connections: self.visible_connections(store, viewport, screen),
        }
    }
}

/// Connections with at least one endpoint in `ids`.
///
/// Used during drags to redraw just the edges that follow the moving
/// nodes, without a full visibility recompute.
pub fn connections_touching(store: &GraphStore, ids: &[NodeId]) -> Vec<ConnectionId> {
    store
        .connections()
        .filter(|c| ids.contains(&c.source_node) || ids.contains(&c.target_node))
        .map(|c| c.id.clone())
        .collect()
}
