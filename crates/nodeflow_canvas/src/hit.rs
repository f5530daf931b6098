// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph-space hit-testing.
//!
//! All queries operate in graph space; convert pointer positions with
//! [`Viewport::to_graph`](nodeflow_graph::Viewport::to_graph) first.
//! Hidden nodes are never hit. Z-index decides between overlapping
//! nodes, with insertion order breaking ties in favor of the newer node.

use crate::layout::PortLocator;
use nodeflow_graph::node::NodeId;
use nodeflow_graph::port::{PortDirection, PortId};
use nodeflow_graph::space::{GraphPoint, GraphRect};
use nodeflow_graph::store::GraphStore;

/// The topmost visible node containing `point`.
pub fn node_at(store: &GraphStore, point: GraphPoint) -> Option<NodeId> {
    let mut best: Option<(i32, NodeId)> = None;
    for node in store.nodes() {
        if !node.visible || !node.rect().contains(point) {
            continue;
        }
        match &best {
            Some((z, _)) if *z > node.z_index => {}
            _ => best = Some((node.z_index, node.id.clone())),
        }
    }
    best.map(|(_, id)| id)
}

/// Visible nodes whose bounds lie entirely inside `rect`, in store
/// order. This is the marquee coverage rule.
pub fn nodes_in_rect(store: &GraphStore, rect: &GraphRect) -> Vec<NodeId> {
    store
        .nodes()
        .filter(|node| node.visible && rect_contains(rect, &node.rect()))
        .map(|node| node.id.clone())
        .collect()
}

/// The nearest port anchor within `radius` of `point`, optionally
/// restricted to one direction and excluding one node.
pub fn port_at(
    store: &GraphStore,
    locator: &dyn PortLocator,
    point: GraphPoint,
    radius: f64,
    direction: Option<PortDirection>,
    exclude: Option<&NodeId>,
) -> Option<(NodeId, PortId)> {
    let mut best: Option<(f64, NodeId, PortId)> = None;
    for node in store.nodes() {
        if !node.visible || exclude == Some(&node.id) {
            continue;
        }
        for port in node.ports() {
            if direction.is_some_and(|d| d != port.direction) {
                continue;
            }
            let Some(anchor) = locator.anchor(node, &port.id) else {
                continue;
            };
            let distance = anchor.distance_to(point);
            if distance > radius {
                continue;
            }
            if best.as_ref().map_or(true, |(d, _, _)| distance < *d) {
                best = Some((distance, node.id.clone(), port.id.clone()));
            }
        }
    }
    best.map(|(_, node, port)| (node, port))
}

/// Whether `inner` lies entirely inside `outer`. Written out explicitly
/// so degenerate rectangles behave predictably.
pub(crate) fn rect_contains(outer: &GraphRect, inner: &GraphRect) -> bool {
    outer.min_x() <= inner.min_x()
        && inner.max_x() <= outer.max_x()
        && outer.min_y() <= inner.min_y()
        && inner.max_y() <= outer.max_y()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PortLayout;
    use nodeflow_graph::node::Node;
    use nodeflow_graph::port::Port;
    use nodeflow_graph::space::{point2, rect};

    fn boxed(id: &str, x: f64, y: f64, z: i32) -> Node {
        Node::new("n")
            .with_id(id)
            .with_position(x, y)
            .with_size(100.0, 60.0)
            .with_z_index(z)
    }

    #[test]
    fn test_topmost_node_wins() {
        let mut store = GraphStore::new();
        store.add_node(boxed("bottom", 0.0, 0.0, 1));
        store.add_node(boxed("top", 50.0, 0.0, 5));
        // Overlap region contains both; higher z wins.
        assert_eq!(node_at(&store, point2(60.0, 10.0)), Some("top".into()));
        assert_eq!(node_at(&store, point2(10.0, 10.0)), Some("bottom".into()));
        assert_eq!(node_at(&store, point2(500.0, 500.0)), None);
    }

    #[test]
    fn test_hidden_nodes_are_not_hit() {
        let mut store = GraphStore::new();
        let mut node = boxed("h", 0.0, 0.0, 0);
        node.visible = false;
        store.add_node(node);
        assert_eq!(node_at(&store, point2(10.0, 10.0)), None);
    }

    #[test]
    fn test_marquee_requires_full_containment() {
        let mut store = GraphStore::new();
        store.add_node(boxed("inside", 10.0, 10.0, 0));
        store.add_node(boxed("straddling", 180.0, 10.0, 0));
        let covered = nodes_in_rect(&store, &rect(0.0, 0.0, 200.0, 200.0));
        assert_eq!(covered, vec![NodeId::from("inside")]);
    }

    #[test]
    fn test_port_at_snaps_to_nearest_in_radius() {
        let mut store = GraphStore::new();
        store.add_node(
            boxed("n", 0.0, 0.0, 0)
                .with_inputs(vec![Port::input("in", "float").with_id("in")]),
        );
        let layout = PortLayout::default();
        let anchor = layout
            .anchor(store.node(&"n".into()).unwrap(), &"in".into())
            .unwrap();

        let near = anchor + nodeflow_graph::space::vec2(4.0, 0.0);
        let hit = port_at(&store, &layout, near, 10.0, Some(PortDirection::Input), None);
        assert_eq!(hit, Some(("n".into(), "in".into())));

        let far = anchor + nodeflow_graph::space::vec2(40.0, 0.0);
        assert!(port_at(&store, &layout, far, 10.0, None, None).is_none());
    }

    #[test]
    fn test_port_at_respects_direction_and_exclusion() {
        let mut store = GraphStore::new();
        store.add_node(
            boxed("n", 0.0, 0.0, 0)
                .with_inputs(vec![Port::input("in", "float").with_id("in")]),
        );
        let layout = PortLayout::default();
        let anchor = layout
            .anchor(store.node(&"n".into()).unwrap(), &"in".into())
            .unwrap();

        assert!(port_at(&store, &layout, anchor, 5.0, Some(PortDirection::Output), None).is_none());
        let excluded: NodeId = "n".into();
        assert!(port_at(&store, &layout, anchor, 5.0, None, Some(&excluded)).is_none());
    }
}
