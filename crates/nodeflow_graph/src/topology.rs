// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only topology analyses over the connection graph.
//!
//! Connections form a directed graph (output to input). None of these
//! queries are needed for interactive mutation; they are store-level
//! utilities for consumers that schedule evaluation or present
//! structure to the user.

use crate::node::NodeId;
use crate::store::GraphStore;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Error when an ordering requires an acyclic graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("graph contains a cycle")]
pub struct CycleError;

/// Three-color DFS marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not yet visited
    White,
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

impl GraphStore {
    fn successors(&self) -> HashMap<&NodeId, Vec<&NodeId>> {
        let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for connection in self.connections() {
            adjacency
                .entry(&connection.source_node)
                .or_default()
                .push(&connection.target_node);
        }
        adjacency
    }

    /// Nodes with no incoming connections.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        let targets: HashSet<&NodeId> = self.connections().map(|c| &c.target_node).collect();
        self.node_ids()
            .filter(|id| !targets.contains(id))
            .cloned()
            .collect()
    }

    /// Nodes with no outgoing connections.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        let sources: HashSet<&NodeId> = self.connections().map(|c| &c.source_node).collect();
        self.node_ids()
            .filter(|id| !sources.contains(id))
            .cloned()
            .collect()
    }

    /// Find cycles by depth-first traversal with three-color marking.
    ///
    /// Every back-edge found reports the node sequence along the current
    /// path from the re-entered node, so each returned `Vec` is one
    /// cycle in traversal order.
    pub fn detect_cycles(&self) -> Vec<Vec<NodeId>> {
        let adjacency = self.successors();
        let mut marks: HashMap<&NodeId, Mark> =
            self.node_ids().map(|id| (id, Mark::White)).collect();
        let mut path: Vec<&NodeId> = Vec::new();
        let mut cycles: Vec<Vec<NodeId>> = Vec::new();

        for id in self.node_ids() {
            if marks.get(id) == Some(&Mark::White) {
                visit(id, &adjacency, &mut marks, &mut path, &mut cycles);
            }
        }
        cycles
    }

    /// Nodes in dependency-first order. Fails when the graph has a
    /// cycle.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        if !self.detect_cycles().is_empty() {
            return Err(CycleError);
        }
        let adjacency = self.successors();
        let mut marks: HashMap<&NodeId, Mark> =
            self.node_ids().map(|id| (id, Mark::White)).collect();
        let mut order: Vec<NodeId> = Vec::new();

        for id in self.node_ids() {
            if marks.get(id) == Some(&Mark::White) {
                post_order(id, &adjacency, &mut marks, &mut order);
            }
        }
        // Post-order pushes dependents before the nodes feeding them.
        order.reverse();
        Ok(order)
    }
}

fn visit<'a>(
    node: &'a NodeId,
    adjacency: &HashMap<&'a NodeId, Vec<&'a NodeId>>,
    marks: &mut HashMap<&'a NodeId, Mark>,
    path: &mut Vec<&'a NodeId>,
    cycles: &mut Vec<Vec<NodeId>>,
) {
    marks.insert(node, Mark::Gray);
    path.push(node);
    if let Some(successors) = adjacency.get(node) {
        for next in successors {
            match marks.get(next) {
                Some(Mark::White) => visit(next, adjacency, marks, path, cycles),
                Some(Mark::Gray) => {
                    // Back-edge: the cycle is the path suffix starting at
                    // the re-entered node.
                    if let Some(start) = path.iter().position(|n| n == next) {
                        cycles.push(path[start..].iter().map(|n| (*n).clone()).collect());
                    }
                }
                _ => {}
            }
        }
    }
    path.pop();
    marks.insert(node, Mark::Black);
}

fn post_order<'a>(
    node: &'a NodeId,
    adjacency: &HashMap<&'a NodeId, Vec<&'a NodeId>>,
    marks: &mut HashMap<&'a NodeId, Mark>,
    order: &mut Vec<NodeId>,
) {
    marks.insert(node, Mark::Gray);
    if let Some(successors) = adjacency.get(node) {
        for next in successors {
            if marks.get(next) == Some(&Mark::White) {
                post_order(next, adjacency, marks, order);
            }
        }
    }
    marks.insert(node, Mark::Black);
    order.push(node.clone());
}
