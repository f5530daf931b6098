// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive session state machines.
//!
//! A session turns a stream of pointer primitives (start, move, end,
//! cancel) into one coherent graph mutation: a node drag, a resize, a
//! connection drag, or a marquee selection. Exactly one session can be
//! live at a time; starting another while one is active is rejected, so
//! callers must end or cancel explicitly.
//!
//! While a session runs it transiently owns the affected nodes'
//! `position`/`size`/`selected`/`dragging` fields and writes them
//! directly; the net change is reported once, at commit, through a
//! `*Ended` event that carries the pre-session originals. That single
//! event is what undo stacks invert; intermediate pointer moves are
//! deliberately silent. `cancel` restores the originals, so a cancelled
//! session is a net no-op on the store.
//!
//! Mid-session external mutation is tolerated: ids that stop resolving
//! are dropped and the session completes with whatever remains.

use crate::hit;
use crate::layout::{PortLayout, PortLocator};
use nodeflow_graph::event::{GraphEvent, NodeMove, NodeResize, SessionKind};
use nodeflow_graph::node::NodeId;
use nodeflow_graph::port::{PortDirection, PortId};
use nodeflow_graph::space::{
    GraphPoint, GraphRect, GraphSize, GraphVector, ScreenPoint, ScreenVector,
};
use nodeflow_graph::store::GraphStore;
use nodeflow_graph::viewport::Viewport;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Error starting a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session is already active; end or cancel it first
    #[error("a session is already active")]
    SessionActive,

    /// Target node not found
    #[error("node not found: {0}")]
    UnknownNode(NodeId),

    /// Target port not found on its node
    #[error("port not found: {0}")]
    UnknownPort(PortId),

    /// Target node is locked against geometry changes
    #[error("node is locked: {0}")]
    NodeLocked(NodeId),
}

/// Session tuning: size clamps for resizing and the port snap distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Smallest size a resize may produce.
    pub min_node_size: GraphSize,
    /// Largest size a resize may produce.
    pub max_node_size: GraphSize,
    /// Screen-pixel radius within which a connection drag snaps to a
    /// port.
    pub snap_distance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_node_size: GraphSize::new(40.0, 28.0),
            max_node_size: GraphSize::new(2000.0, 2000.0),
            snap_distance: 12.0,
        }
    }
}

/// Candidate connection submitted for validation before commit,
/// already oriented output-to-input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Source node id
    pub source_node: NodeId,
    /// Source (output) port id
    pub source_port: PortId,
    /// Target node id
    pub target_node: NodeId,
    /// Target (input) port id
    pub target_port: PortId,
}

/// Outcome of a connection validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionVerdict {
    /// Commit the connection
    Allow,
    /// Discard the connection, optionally telling the user why
    Deny(Option<String>),
}

/// Host hook consulted before a dragged connection is committed. A
/// denied connection is discarded with no store mutation.
pub trait ConnectionValidator {
    /// Judge a candidate connection.
    fn validate(&self, store: &GraphStore, request: &ConnectionRequest) -> ConnectionVerdict;
}

/// Default validator: defers entirely to the store's own checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ConnectionValidator for AllowAll {
    fn validate(&self, _store: &GraphStore, _request: &ConnectionRequest) -> ConnectionVerdict {
        ConnectionVerdict::Allow
    }
}

#[derive(Debug)]
struct DragState {
    accumulated: GraphVector,
    origins: Vec<(NodeId, GraphPoint)>,
}

#[derive(Debug)]
struct ResizeState {
    accumulated: GraphVector,
    origins: Vec<(NodeId, GraphSize)>,
}

#[derive(Debug)]
struct ConnectState {
    source_node: NodeId,
    source_port: PortId,
    direction: PortDirection,
    anchor: GraphPoint,
    accumulated: GraphVector,
    candidate: Option<(NodeId, PortId)>,
}

#[derive(Debug)]
struct MarqueeState {
    anchor: GraphPoint,
    accumulated: GraphVector,
    additive: bool,
    previous: Vec<NodeId>,
}

#[derive(Debug, Default)]
enum SessionState {
    #[default]
    Idle,
    NodeDrag(DragState),
    Resize(ResizeState),
    Connect(ConnectState),
    Marquee(MarqueeState),
}

/// Drives one interactive operation at a time against a store.
pub struct SessionManager {
    config: SessionConfig,
    layout: Box<dyn PortLocator>,
    validator: Box<dyn ConnectionValidator>,
    state: SessionState,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionManager {
    /// Create a manager with the stock port layout and a validator that
    /// defers to the store.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            layout: Box::new(PortLayout::default()),
            validator: Box::new(AllowAll),
            state: SessionState::Idle,
        }
    }

    /// Replace the port geometry used for connection hit-testing.
    pub fn with_layout(mut self, layout: Box<dyn PortLocator>) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the connection validation hook.
    pub fn with_validator(mut self, validator: Box<dyn ConnectionValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Session tuning in effect.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Kind of the active session, if any.
    pub fn kind(&self) -> Option<SessionKind> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::NodeDrag(_) => Some(SessionKind::NodeDrag),
            SessionState::Resize(_) => Some(SessionKind::Resize),
            SessionState::Connect(_) => Some(SessionKind::ConnectionDrag),
            SessionState::Marquee(_) => Some(SessionKind::SelectionBox),
        }
    }

    /// Whether no session is active.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    /// Nodes owned by the active drag or resize session.
    pub fn affected_nodes(&self) -> Vec<NodeId> {
        match &self.state {
            SessionState::NodeDrag(drag) => {
                drag.origins.iter().map(|(id, _)| id.clone()).collect()
            }
            SessionState::Resize(resize) => {
                resize.origins.iter().map(|(id, _)| id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Current graph-space cursor of a connection drag.
    pub fn connection_cursor(&self) -> Option<GraphPoint> {
        match &self.state {
            SessionState::Connect(connect) => Some(connect.anchor + connect.accumulated),
            _ => None,
        }
    }

    /// Candidate target port currently highlighted by a connection drag.
    pub fn candidate_port(&self) -> Option<&(NodeId, PortId)> {
        match &self.state {
            SessionState::Connect(connect) => connect.candidate.as_ref(),
            _ => None,
        }
    }

    /// Current marquee rectangle in graph space.
    pub fn marquee_rect(&self) -> Option<GraphRect> {
        match &self.state {
            SessionState::Marquee(marquee) => {
                Some(span_rect(marquee.anchor, marquee.accumulated))
            }
            _ => None,
        }
    }

    /// Start dragging a node. Dragging a selected node drags the whole
    /// selection (minus locked nodes); an unselected node drags alone.
    pub fn begin_node_drag(
        &mut self,
        store: &mut GraphStore,
        viewport: &Viewport,
        anchor: ScreenPoint,
        target: &NodeId,
    ) -> Result<(), SessionError> {
        if !self.is_idle() {
            return Err(SessionError::SessionActive);
        }
        let target_node = store
            .node(target)
            .ok_or_else(|| SessionError::UnknownNode(target.clone()))?;
        if target_node.locked {
            return Err(SessionError::NodeLocked(target.clone()));
        }
        let anchor = viewport.to_graph(anchor);

        let mut ids: Vec<NodeId> = if target_node.selected {
            store.selected_node_ids().iter().cloned().collect()
        } else {
            vec![target.clone()]
        };
        if !ids.contains(target) {
            ids.push(target.clone());
        }

        let mut origins = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(node) = store.node_mut(id) else {
                continue;
            };
            if node.locked {
                continue;
            }
            node.dragging = true;
            origins.push((id.clone(), node.position));
        }
        let ids: Vec<NodeId> = origins.iter().map(|(id, _)| id.clone()).collect();
        debug!(nodes = ids.len(), "node drag started");
        store.emit(GraphEvent::DragStarted { ids, anchor });
        self.state = SessionState::NodeDrag(DragState {
            accumulated: GraphVector::zero(),
            origins,
        });
        Ok(())
    }

    /// Start resizing a node from its grow handle.
    pub fn begin_resize(
        &mut self,
        store: &mut GraphStore,
        viewport: &Viewport,
        anchor: ScreenPoint,
        target: &NodeId,
    ) -> Result<(), SessionError> {
        if !self.is_idle() {
            return Err(SessionError::SessionActive);
        }
        let node = store
            .node(target)
            .ok_or_else(|| SessionError::UnknownNode(target.clone()))?;
        if node.locked {
            return Err(SessionError::NodeLocked(target.clone()));
        }
        let anchor = viewport.to_graph(anchor);
        let origins = vec![(target.clone(), node.size)];
        debug!(node = %target, "resize started");
        store.emit(GraphEvent::ResizeStarted {
            ids: vec![target.clone()],
            anchor,
        });
        self.state = SessionState::Resize(ResizeState {
            accumulated: GraphVector::zero(),
            origins,
        });
        Ok(())
    }

    /// Start dragging out a connection from a port. Works from either
    /// side; the commit orients the result output-to-input.
    pub fn begin_connection(
        &mut self,
        store: &mut GraphStore,
        viewport: &Viewport,
        anchor: ScreenPoint,
        node: &NodeId,
        port: &PortId,
    ) -> Result<(), SessionError> {
        if !self.is_idle() {
            return Err(SessionError::SessionActive);
        }
        let source = store
            .node(node)
            .ok_or_else(|| SessionError::UnknownNode(node.clone()))?;
        let direction = source
            .port(port)
            .map(|p| p.direction)
            .ok_or_else(|| SessionError::UnknownPort(port.clone()))?;
        let anchor = viewport.to_graph(anchor);
        debug!(node = %node, port = %port, "connection drag started");
        store.emit(GraphEvent::ConnectStarted {
            node: node.clone(),
            port: port.clone(),
        });
        self.state = SessionState::Connect(ConnectState {
            source_node: node.clone(),
            source_port: port.clone(),
            direction,
            anchor,
            accumulated: GraphVector::zero(),
            candidate: None,
        });
        Ok(())
    }

    /// Start a marquee selection. With `additive`, nodes the marquee
    /// covers join the current selection instead of replacing it.
    pub fn begin_marquee(
        &mut self,
        store: &mut GraphStore,
        viewport: &Viewport,
        anchor: ScreenPoint,
        additive: bool,
    ) -> Result<(), SessionError> {
        if !self.is_idle() {
            return Err(SessionError::SessionActive);
        }
        let anchor = viewport.to_graph(anchor);
        let previous: Vec<NodeId> = store.selected_node_ids().iter().cloned().collect();
        store.emit(GraphEvent::MarqueeStarted { anchor });
        self.state = SessionState::Marquee(MarqueeState {
            anchor,
            accumulated: GraphVector::zero(),
            additive,
            previous,
        });
        Ok(())
    }

    /// Feed a pointer movement into the active session. The screen
    /// delta is zoom-scaled into graph space and accumulated; each kind
    /// applies the cumulative delta from its original snapshots, so the
    /// result is independent of how the movement was chunked. A no-op
    /// while idle.
    pub fn update(&mut self, store: &mut GraphStore, viewport: &Viewport, delta: ScreenVector) {
        let graph_delta = viewport.to_graph_offset(delta);
        match &mut self.state {
            SessionState::Idle => {}
            SessionState::NodeDrag(drag) => {
                drag.accumulated += graph_delta;
                for (id, origin) in &drag.origins {
                    if let Some(node) = store.node_mut(id) {
                        node.position = *origin + drag.accumulated;
                    }
                }
            }
            SessionState::Resize(resize) => {
                resize.accumulated += graph_delta;
                for (id, origin) in &resize.origins {
                    if let Some(node) = store.node_mut(id) {
                        let grown = GraphSize::new(
                            origin.width + resize.accumulated.x,
                            origin.height + resize.accumulated.y,
                        );
                        node.size = clamp_size(
                            grown,
                            self.config.min_node_size,
                            self.config.max_node_size,
                        );
                    }
                }
            }
            SessionState::Connect(connect) => {
                connect.accumulated += graph_delta;
                let cursor = connect.anchor + connect.accumulated;
                let radius = viewport
                    .to_graph_offset(ScreenVector::new(self.config.snap_distance, 0.0))
                    .x;
                connect.candidate = hit::port_at(
                    store,
                    self.layout.as_ref(),
                    cursor,
                    radius,
                    Some(connect.direction.opposite()),
                    Some(&connect.source_node),
                );
            }
            SessionState::Marquee(marquee) => {
                marquee.accumulated += graph_delta;
                let rect = span_rect(marquee.anchor, marquee.accumulated);
                let covered = hit::nodes_in_rect(store, &rect);
                let mut desired: Vec<NodeId> = if marquee.additive {
                    marquee.previous.clone()
                } else {
                    Vec::new()
                };
                for id in covered {
                    if !desired.contains(&id) {
                        desired.push(id);
                    }
                }
                // Preview only: flags change, the committed selection
                // (and its event) waits for end().
                let all: Vec<NodeId> = store.node_ids().cloned().collect();
                for id in all {
                    if let Some(node) = store.node_mut(&id) {
                        node.selected = desired.contains(&id);
                    }
                }
            }
        }
    }

    /// Commit the active session and return to idle. A no-op while
    /// idle.
    pub fn end(&mut self, store: &mut GraphStore) {
        match std::mem::take(&mut self.state) {
            SessionState::Idle => {}
            SessionState::NodeDrag(drag) => {
                let mut moves = Vec::with_capacity(drag.origins.len());
                for (id, from) in &drag.origins {
                    if let Some(node) = store.node_mut(id) {
                        node.dragging = false;
                        moves.push(NodeMove {
                            id: id.clone(),
                            from: *from,
                            to: node.position,
                        });
                    }
                }
                debug!(nodes = moves.len(), "node drag committed");
                store.emit(GraphEvent::DragEnded { moves });
            }
            SessionState::Resize(resize) => {
                let mut resizes = Vec::with_capacity(resize.origins.len());
                for (id, from) in &resize.origins {
                    if let Some(node) = store.node(id) {
                        resizes.push(NodeResize {
                            id: id.clone(),
                            from: *from,
                            to: node.size,
                        });
                    }
                }
                debug!(nodes = resizes.len(), "resize committed");
                store.emit(GraphEvent::ResizeEnded { resizes });
            }
            SessionState::Connect(connect) => {
                self.end_connection(store, connect);
            }
            SessionState::Marquee(marquee) => {
                let rect = span_rect(marquee.anchor, marquee.accumulated);
                let covered = hit::nodes_in_rect(store, &rect);
                let mut desired: Vec<NodeId> = if marquee.additive {
                    marquee.previous.clone()
                } else {
                    Vec::new()
                };
                for id in covered {
                    if !desired.contains(&id) {
                        desired.push(id);
                    }
                }
                debug!(nodes = desired.len(), "marquee committed");
                store.select_nodes(&desired);
            }
        }
    }

    fn end_connection(&mut self, store: &mut GraphStore, connect: ConnectState) {
        let Some((target_node, target_port)) = connect.candidate else {
            debug!(node = %connect.source_node, "connection drag released over nothing");
            store.emit(GraphEvent::ConnectionDropped {
                node: connect.source_node,
                port: connect.source_port,
                reason: None,
            });
            return;
        };
        // Orient the request output-to-input regardless of which side
        // the drag started from.
        let request = if connect.direction == PortDirection::Output {
            ConnectionRequest {
                source_node: connect.source_node.clone(),
                source_port: connect.source_port.clone(),
                target_node,
                target_port,
            }
        } else {
            ConnectionRequest {
                source_node: target_node,
                source_port: target_port,
                target_node: connect.source_node.clone(),
                target_port: connect.source_port.clone(),
            }
        };
        match self.validator.validate(store, &request) {
            ConnectionVerdict::Deny(reason) => {
                debug!(node = %connect.source_node, "connection denied by validator");
                store.emit(GraphEvent::ConnectionDropped {
                    node: connect.source_node,
                    port: connect.source_port,
                    reason,
                });
            }
            ConnectionVerdict::Allow => {
                if let Err(error) = store.connect(
                    &request.source_node,
                    &request.source_port,
                    &request.target_node,
                    &request.target_port,
                ) {
                    store.emit(GraphEvent::ConnectionDropped {
                        node: connect.source_node,
                        port: connect.source_port,
                        reason: Some(error.to_string()),
                    });
                }
                // On success the store already emitted ConnectionAdded.
            }
        }
    }

    /// Abort the active session, restoring every affected entity to its
    /// pre-session state, and return to idle. Emits a cancellation
    /// signal but no mutation event. A no-op while idle.
    pub fn cancel(&mut self, store: &mut GraphStore) {
        match std::mem::take(&mut self.state) {
            SessionState::Idle => {}
            SessionState::NodeDrag(drag) => {
                for (id, origin) in &drag.origins {
                    if let Some(node) = store.node_mut(id) {
                        node.position = *origin;
                        node.dragging = false;
                    }
                }
                debug!("node drag cancelled");
                store.emit(GraphEvent::SessionCancelled {
                    kind: SessionKind::NodeDrag,
                });
            }
            SessionState::Resize(resize) => {
                for (id, origin) in &resize.origins {
                    if let Some(node) = store.node_mut(id) {
                        node.size = *origin;
                    }
                }
                debug!("resize cancelled");
                store.emit(GraphEvent::SessionCancelled {
                    kind: SessionKind::Resize,
                });
            }
            SessionState::Connect(_) => {
                debug!("connection drag cancelled");
                store.emit(GraphEvent::SessionCancelled {
                    kind: SessionKind::ConnectionDrag,
                });
            }
            SessionState::Marquee(marquee) => {
                let all: Vec<NodeId> = store.node_ids().cloned().collect();
                for id in all {
                    if let Some(node) = store.node_mut(&id) {
                        node.selected = marquee.previous.contains(&id);
                    }
                }
                debug!("marquee cancelled");
                store.emit(GraphEvent::SessionCancelled {
                    kind: SessionKind::SelectionBox,
                });
            }
        }
    }
}

fn clamp_size(size: GraphSize, min: GraphSize, max: GraphSize) -> GraphSize {
    GraphSize::new(
        size.width.clamp(min.width, max.width),
        size.height.clamp(min.height, max.height),
    )
}

fn span_rect(anchor: GraphPoint, accumulated: GraphVector) -> GraphRect {
    euclid::Box2D::from_points([anchor, anchor + accumulated]).to_rect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow_graph::node::Node;
    use nodeflow_graph::port::Port;
    use nodeflow_graph::space::{point2, size2, vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn plain(id: &str, x: f64, y: f64) -> Node {
        Node::new("n").with_id(id).with_position(x, y).with_size(100.0, 60.0)
    }

    fn record_events(store: &mut GraphStore) -> Rc<RefCell<Vec<GraphEvent>>> {
        let log: Rc<RefCell<Vec<GraphEvent>>> = Rc::default();
        let sink = log.clone();
        store.subscribe(Box::new(move |event| sink.borrow_mut().push(event.clone())));
        log
    }

    fn names(log: &Rc<RefCell<Vec<GraphEvent>>>) -> Vec<&'static str> {
        log.borrow().iter().map(GraphEvent::name).collect()
    }

    #[test]
    fn test_end_and_cancel_while_idle_are_noops() {
        let mut store = GraphStore::new();
        let mut sessions = SessionManager::default();
        let log = record_events(&mut store);
        sessions.end(&mut store);
        sessions.cancel(&mut store);
        sessions.update(&mut store, &Viewport::default(), vec2(5.0, 5.0));
        assert!(sessions.is_idle());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_second_session_rejected() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 0.0, 0.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        sessions
            .begin_node_drag(&mut store, &viewport, point2(10.0, 10.0), &"a".into())
            .unwrap();
        assert_eq!(
            sessions.begin_marquee(&mut store, &viewport, point2(0.0, 0.0), false),
            Err(SessionError::SessionActive)
        );
        assert_eq!(sessions.kind(), Some(SessionKind::NodeDrag));
    }

    #[test]
    fn test_drag_accumulates_deltas_in_graph_space() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 10.0, 10.0));
        let mut sessions = SessionManager::default();
        // Zoom 2: screen deltas halve in graph space.
        let viewport = Viewport::new(0.0, 0.0, 2.0);
        sessions
            .begin_node_drag(&mut store, &viewport, point2(20.0, 20.0), &"a".into())
            .unwrap();
        assert!(store.node(&"a".into()).unwrap().dragging);

        for _ in 0..4 {
            sessions.update(&mut store, &viewport, vec2(10.0, 2.0));
        }
        assert_eq!(store.node(&"a".into()).unwrap().position, point2(30.0, 14.0));

        sessions.end(&mut store);
        assert!(sessions.is_idle());
        assert!(!store.node(&"a".into()).unwrap().dragging);
        assert_eq!(store.node(&"a".into()).unwrap().position, point2(30.0, 14.0));
    }

    #[test]
    fn test_drag_end_event_carries_originals() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 5.0, 5.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        let log = record_events(&mut store);

        sessions
            .begin_node_drag(&mut store, &viewport, point2(0.0, 0.0), &"a".into())
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(15.0, 0.0));
        sessions.end(&mut store);

        assert_eq!(names(&log), vec!["drag_started", "drag_ended"]);
        let events = log.borrow();
        let GraphEvent::DragEnded { moves } = &events[1] else {
            panic!("expected DragEnded");
        };
        assert_eq!(
            moves,
            &vec![NodeMove {
                id: "a".into(),
                from: point2(5.0, 5.0),
                to: point2(20.0, 5.0),
            }]
        );
    }

    #[test]
    fn test_cancel_restores_positions_without_mutation_event() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 5.0, 5.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        sessions
            .begin_node_drag(&mut store, &viewport, point2(0.0, 0.0), &"a".into())
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(100.0, 100.0));
        let log = record_events(&mut store);
        sessions.cancel(&mut store);

        assert_eq!(store.node(&"a".into()).unwrap().position, point2(5.0, 5.0));
        assert!(!store.node(&"a".into()).unwrap().dragging);
        assert_eq!(names(&log), vec!["session_cancelled"]);
    }

    #[test]
    fn test_dragging_selected_node_drags_selection() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 0.0, 0.0));
        store.add_node(plain("b", 200.0, 0.0));
        store.add_node(plain("c", 400.0, 0.0));
        store.select_nodes(&["a".into(), "b".into()]);

        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        sessions
            .begin_node_drag(&mut store, &viewport, point2(0.0, 0.0), &"a".into())
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(10.0, 10.0));
        sessions.end(&mut store);

        assert_eq!(store.node(&"a".into()).unwrap().position, point2(10.0, 10.0));
        assert_eq!(store.node(&"b".into()).unwrap().position, point2(210.0, 10.0));
        assert_eq!(store.node(&"c".into()).unwrap().position, point2(400.0, 0.0));
    }

    #[test]
    fn test_dragging_unselected_node_drags_only_it() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 0.0, 0.0));
        store.add_node(plain("b", 200.0, 0.0));
        store.select_nodes(&["a".into()]);

        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        sessions
            .begin_node_drag(&mut store, &viewport, point2(0.0, 0.0), &"b".into())
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(10.0, 0.0));
        sessions.end(&mut store);

        assert_eq!(store.node(&"a".into()).unwrap().position, point2(0.0, 0.0));
        assert_eq!(store.node(&"b".into()).unwrap().position, point2(210.0, 0.0));
    }

    #[test]
    fn test_locked_nodes_do_not_drag() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 0.0, 0.0));
        let mut locked = plain("b", 200.0, 0.0);
        locked.locked = true;
        store.add_node(locked);
        store.select_all_nodes();

        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        assert_eq!(
            sessions.begin_node_drag(&mut store, &viewport, point2(0.0, 0.0), &"b".into()),
            Err(SessionError::NodeLocked("b".into()))
        );

        sessions
            .begin_node_drag(&mut store, &viewport, point2(0.0, 0.0), &"a".into())
            .unwrap();
        assert_eq!(sessions.affected_nodes(), vec![NodeId::from("a")]);
        sessions.update(&mut store, &viewport, vec2(10.0, 0.0));
        sessions.end(&mut store);
        assert_eq!(store.node(&"b".into()).unwrap().position, point2(200.0, 0.0));
    }

    #[test]
    fn test_node_removed_mid_drag_is_discarded() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 0.0, 0.0));
        store.add_node(plain("b", 200.0, 0.0));
        store.select_all_nodes();

        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        sessions
            .begin_node_drag(&mut store, &viewport, point2(0.0, 0.0), &"a".into())
            .unwrap();
        store.remove_node(&"b".into());
        sessions.update(&mut store, &viewport, vec2(10.0, 0.0));
        let log = record_events(&mut store);
        sessions.end(&mut store);

        let events = log.borrow();
        let GraphEvent::DragEnded { moves } = &events[0] else {
            panic!("expected DragEnded");
        };
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].id, "a".into());
    }

    #[test]
    fn test_resize_applies_clamped_delta() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 0.0, 0.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        sessions
            .begin_resize(&mut store, &viewport, point2(100.0, 60.0), &"a".into())
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(40.0, 20.0));
        assert_eq!(store.node(&"a".into()).unwrap().size, size2(140.0, 80.0));

        // Shrinking far below the minimum clamps.
        sessions.update(&mut store, &viewport, vec2(-1000.0, -1000.0));
        let min = sessions.config().min_node_size;
        assert_eq!(store.node(&"a".into()).unwrap().size, min);

        sessions.cancel(&mut store);
        assert_eq!(store.node(&"a".into()).unwrap().size, size2(100.0, 60.0));
    }

    #[test]
    fn test_resize_end_event_carries_originals() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 0.0, 0.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        let log = record_events(&mut store);
        sessions
            .begin_resize(&mut store, &viewport, point2(100.0, 60.0), &"a".into())
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(50.0, 0.0));
        sessions.end(&mut store);

        assert_eq!(names(&log), vec!["resize_started", "resize_ended"]);
        let events = log.borrow();
        let GraphEvent::ResizeEnded { resizes } = &events[1] else {
            panic!("expected ResizeEnded");
        };
        assert_eq!(
            resizes,
            &vec![NodeResize {
                id: "a".into(),
                from: size2(100.0, 60.0),
                to: size2(150.0, 60.0),
            }]
        );
    }

    fn connectable(id: &str, x: f64) -> Node {
        plain(id, x, 0.0)
            .with_inputs(vec![Port::input("in", "float").with_id(format!("{id}:in"))])
            .with_outputs(vec![Port::output("out", "float").with_id(format!("{id}:out"))])
    }

    fn drag_to_port(
        sessions: &mut SessionManager,
        store: &mut GraphStore,
        viewport: &Viewport,
        from: GraphPoint,
        target: GraphPoint,
    ) {
        let delta = target - from;
        sessions.update(store, viewport, vec2(delta.x, delta.y));
    }

    #[test]
    fn test_connection_drag_commits_on_valid_target() {
        let mut store = GraphStore::new();
        store.add_node(connectable("a", 0.0));
        store.add_node(connectable("b", 400.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        let layout = PortLayout::default();
        let start = layout
            .anchor(store.node(&"a".into()).unwrap(), &"a:out".into())
            .unwrap();
        let target = layout
            .anchor(store.node(&"b".into()).unwrap(), &"b:in".into())
            .unwrap();

        sessions
            .begin_connection(
                &mut store,
                &viewport,
                point2(start.x, start.y),
                &"a".into(),
                &"a:out".into(),
            )
            .unwrap();
        drag_to_port(&mut sessions, &mut store, &viewport, start, target);
        assert_eq!(
            sessions.candidate_port(),
            Some(&("b".into(), "b:in".into()))
        );

        sessions.end(&mut store);
        assert_eq!(store.connection_count(), 1);
        let connection = store.connections().next().unwrap();
        assert_eq!(connection.source_node, "a".into());
        assert_eq!(connection.target_node, "b".into());
    }

    #[test]
    fn test_connection_drag_from_input_side_orients_commit() {
        let mut store = GraphStore::new();
        store.add_node(connectable("a", 0.0));
        store.add_node(connectable("b", 400.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        let layout = PortLayout::default();
        let start = layout
            .anchor(store.node(&"b".into()).unwrap(), &"b:in".into())
            .unwrap();
        let target = layout
            .anchor(store.node(&"a".into()).unwrap(), &"a:out".into())
            .unwrap();

        sessions
            .begin_connection(
                &mut store,
                &viewport,
                point2(start.x, start.y),
                &"b".into(),
                &"b:in".into(),
            )
            .unwrap();
        drag_to_port(&mut sessions, &mut store, &viewport, start, target);
        sessions.end(&mut store);

        let connection = store.connections().next().unwrap();
        assert_eq!(connection.source_node, "a".into());
        assert_eq!(connection.target_node, "b".into());
    }

    #[test]
    fn test_connection_drag_over_nothing_drops() {
        let mut store = GraphStore::new();
        store.add_node(connectable("a", 0.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        let log = record_events(&mut store);
        sessions
            .begin_connection(
                &mut store,
                &viewport,
                point2(100.0, 39.0),
                &"a".into(),
                &"a:out".into(),
            )
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(500.0, 500.0));
        sessions.end(&mut store);

        assert_eq!(names(&log), vec!["connect_started", "connection_dropped"]);
        assert_eq!(store.connection_count(), 0);
        assert!(sessions.is_idle());
    }

    struct DenyEverything;

    impl ConnectionValidator for DenyEverything {
        fn validate(&self, _: &GraphStore, _: &ConnectionRequest) -> ConnectionVerdict {
            ConnectionVerdict::Deny(Some("types disagree".to_owned()))
        }
    }

    #[test]
    fn test_validator_denial_discards_connection() {
        let mut store = GraphStore::new();
        store.add_node(connectable("a", 0.0));
        store.add_node(connectable("b", 400.0));
        let mut sessions =
            SessionManager::default().with_validator(Box::new(DenyEverything));
        let viewport = Viewport::default();
        let layout = PortLayout::default();
        let start = layout
            .anchor(store.node(&"a".into()).unwrap(), &"a:out".into())
            .unwrap();
        let target = layout
            .anchor(store.node(&"b".into()).unwrap(), &"b:in".into())
            .unwrap();

        let log = record_events(&mut store);
        sessions
            .begin_connection(
                &mut store,
                &viewport,
                point2(start.x, start.y),
                &"a".into(),
                &"a:out".into(),
            )
            .unwrap();
        drag_to_port(&mut sessions, &mut store, &viewport, start, target);
        sessions.end(&mut store);

        assert_eq!(store.connection_count(), 0);
        let GraphEvent::ConnectionDropped { reason, .. } = log.borrow().last().unwrap().clone()
        else {
            panic!("expected ConnectionDropped");
        };
        assert_eq!(reason.as_deref(), Some("types disagree"));
    }

    #[test]
    fn test_marquee_previews_then_commits_one_selection_event() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 10.0, 10.0));
        store.add_node(plain("b", 300.0, 10.0));
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();
        let log = record_events(&mut store);

        sessions
            .begin_marquee(&mut store, &viewport, point2(0.0, 0.0), false)
            .unwrap();
        // Cover only "a".
        sessions.update(&mut store, &viewport, vec2(150.0, 150.0));
        assert!(store.node(&"a".into()).unwrap().selected);
        assert!(!store.node(&"b".into()).unwrap().selected);
        // Preview emitted nothing yet.
        assert_eq!(names(&log), vec!["marquee_started"]);

        sessions.end(&mut store);
        assert_eq!(names(&log), vec!["marquee_started", "selection_changed"]);
        assert_eq!(store.selected_node_ids().len(), 1);
        assert!(store.selected_node_ids().contains(&NodeId::from("a")));
    }

    #[test]
    fn test_additive_marquee_keeps_previous_selection() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 10.0, 10.0));
        store.add_node(plain("b", 300.0, 10.0));
        store.select_nodes(&["b".into()]);
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();

        sessions
            .begin_marquee(&mut store, &viewport, point2(0.0, 0.0), true)
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(150.0, 150.0));
        sessions.end(&mut store);

        assert_eq!(store.selected_node_ids().len(), 2);
    }

    #[test]
    fn test_marquee_cancel_restores_selection() {
        let mut store = GraphStore::new();
        store.add_node(plain("a", 10.0, 10.0));
        store.add_node(plain("b", 300.0, 10.0));
        store.select_nodes(&["b".into()]);
        let mut sessions = SessionManager::default();
        let viewport = Viewport::default();

        sessions
            .begin_marquee(&mut store, &viewport, point2(0.0, 0.0), false)
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(150.0, 150.0));
        assert!(store.node(&"a".into()).unwrap().selected);
        sessions.cancel(&mut store);

        assert!(!store.node(&"a".into()).unwrap().selected);
        assert!(store.node(&"b".into()).unwrap().selected);
        assert_eq!(store.selected_node_ids().len(), 1);
    }

    #[test]
    fn test_zoom_scales_marquee_coverage() {
        let mut store = GraphStore::new();
        store.add_node(plain("far", 500.0, 500.0));
        let mut sessions = SessionManager::default();
        // Zoom 0.5: a 400px screen drag spans 800 graph units.
        let viewport = Viewport::new(0.0, 0.0, 0.5);

        sessions
            .begin_marquee(&mut store, &viewport, point2(0.0, 0.0), false)
            .unwrap();
        sessions.update(&mut store, &viewport, vec2(400.0, 400.0));
        sessions.end(&mut store);
        assert!(store.selected_node_ids().contains(&NodeId::from("far")));
    }
}
