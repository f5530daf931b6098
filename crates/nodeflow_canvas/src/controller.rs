// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host-facing canvas controller.
//!
//! [`CanvasController`] wires the store, viewport, session manager,
//! visibility index, extension registry, and recompute debouncer into
//! the single mutation surface a host embeds. Everything stays
//! single-threaded and synchronous: controller calls mutate, events
//! reach store listeners inside the mutating call, and extensions see
//! the same events immediately afterwards, in order.
//!
//! Hosts that reach past the controller via [`CanvasController::store_mut`]
//! still get extension delivery and recompute scheduling: pending
//! events are pumped at the next controller call or [`CanvasController::tick`].

use crate::debounce::Debouncer;
use crate::extension::{CanvasExtension, ExtensionId, ExtensionRegistry};
use crate::session::{ConnectionValidator, SessionConfig, SessionError, SessionManager};
use crate::visibility::{
    ChordPathProvider, ConnectionPathProvider, VisibilityIndex, VisibilityOptions, VisibleSet,
};
use crate::layout::PortLocator;
use nodeflow_graph::connection::{Connection, ConnectionId};
use nodeflow_graph::document::GraphDocument;
use nodeflow_graph::event::{GraphEvent, ListenerId};
use nodeflow_graph::node::{Node, NodeId};
use nodeflow_graph::port::PortId;
use nodeflow_graph::space::{GraphSize, GraphVector, ScreenPoint, ScreenSize, ScreenVector};
use nodeflow_graph::store::{ConnectError, GraphStore};
use nodeflow_graph::viewport::{Viewport, ZoomLimits};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Bundled tuning for a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    /// Zoom clamp range for the clamped viewport paths.
    pub zoom_limits: ZoomLimits,
    /// Session tuning.
    pub session: SessionConfig,
    /// Visibility query tuning.
    pub visibility: VisibilityOptions,
    /// Quiescence window for the debounced recompute signal.
    pub quiescence: Duration,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom_limits: ZoomLimits::default(),
            session: SessionConfig::default(),
            visibility: VisibilityOptions::default(),
            quiescence: crate::debounce::DEFAULT_QUIESCENCE,
        }
    }
}

/// The embeddable interaction engine, assembled.
pub struct CanvasController {
    store: GraphStore,
    viewport: Viewport,
    zoom_limits: ZoomLimits,
    sessions: SessionManager,
    visibility: VisibilityIndex,
    extensions: ExtensionRegistry,
    recompute: Debouncer,
    queue: Rc<RefCell<Vec<GraphEvent>>>,
    dirty: bool,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasController {
    /// Create a controller with default tuning.
    pub fn new() -> Self {
        Self::with_config(CanvasConfig::default())
    }

    /// Create a controller with explicit tuning.
    pub fn with_config(config: CanvasConfig) -> Self {
        let mut store = GraphStore::new();
        let queue: Rc<RefCell<Vec<GraphEvent>>> = Rc::default();
        let sink = queue.clone();
        store.subscribe(Box::new(move |event| sink.borrow_mut().push(event.clone())));
        Self {
            store,
            viewport: Viewport::default(),
            zoom_limits: config.zoom_limits,
            sessions: SessionManager::new(config.session),
            visibility: VisibilityIndex::new(
                config.visibility,
                Box::new(ChordPathProvider::default()),
            ),
            extensions: ExtensionRegistry::new(),
            recompute: Debouncer::new(config.quiescence),
            queue,
            dirty: false,
        }
    }

    /// Replace the connection validation hook.
    pub fn with_validator(mut self, validator: Box<dyn ConnectionValidator>) -> Self {
        self.sessions = std::mem::take(&mut self.sessions).with_validator(validator);
        self
    }

    /// Replace the port geometry used for hit-testing and the default
    /// connection bounds.
    pub fn with_layout(mut self, layout: Box<dyn PortLocator>) -> Self {
        self.sessions = std::mem::take(&mut self.sessions).with_layout(layout);
        self
    }

    /// Replace the connection path provider used by visibility queries.
    pub fn with_path_provider(mut self, provider: Box<dyn ConnectionPathProvider>) -> Self {
        let options = self.visibility.options;
        self.visibility = VisibilityIndex::new(options, provider);
        self
    }

    // --- plumbing ---------------------------------------------------

    /// Forward events captured from the store to the extensions and
    /// mark the recompute signal dirty.
    fn pump(&mut self) {
        let events: Vec<GraphEvent> = self.queue.borrow_mut().drain(..).collect();
        if events.is_empty() {
            return;
        }
        self.dirty = true;
        for event in &events {
            self.extensions.dispatch(event);
        }
    }

    /// Frame hook. Schedules the debounced recompute while mutations
    /// keep arriving and returns `true` once, after a quiescence window
    /// with none. Hosts drive this from their render loop.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.pump();
        if self.dirty {
            self.recompute.schedule(now);
            self.dirty = false;
        }
        self.recompute.poll(now)
    }

    // --- store access -----------------------------------------------

    /// Read access to the store.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Direct mutable access to the store for operations the facade
    /// does not wrap. Events emitted this way reach extensions at the
    /// next controller call.
    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    /// Register a host event listener.
    pub fn subscribe(&mut self, listener: Box<dyn FnMut(&GraphEvent)>) -> ListenerId {
        self.store.subscribe(listener)
    }

    /// Remove a host event listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    // --- graph mutation ---------------------------------------------

    /// Add a node. See [`GraphStore::add_node`].
    pub fn add_node(&mut self, node: Node) -> bool {
        let added = self.store.add_node(node);
        self.pump();
        added
    }

    /// Remove a node and its connections. See [`GraphStore::remove_node`].
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let removed = self.store.remove_node(id);
        self.pump();
        removed
    }

    /// Translate a node.
    pub fn move_node(&mut self, id: &NodeId, delta: GraphVector) -> bool {
        let moved = self.store.move_node(id, delta);
        self.pump();
        moved
    }

    /// Resize a node.
    pub fn resize_node(&mut self, id: &NodeId, size: GraphSize) -> bool {
        let resized = self.store.set_node_size(id, size);
        self.pump();
        resized
    }

    /// Connect an output port to an input port.
    pub fn connect(
        &mut self,
        source_node: &NodeId,
        source_port: &PortId,
        target_node: &NodeId,
        target_port: &PortId,
    ) -> Result<ConnectionId, ConnectError> {
        let result = self
            .store
            .connect(source_node, source_port, target_node, target_port);
        self.pump();
        result
    }

    /// Remove a connection.
    pub fn disconnect(&mut self, id: &ConnectionId) -> Option<Connection> {
        let removed = self.store.remove_connection(id);
        self.pump();
        removed
    }

    /// Select a node, optionally adding to the selection.
    pub fn select_node(&mut self, id: &NodeId, additive: bool) -> bool {
        let changed = self.store.select_node(id, additive);
        self.pump();
        changed
    }

    /// Select a connection, optionally adding to the selection.
    pub fn select_connection(&mut self, id: &ConnectionId, additive: bool) -> bool {
        let changed = self.store.select_connection(id, additive);
        self.pump();
        changed
    }

    /// Clear both selections.
    pub fn clear_selection(&mut self) -> bool {
        let nodes = self.store.clear_node_selection();
        let connections = self.store.clear_connection_selection();
        self.pump();
        nodes || connections
    }

    /// Empty the graph.
    pub fn clear_graph(&mut self) -> bool {
        let cleared = self.store.clear_graph();
        self.pump();
        cleared
    }

    /// Replace the graph from a document.
    pub fn load_graph(&mut self, document: GraphDocument) {
        self.store.load_graph(document);
        self.pump();
    }

    /// Snapshot the graph as a document.
    pub fn export_graph(&self) -> GraphDocument {
        self.store.export_graph()
    }

    // --- viewport ---------------------------------------------------

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Zoom clamp range in effect.
    pub fn zoom_limits(&self) -> ZoomLimits {
        self.zoom_limits
    }

    fn viewport_changed(&mut self, previous: Viewport) {
        if self.viewport != previous {
            let viewport = self.viewport;
            self.store
                .emit(GraphEvent::ViewportChanged { viewport, previous });
        }
        self.pump();
    }

    /// Replace the viewport wholesale. This path does not clamp; it is
    /// the caller's responsibility not to install a non-positive zoom.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        let previous = self.viewport;
        self.viewport = viewport;
        self.viewport_changed(previous);
    }

    /// Set the zoom factor, clamped.
    pub fn set_zoom(&mut self, zoom: f64) {
        let previous = self.viewport;
        self.viewport.set_zoom(zoom, &self.zoom_limits);
        self.viewport_changed(previous);
    }

    /// Multiply the zoom factor, clamped.
    pub fn zoom_by(&mut self, factor: f64) {
        let previous = self.viewport;
        self.viewport.zoom_by(factor, &self.zoom_limits);
        self.viewport_changed(previous);
    }

    /// Zoom about a screen anchor (typically the cursor), clamped.
    pub fn zoom_about(&mut self, factor: f64, anchor: ScreenPoint) {
        let previous = self.viewport;
        self.viewport.zoom_about(factor, anchor, &self.zoom_limits);
        self.viewport_changed(previous);
    }

    /// Pan by a screen delta.
    pub fn pan_by(&mut self, delta: ScreenVector) {
        let previous = self.viewport;
        self.viewport.pan_by(delta);
        self.viewport_changed(previous);
    }

    // --- sessions ---------------------------------------------------

    /// The session manager, for state queries (kind, candidate port,
    /// marquee rectangle).
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Start dragging a node.
    pub fn begin_node_drag(
        &mut self,
        anchor: ScreenPoint,
        target: &NodeId,
    ) -> Result<(), SessionError> {
        let result = self
            .sessions
            .begin_node_drag(&mut self.store, &self.viewport, anchor, target);
        self.pump();
        result
    }

    /// Start resizing a node.
    pub fn begin_resize(
        &mut self,
        anchor: ScreenPoint,
        target: &NodeId,
    ) -> Result<(), SessionError> {
        let result = self
            .sessions
            .begin_resize(&mut self.store, &self.viewport, anchor, target);
        self.pump();
        result
    }

    /// Start dragging out a connection from a port.
    pub fn begin_connection(
        &mut self,
        anchor: ScreenPoint,
        node: &NodeId,
        port: &PortId,
    ) -> Result<(), SessionError> {
        let result =
            self.sessions
                .begin_connection(&mut self.store, &self.viewport, anchor, node, port);
        self.pump();
        result
    }

    /// Start a marquee selection.
    pub fn begin_marquee(
        &mut self,
        anchor: ScreenPoint,
        additive: bool,
    ) -> Result<(), SessionError> {
        let result = self
            .sessions
            .begin_marquee(&mut self.store, &self.viewport, anchor, additive);
        self.pump();
        result
    }

    /// Feed a pointer movement into the active session.
    pub fn pointer_moved(&mut self, delta: ScreenVector) {
        self.sessions.update(&mut self.store, &self.viewport, delta);
        self.pump();
    }

    /// Commit the active session.
    pub fn end_session(&mut self) {
        self.sessions.end(&mut self.store);
        self.pump();
    }

    /// Abort the active session, restoring pre-session state.
    pub fn cancel_session(&mut self) {
        self.sessions.cancel(&mut self.store);
        self.pump();
    }

    // --- queries ----------------------------------------------------

    /// Nodes and connections overlapping the visible area for the
    /// current viewport.
    pub fn visible(&self, screen: ScreenSize) -> VisibleSet {
        self.visibility
            .visible_set(&self.store, &self.viewport, screen)
    }

    // --- extensions -------------------------------------------------

    /// Attach an extension.
    pub fn add_extension(&mut self, extension: Box<dyn CanvasExtension>) -> ExtensionId {
        let id = self.extensions.add(extension, &mut self.store);
        self.pump();
        id
    }

    /// Detach an extension.
    pub fn remove_extension(&mut self, id: ExtensionId) -> bool {
        let removed = self.extensions.remove(id, &mut self.store);
        self.pump();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow_graph::port::Port;
    use nodeflow_graph::space::{point2, size2, vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn plain(id: &str, x: f64, y: f64) -> Node {
        Node::new("n").with_id(id).with_position(x, y).with_size(100.0, 60.0)
    }

    #[test]
    fn test_controller_forwards_events_to_extensions() {
        struct Tally {
            log: Rc<RefCell<Vec<&'static str>>>,
        }
        impl CanvasExtension for Tally {
            fn on_event(&mut self, event: &GraphEvent) {
                self.log.borrow_mut().push(event.name());
            }
        }

        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut canvas = CanvasController::new();
        canvas.add_extension(Box::new(Tally { log: log.clone() }));
        canvas.add_node(plain("a", 0.0, 0.0));
        canvas.select_node(&"a".into(), false);
        assert_eq!(*log.borrow(), vec!["node_added", "selection_changed"]);
    }

    #[test]
    fn test_direct_store_mutation_pumps_on_next_call() {
        struct Tally {
            log: Rc<RefCell<Vec<&'static str>>>,
        }
        impl CanvasExtension for Tally {
            fn on_event(&mut self, event: &GraphEvent) {
                self.log.borrow_mut().push(event.name());
            }
        }

        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut canvas = CanvasController::new();
        canvas.add_extension(Box::new(Tally { log: log.clone() }));
        canvas.store_mut().add_node(plain("a", 0.0, 0.0));
        assert!(log.borrow().is_empty());
        canvas.tick(Instant::now());
        assert_eq!(*log.borrow(), vec!["node_added"]);
    }

    #[test]
    fn test_recompute_fires_after_quiescence() {
        let mut canvas = CanvasController::new();
        let start = Instant::now();
        canvas.add_node(plain("a", 0.0, 0.0));
        assert!(!canvas.tick(start));
        // Still inside the window.
        assert!(!canvas.tick(start + Duration::from_millis(10)));
        // Another edit restarts the window.
        canvas.add_node(plain("b", 0.0, 0.0));
        assert!(!canvas.tick(start + Duration::from_millis(30)));
        assert!(!canvas.tick(start + Duration::from_millis(60)));
        assert!(canvas.tick(start + Duration::from_millis(90)));
        // One firing per burst.
        assert!(!canvas.tick(start + Duration::from_millis(200)));
    }

    #[test]
    fn test_zoom_paths_clamp_and_emit_once() {
        let mut canvas = CanvasController::new();
        let events: Rc<RefCell<Vec<GraphEvent>>> = Rc::default();
        let sink = events.clone();
        canvas.subscribe(Box::new(move |event| sink.borrow_mut().push(event.clone())));

        canvas.zoom_by(100.0);
        assert_eq!(canvas.viewport().zoom, canvas.zoom_limits().max_zoom);
        assert_eq!(events.borrow().len(), 1);

        // Already at the clamp: no change, no event.
        canvas.zoom_by(2.0);
        assert_eq!(events.borrow().len(), 1);

        // Direct replacement is unclamped.
        canvas.set_viewport(Viewport::new(10.0, 10.0, 100.0));
        assert_eq!(canvas.viewport().zoom, 100.0);
        assert_eq!(events.borrow().len(), 2);
        let events = events.borrow();
        let GraphEvent::ViewportChanged { previous, .. } = &events[1] else {
            panic!("expected ViewportChanged");
        };
        assert_eq!(previous.zoom, canvas.zoom_limits().max_zoom);
    }

    #[test]
    fn test_pan_emits_viewport_event() {
        let mut canvas = CanvasController::new();
        let events: Rc<RefCell<Vec<GraphEvent>>> = Rc::default();
        let sink = events.clone();
        canvas.subscribe(Box::new(move |event| sink.borrow_mut().push(event.clone())));

        canvas.pan_by(vec2(25.0, -10.0));
        assert_eq!(canvas.viewport().x, 25.0);
        assert_eq!(canvas.viewport().y, -10.0);
        let events = events.borrow();
        let GraphEvent::ViewportChanged { viewport, previous } = &events[0] else {
            panic!("expected ViewportChanged");
        };
        assert_eq!(*previous, Viewport::default());
        assert_eq!(viewport.x, 25.0);
    }

    #[test]
    fn test_session_flow_through_controller() {
        let mut canvas = CanvasController::new();
        canvas.add_node(plain("a", 0.0, 0.0));
        canvas
            .begin_node_drag(point2(0.0, 0.0), &"a".into())
            .unwrap();
        canvas.pointer_moved(vec2(30.0, 40.0));
        canvas.end_session();
        assert_eq!(
            canvas.store().node(&"a".into()).unwrap().position,
            point2(30.0, 40.0)
        );
        assert!(canvas.sessions().is_idle());
    }

    #[test]
    fn test_visible_query_tracks_viewport() {
        let mut canvas = CanvasController::new();
        canvas.add_node(plain("a", 2000.0, 0.0));
        assert!(canvas.visible(size2(800.0, 600.0)).nodes.is_empty());
        canvas.pan_by(vec2(-1900.0, 0.0));
        assert_eq!(canvas.visible(size2(800.0, 600.0)).nodes.len(), 1);
    }

    #[test]
    fn test_export_load_round_trip_through_controller() {
        let mut canvas = CanvasController::new();
        canvas.add_node(
            plain("a", 0.0, 0.0).with_outputs(vec![Port::output("out", "float").with_id("a:out")]),
        );
        canvas.add_node(
            plain("b", 300.0, 0.0).with_inputs(vec![Port::input("in", "float").with_id("b:in")]),
        );
        canvas
            .connect(&"a".into(), &"a:out".into(), &"b".into(), &"b:in".into())
            .unwrap();

        let document = canvas.export_graph();
        let mut restored = CanvasController::new();
        restored.load_graph(document.clone());
        assert_eq!(restored.export_graph(), document);

        restored.clear_graph();
        assert_eq!(restored.store().node_count(), 0);
    }
}
