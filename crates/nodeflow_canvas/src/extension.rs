// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas extensions.
//!
//! Optional behaviors (auto-layout nudges, badges, bookkeeping
//! overlays) plug in as objects implementing [`CanvasExtension`], held
//! in an ordered registry and invoked explicitly at defined points:
//! attach, every committed event, detach. The set of hook points is
//! deliberately small and closed; extensions never mutate the store
//! from inside a delivery.

use nodeflow_graph::event::GraphEvent;
use nodeflow_graph::store::GraphStore;
use tracing::debug;

/// Handle returned by [`ExtensionRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionId(u64);

/// A pluggable canvas behavior.
pub trait CanvasExtension {
    /// Short name for logging.
    fn name(&self) -> &str {
        "extension"
    }

    /// Called once when the extension joins the registry.
    fn attach(&mut self, store: &mut GraphStore) {
        let _ = store;
    }

    /// Called once when the extension leaves the registry.
    fn detach(&mut self, store: &mut GraphStore) {
        let _ = store;
    }

    /// Called for every committed event, in registry order.
    fn on_event(&mut self, event: &GraphEvent) {
        let _ = event;
    }
}

/// Ordered collection of live extensions.
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: Vec<(ExtensionId, Box<dyn CanvasExtension>)>,
    next_id: u64,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.entries.len())
            .finish()
    }
}

impl ExtensionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an extension and add it to the dispatch order.
    pub fn add(
        &mut self,
        mut extension: Box<dyn CanvasExtension>,
        store: &mut GraphStore,
    ) -> ExtensionId {
        let id = ExtensionId(self.next_id);
        self.next_id += 1;
        debug!(extension = extension.name(), "extension attached");
        extension.attach(store);
        self.entries.push((id, extension));
        id
    }

    /// Detach and drop an extension. Returns whether it was present.
    pub fn remove(&mut self, id: ExtensionId, store: &mut GraphStore) -> bool {
        let Some(index) = self.entries.iter().position(|(entry, _)| *entry == id) else {
            return false;
        };
        let (_, mut extension) = self.entries.remove(index);
        debug!(extension = extension.name(), "extension detached");
        extension.detach(store);
        true
    }

    /// Number of live extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver an event to every extension in registration order.
    pub fn dispatch(&mut self, event: &GraphEvent) {
        for (_, extension) in &mut self.entries {
            extension.on_event(event);
        }
    }
}
