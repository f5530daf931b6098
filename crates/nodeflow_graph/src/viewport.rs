// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pan/zoom viewport and the graph/screen coordinate transform.
//!
//! The transform is `screen = graph * zoom + pan`. Points and rectangles
//! go through the full transform; offsets are scale-only because a delta
//! has no origin to pan.

use crate::space::{
    GraphPoint, GraphRect, GraphSize, GraphVector, ScreenPoint, ScreenRect, ScreenSize,
    ScreenVector,
};
use serde::{Deserialize, Serialize};

/// Zoom clamp range applied by every zoom-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    /// Smallest zoom factor reachable through clamped paths.
    pub min_zoom: f64,
    /// Largest zoom factor reachable through clamped paths.
    pub max_zoom: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 4.0,
        }
    }
}

impl ZoomLimits {
    /// Clamp a zoom factor into the configured range.
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Pan/zoom state mapping graph space onto the screen.
///
/// `x`/`y` is the screen position of the graph-space origin. Missing
/// fields deserialize to the identity transform (`0, 0, 1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Horizontal pan offset in screen pixels.
    pub x: f64,
    /// Vertical pan offset in screen pixels.
    pub y: f64,
    /// Scale factor from graph units to screen pixels.
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport from raw pan/zoom values. No clamping is applied.
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    /// Effective scale factor.
    ///
    /// A non-positive zoom can only come from unchecked direct
    /// replacement; fall back to identity scale rather than divide by
    /// zero in the middle of an input gesture.
    fn scale(&self) -> f64 {
        if self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }

    /// Map a graph point to its screen position.
    pub fn to_screen(&self, point: GraphPoint) -> ScreenPoint {
        let scale = self.scale();
        ScreenPoint::new(point.x * scale + self.x, point.y * scale + self.y)
    }

    /// Map a screen point to its graph position.
    pub fn to_graph(&self, point: ScreenPoint) -> GraphPoint {
        let scale = self.scale();
        GraphPoint::new((point.x - self.x) / scale, (point.y - self.y) / scale)
    }

    /// Scale a graph delta to screen pixels. Pan does not apply to deltas.
    pub fn to_screen_offset(&self, offset: GraphVector) -> ScreenVector {
        let scale = self.scale();
        ScreenVector::new(offset.x * scale, offset.y * scale)
    }

    /// Scale a screen delta to graph units. Pan does not apply to deltas.
    pub fn to_graph_offset(&self, offset: ScreenVector) -> GraphVector {
        let scale = self.scale();
        GraphVector::new(offset.x / scale, offset.y / scale)
    }

    /// Transform a graph rectangle: origin through the point transform,
    /// extents scaled by zoom.
    pub fn to_screen_rect(&self, rect: GraphRect) -> ScreenRect {
        let scale = self.scale();
        ScreenRect::new(
            self.to_screen(rect.origin),
            ScreenSize::new(rect.size.width * scale, rect.size.height * scale),
        )
    }

    /// Transform a screen rectangle back into graph space.
    pub fn to_graph_rect(&self, rect: ScreenRect) -> GraphRect {
        let scale = self.scale();
        GraphRect::new(
            self.to_graph(rect.origin),
            GraphSize::new(rect.size.width / scale, rect.size.height / scale),
        )
    }

    /// The graph-space rectangle visible through a screen of the given
    /// size. A degenerate screen yields an empty area instead of feeding
    /// a zero into the division.
    pub fn visible_area(&self, screen: ScreenSize) -> GraphRect {
        if !(screen.width > 0.0 && screen.height > 0.0) {
            return GraphRect::zero();
        }
        let scale = self.scale();
        GraphRect::new(
            self.to_graph(ScreenPoint::zero()),
            GraphSize::new(screen.width / scale, screen.height / scale),
        )
    }

    /// Whether a graph point falls inside the visible area.
    pub fn is_point_visible(&self, point: GraphPoint, screen: ScreenSize) -> bool {
        self.visible_area(screen).contains(point)
    }

    /// Whether a graph rectangle overlaps the visible area.
    pub fn is_rect_visible(&self, rect: GraphRect, screen: ScreenSize) -> bool {
        self.visible_area(screen).intersects(&rect)
    }

    /// Set the zoom factor, clamped into `limits`.
    pub fn set_zoom(&mut self, zoom: f64, limits: &ZoomLimits) {
        self.zoom = limits.clamp(zoom);
    }

    /// Multiply the zoom factor, clamped into `limits`.
    pub fn zoom_by(&mut self, factor: f64, limits: &ZoomLimits) {
        self.set_zoom(self.zoom * factor, limits);
    }

    /// Multiply the zoom factor while keeping the graph point under
    /// `anchor` stationary on screen.
    pub fn zoom_about(&mut self, factor: f64, anchor: ScreenPoint, limits: &ZoomLimits) {
        let pivot = self.to_graph(anchor);
        self.set_zoom(self.zoom * factor, limits);
        let scale = self.scale();
        self.x = anchor.x - pivot.x * scale;
        self.y = anchor.y - pivot.y * scale;
    }

    /// Translate the pan offset by a screen delta.
    pub fn pan_by(&mut self, delta: ScreenVector) {
        self.x += delta.x;
        self.y += delta.y;
    }
}
