// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed coordinate spaces for the canvas.
//!
//! Node positions live in an infinite logical graph space; the viewport
//! maps them onto a finite screen. The two spaces are distinct euclid
//! units, so a screen quantity can never be handed to an API expecting a
//! graph quantity without going through the viewport transform.
//!
//! Scalars are `f64`: positions far from the origin must survive a
//! zoom round-trip with sub-pixel error, which `f32` cannot guarantee
//! past a few hundred thousand units.

use euclid::{Point2D, Rect, Size2D, Vector2D};

pub use euclid::{point2, rect, size2, vec2};

/// Unit tag for logical graph coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSpace;

/// Unit tag for viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSpace;

/// Absolute point in graph units.
pub type GraphPoint = Point2D<f64, GraphSpace>;

/// Delta between two graph points.
pub type GraphVector = Vector2D<f64, GraphSpace>;

/// Extent in graph units.
pub type GraphSize = Size2D<f64, GraphSpace>;

/// Axis-aligned rectangle in graph units.
pub type GraphRect = Rect<f64, GraphSpace>;

/// Absolute point in viewport pixels.
pub type ScreenPoint = Point2D<f64, ScreenSpace>;

/// Delta between two screen points.
pub type ScreenVector = Vector2D<f64, ScreenSpace>;

/// Extent in viewport pixels.
pub type ScreenSize = Size2D<f64, ScreenSpace>;

/// Axis-aligned rectangle in viewport pixels.
pub type ScreenRect = Rect<f64, ScreenSpace>;
