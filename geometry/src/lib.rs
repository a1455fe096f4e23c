//!
//! # carta_geometry
//!
//! `carta_geometry` provides the geometry model for the carta rendering pipeline: a closed
//! set of typed geometries (points, lines, rings, polygons, their multi- variants, circles
//! and collections) that all store their vertices in a single flat coordinate buffer.
//!
//! Storing coordinates flat keeps the renderers free of per-point allocations: every
//! algorithm in the `flat` module is a free function over a `(buffer, offset, end, stride)`
//! tuple, and the geometry types are thin owners of one such buffer plus cached derived
//! state (extents, orientations, simplified copies) that is invalidated through a revision
//! counter whenever the buffer changes.
//!
//! The renderers in `carta_render_raster` and `carta_render_gpu` consume these geometries
//! through the capability surface on the `Geometry` enum: `extent()`, `closest_point_xy()`,
//! `intersects_extent()`, `simplified()` and the in-place transform operations.
//!

#![warn(bare_trait_objects)]

#[macro_use]
extern crate serde_derive;

mod base;
mod circle;
mod collection;
mod extent;
mod geometry;
mod layout;
mod line_string;
mod linear_ring;
mod multi_line_string;
mod multi_point;
mod multi_polygon;
mod point;
mod polygon;
mod transform;

pub mod flat;

pub use self::base::*;
pub use self::circle::*;
pub use self::collection::*;
pub use self::extent::*;
pub use self::geometry::*;
pub use self::layout::*;
pub use self::line_string::*;
pub use self::linear_ring::*;
pub use self::multi_line_string::*;
pub use self::multi_point::*;
pub use self::multi_polygon::*;
pub use self::point::*;
pub use self::polygon::*;
pub use self::transform::*;
