//!
//! Stride-aware algorithms over flat coordinate buffers
//!
//! Every function here operates on a `(buffer, offset, end, stride)` tuple — or the
//! `ends`/`endss` generalisations for multi-part geometries — so the geometry types can
//! stay thin owners of a single buffer and the renderers can run the same code over any
//! layout. Functions that produce coordinates write XY pairs into a destination buffer:
//! derived geometry is always two-dimensional.
//!

mod area;
mod center;
mod closest;
mod contains;
mod interior_point;
mod intersects_extent;
mod length;
mod orient;
mod reverse;
mod segments;
mod simplify;
mod straight_chunk;
mod transform;

pub use self::area::*;
pub use self::center::*;
pub use self::closest::*;
pub use self::contains::*;
pub use self::interior_point::*;
pub use self::intersects_extent::*;
pub use self::length::*;
pub use self::orient::*;
pub use self::reverse::*;
pub use self::segments::*;
pub use self::simplify::*;
pub use self::straight_chunk::*;
pub use self::transform::*;
