//!
//! # carta_render_gpu
//!
//! `carta_render_gpu` compiles carta drawing into GPU primitives. Where the raster
//! backend records an instruction tape, this backend builds CPU-side vertex and index
//! buffers: polygons triangulate by ear clipping with hole bridging, lines tessellate
//! into quads with per-vertex join/cap instruction encodings, circles become one
//! analytic quad each, and markers and glyphs become textured quads out of a
//! shelf-packed atlas.
//!
//! Draw time walks style groups back to front and emits a backend-agnostic
//! `DrawCommand` stream; the device executor that turns the stream into GL/Metal/wgpu
//! calls lives with the map shell. The bundled `SoftwareRasterizer` executes the same
//! stream on the CPU, which is how feature hit detection works (one feature at a time
//! into a 1x1 framebuffer, reading back the alpha channel) and how the tests see pixels.
//!

#![warn(bare_trait_objects)]

mod atlas;
mod buffer;
mod circle_replay;
mod command;
mod image_replay;
mod line_string_replay;
mod polygon_replay;
mod replay_group;
mod software_rasterizer;
mod text_replay;
mod vertex;

pub mod triangulate;

pub use self::atlas::*;
pub use self::buffer::*;
pub use self::circle_replay::*;
pub use self::command::*;
pub use self::image_replay::*;
pub use self::line_string_replay::*;
pub use self::polygon_replay::*;
pub use self::replay_group::*;
pub use self::software_rasterizer::*;
pub use self::text_replay::*;
pub use self::vertex::*;
