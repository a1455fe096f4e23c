//!
//! # carta_render_raster
//!
//! `carta_render_raster` executes carta drawing instructions against 2D raster surfaces.
//! Feature geometries are recorded once per render pass into per-(z-index, drawing-type)
//! replays — an instruction tape plus a parallel hit-detection tape with styles forced
//! opaque — and each frame then replays the tapes at that frame's transform without
//! re-walking any geometry.
//!
//! The pieces: the `RasterContext` surface contract, the `RasterReplay` tape builder and
//! executor with its clipping and fill/stroke batching, one concrete builder per drawing
//! type, the process-wide label cache behind the `LabelRasterizer` seam, the declutter
//! machinery for collision-aware label placement, the `RasterReplayGroup` orchestration,
//! and a scanline `SoftwareSurface` that the hit-detection probe (and the tests) render
//! into.
//!

#![warn(bare_trait_objects)]

mod clip;
mod context;
mod custom_replay;
mod declutter;
mod image_replay;
mod label_cache;
mod line_string_replay;
mod polygon_replay;
mod replay;
mod replay_group;
mod surface;
mod text_replay;

pub use self::clip::*;
pub use self::context::*;
pub use self::custom_replay::*;
pub use self::declutter::*;
pub use self::image_replay::*;
pub use self::label_cache::*;
pub use self::line_string_replay::*;
pub use self::polygon_replay::*;
pub use self::replay::*;
pub use self::replay_group::*;
pub use self::surface::*;
pub use self::text_replay::*;
