//!
//! # carta_replay
//!
//! `carta_replay` describes drawing work without performing it. A replay is a recorded
//! program: an ordered list of `Instruction` values plus one shared coordinate buffer,
//! produced once per (z-index, drawing-type) bucket while features are walked, and then
//! executed any number of times against a concrete surface at whatever transform each
//! frame needs.
//!
//! This crate owns the pieces both backends share: the instruction set itself, the
//! resolved style primitives handed across the boundary from the style model, the
//! `GeometryRenderer` contract that turns geometries into recorded instructions, and the
//! drawing-type/z-index ordering that makes a group of replays compose into one frame.
//!
//! The two executors live in their own crates: `carta_render_raster` replays against a
//! 2D raster context and `carta_render_gpu` compiles the same drawing contract into
//! vertex/index buffers and batched draw commands.
//!

#![warn(bare_trait_objects)]

#[macro_use]
extern crate serde_derive;

mod feature;
mod instruction;
mod renderer;
mod replay_type;
mod style;

pub use self::feature::*;
pub use self::instruction::*;
pub use self::renderer::*;
pub use self::replay_type::*;
pub use self::style::*;
