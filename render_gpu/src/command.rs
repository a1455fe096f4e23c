use carta_geometry::*;
use carta_replay::*;

use std::sync::Arc;

///
/// The vertex layouts a draw command stream can bind
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VertexLayout {
    Polygon,
    Line,
    Circle,
    Textured,
}

impl VertexLayout {
    ///
    /// How many floats one vertex of this layout occupies
    ///
    pub fn floats_per_vertex(&self) -> usize {
        match self {
            VertexLayout::Polygon   => 2,
            VertexLayout::Line      => 5,
            VertexLayout::Circle    => 4,
            VertexLayout::Textured  => 8,
        }
    }
}

///
/// The uniform block active for a group of indexed draws
///
/// A fully transparent colour switches that half of the drawing off: a fill-only style
/// carries a transparent stroke and vice versa.
///
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Uniforms {
    pub fill_color:     Rgba,
    pub stroke_color:   Rgba,
    pub line_width:     f32,
    pub miter_limit:    f32,
    pub opacity:        f32,
}

impl Uniforms {
    ///
    /// Uniforms drawing nothing, the state before any style is set
    ///
    pub fn transparent() -> Uniforms {
        Uniforms {
            fill_color:     Rgba([0, 0, 0, 0]),
            stroke_color:   Rgba([0, 0, 0, 0]),
            line_width:     0.0,
            miter_limit:    10.0,
            opacity:        1.0,
        }
    }
}

///
/// One step of a backend-agnostic draw command stream
///
/// A GPU replay compiles its recorded drawing into a sequence of these; the device
/// executor that turns them into actual GL/Metal/wgpu calls lives with the map shell.
/// The bundled `SoftwareRasterizer` executes the same stream on the CPU for hit
/// detection and tests, which keeps the stream honest: anything a command cannot
/// express cannot be drawn.
///
#[derive(Clone, Debug)]
pub enum DrawCommand {
    /// Sets the map-unit to device-pixel transform for subsequent draws
    SetTransform(Transform),

    /// Sets the view rotation used by rotate-with-view texture offsets
    SetViewRotation(f64),

    /// Replaces the bound vertex buffer
    UploadVertices { layout: VertexLayout, vertices: Arc<Vec<f32>> },

    /// Replaces the bound index buffer
    UploadIndices(Arc<Vec<u32>>),

    /// Sets the uniform block for subsequent draws
    SetUniforms(Uniforms),

    /// Binds the texture sampled by textured-layout draws
    BindTexture(ImageRaster),

    /// Draws `count` indices starting at `first` from the bound buffers
    DrawIndexed { first: usize, count: usize },
}
