///
/// Per-vertex instruction values consumed by the vertex stage
///
/// Line vertices carry one of these so the shader (or the bundled software rasterizer)
/// knows whether it is expanding a plain segment corner, a cap, or a join when it
/// applies the half-line-width offset.
///
pub const INSTRUCTION_SEGMENT: f32      = 0.0;
pub const INSTRUCTION_CAP_BEGIN: f32    = 1.0;
pub const INSTRUCTION_CAP_END: f32      = 2.0;
pub const INSTRUCTION_JOIN_BEVEL: f32   = 3.0;
pub const INSTRUCTION_JOIN_MITER: f32   = 4.0;
pub const INSTRUCTION_JOIN_ROUND: f32   = 5.0;

///
/// A polygon fill vertex: triangulated positions need nothing else
///
#[derive(Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct PolygonVertex {
    pub pos: [f32; 2],
}

impl PolygonVertex {
    pub fn new(x: f32, y: f32) -> PolygonVertex {
        PolygonVertex { pos: [x, y] }
    }

    pub fn push_to(&self, vertices: &mut Vec<f32>) {
        vertices.extend_from_slice(&self.pos);
    }
}

///
/// A line tessellation vertex
///
/// The position is on the line's spine; the offset direction is a unit (or
/// miter-scaled) vector the vertex stage multiplies by half the current line width, so
/// one tessellation serves any stroke width without rebuilding.
///
#[derive(Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct LineVertex {
    pub pos:            [f32; 2],
    pub offset_dir:     [f32; 2],
    pub instruction:    f32,
}

impl LineVertex {
    pub fn new(x: f32, y: f32, offset_x: f32, offset_y: f32, instruction: f32) -> LineVertex {
        LineVertex {
            pos:            [x, y],
            offset_dir:     [offset_x, offset_y],
            instruction,
        }
    }

    pub fn push_to(&self, vertices: &mut Vec<f32>) {
        vertices.extend_from_slice(&self.pos);
        vertices.extend_from_slice(&self.offset_dir);
        vertices.push(self.instruction);
    }
}

///
/// A circle vertex: four of these per circle, expanded to a quad by corner index and
/// discarded per-fragment outside the analytic radius
///
#[derive(Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct CircleVertex {
    pub pos:            [f32; 2],
    pub instruction:    f32,
    pub radius:         f32,
}

impl CircleVertex {
    pub fn new(x: f32, y: f32, corner: u32, radius: f32) -> CircleVertex {
        CircleVertex {
            pos:            [x, y],
            instruction:    corner as f32,
            radius,
        }
    }

    pub fn push_to(&self, vertices: &mut Vec<f32>) {
        vertices.extend_from_slice(&self.pos);
        vertices.push(self.instruction);
        vertices.push(self.radius);
    }
}

///
/// A textured quad vertex for image and glyph stamps
///
/// The offset is in device pixels from the transformed anchor: icons keep their pixel
/// size at every zoom level because only the anchor goes through the map transform.
///
#[derive(Clone, Copy, PartialEq, Debug)]
#[repr(C)]
pub struct TexturedVertex {
    pub pos:                [f32; 2],
    pub offset:             [f32; 2],
    pub tex:                [f32; 2],
    pub opacity:            f32,
    pub rotate_with_view:   f32,
}

impl TexturedVertex {
    pub fn push_to(&self, vertices: &mut Vec<f32>) {
        vertices.extend_from_slice(&self.pos);
        vertices.extend_from_slice(&self.offset);
        vertices.extend_from_slice(&self.tex);
        vertices.push(self.opacity);
        vertices.push(self.rotate_with_view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_pack_their_declared_float_counts() {
        let mut floats = vec![];

        PolygonVertex::new(1.0, 2.0).push_to(&mut floats);
        assert!(floats.len() == 2);

        floats.clear();
        LineVertex::new(1.0, 2.0, 0.0, 1.0, INSTRUCTION_SEGMENT).push_to(&mut floats);
        assert!(floats.len() == 5);

        floats.clear();
        CircleVertex::new(1.0, 2.0, 3, 4.0).push_to(&mut floats);
        assert!(floats.len() == 4);

        floats.clear();
        TexturedVertex { pos: [0.0, 0.0], offset: [1.0, 1.0], tex: [0.0, 1.0], opacity: 1.0, rotate_with_view: 0.0 }.push_to(&mut floats);
        assert!(floats.len() == 8);
    }
}
