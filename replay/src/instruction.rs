use crate::feature::*;
use crate::style::*;

///
/// One primitive operation in a recorded replay
///
/// A replay is an ordered list of these plus one shared flat coordinate buffer in map
/// units: instructions refer to runs of that buffer by `begin`/`end` offsets so the
/// buffer can be projected to device pixels once per transform rather than once per
/// instruction. The list itself is backend-independent; the raster executor walks it
/// against a 2D surface and the GPU backend compiles the equivalent drawing contract
/// into vertex buffers instead.
///
/// Everything here is serialisable so a recorded tape can be persisted or shipped to a
/// remote executor. The one operation that cannot travel is a custom renderer callback:
/// the `Custom` instruction carries an index into a side table owned by the replay that
/// recorded it.
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Instruction {
    ///
    /// Brackets the instructions produced by one feature
    ///
    /// `skip_target` is the instruction index one past the matching `EndGeometry`: an
    /// executor that skips the feature jumps straight there without decoding the
    /// instructions in between.
    ///
    BeginGeometry { feature: FeatureId, skip_target: usize },

    /// Starts a new path (subject to fill/stroke batching at execution time)
    BeginPath,

    /// Moves to the first coordinate of the run, then draws lines through the rest
    MoveToLineTo { begin: usize, end: usize },

    /// Closes the current subpath back to its starting coordinate
    ClosePath,

    /// Makes `fill` instructions after this one use the supplied style
    SetFillStyle(FillStyle),

    /// Makes `stroke` instructions after this one use the supplied style
    SetStrokeStyle(StrokeStyle),

    /// Fills the current path with the current fill style
    Fill(FillRule),

    /// Strokes the current path with the current stroke style
    Stroke,

    /// Adds a circle subpath: the run holds the centre followed by a point at
    /// centre + radius, so the radius survives the pixel projection
    Circle { begin: usize },

    /// Stamps an image at every coordinate of the run
    DrawImage { begin: usize, end: usize, image: ImageStyle },

    /// Lays the style's text out glyph by glyph along the coordinate run
    DrawChars { begin: usize, end: usize, style: TextStyle },

    /// Hands the projected coordinate run to the renderer registered under `renderer`
    /// in the recording replay's side table
    Custom { begin: usize, end: usize, feature: FeatureId, renderer: usize },

    /// Closes the bracket opened by the matching `BeginGeometry`
    EndGeometry { feature: FeatureId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_round_trip_through_serde() {
        let tape = vec![
            Instruction::BeginGeometry { feature: FeatureId(7), skip_target: 6 },
            Instruction::BeginPath,
            Instruction::MoveToLineTo { begin: 0, end: 8 },
            Instruction::ClosePath,
            Instruction::Fill(FillRule::NonZero),
            Instruction::EndGeometry { feature: FeatureId(7) },
        ];

        let json = serde_json::to_string(&tape).unwrap();
        let back = serde_json::from_str::<Vec<Instruction>>(&json).unwrap();

        assert!(back == tape);
    }
}
