use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::*;

///
/// An 8-bit RGBA colour
///
/// Styles cross the boundary from the style model already resolved, so a colour here is
/// always a concrete set of channel values rather than a name or a computed expression.
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    #[inline]
    pub fn r(&self) -> u8 { self.0[0] }
    #[inline]
    pub fn g(&self) -> u8 { self.0[1] }
    #[inline]
    pub fn b(&self) -> u8 { self.0[2] }
    #[inline]
    pub fn a(&self) -> u8 { self.0[3] }

    ///
    /// The alpha channel as a 0..1 fraction
    ///
    #[inline]
    pub fn alpha_f32(&self) -> f32 {
        (self.0[3] as f32) / 255.0
    }

    ///
    /// This colour with the alpha channel replaced
    ///
    #[inline]
    pub fn with_alpha(self, alpha: u8) -> Rgba {
        Rgba([self.0[0], self.0[1], self.0[2], alpha])
    }

    ///
    /// This colour forced fully opaque, as used by the hit-detection tapes
    ///
    #[inline]
    pub fn opaque(self) -> Rgba {
        self.with_alpha(255)
    }

    #[inline]
    pub fn is_fully_transparent(&self) -> bool {
        self.0[3] == 0
    }
}

///
/// A pre-rendered raster image handed across the style boundary
///
/// Markers, icons and rasterised labels all arrive in this shape: straight (not
/// premultiplied) RGBA8 rows, shared so that the same bitmap can appear in many
/// recorded instructions without copying the pixels.
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ImageRaster {
    pub width:  u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl ImageRaster {
    ///
    /// Creates a raster from its dimensions and straight RGBA8 pixel rows
    ///
    /// An empty raster (used by tests and by rasterizers reporting 'nothing to draw')
    /// is fine; a pixel buffer that disagrees with the dimensions is a caller bug.
    ///
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> ImageRaster {
        assert!(pixels.len() == (width as usize) * (height as usize) * 4, "Pixel buffer length {} does not match {}x{} RGBA dimensions", pixels.len(), width, height);

        ImageRaster {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    ///
    /// The straight RGBA pixel at x, y, or transparent black outside the raster
    ///
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }

        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [self.pixels[idx], self.pixels[idx+1], self.pixels[idx+2], self.pixels[idx+3]]
    }
}

///
/// Possible ways to join stroked lines
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

///
/// How to cap the ends of stroked lines
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

///
/// How a filled path decides whether a point is inside
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

///
/// A resolved fill: either a solid colour or a repeating raster pattern
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum FillStyle {
    Color(Rgba),
    Pattern(ImageRaster),
}

impl FillStyle {
    ///
    /// This fill forced fully opaque, as used by the hit-detection tapes
    ///
    pub fn opaque(&self) -> FillStyle {
        match self {
            FillStyle::Color(color)     => FillStyle::Color(color.opaque()),
            FillStyle::Pattern(raster)  => FillStyle::Pattern(raster.clone()),
        }
    }

    ///
    /// A structurally-derived key for caches and style-group batching
    ///
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            FillStyle::Color(color)     => { 0u8.hash(&mut hasher); color.hash(&mut hasher); }
            FillStyle::Pattern(raster)  => { 1u8.hash(&mut hasher); raster.width.hash(&mut hasher); raster.height.hash(&mut hasher); raster.pixels.hash(&mut hasher); }
        }
        hasher.finish()
    }
}

///
/// A resolved stroke style
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color:          Rgba,
    pub width:          f64,
    pub line_cap:       LineCap,
    pub line_join:      LineJoin,
    pub miter_limit:    f64,
    pub dash:           Vec<f64>,
    pub dash_offset:    f64,
}

impl StrokeStyle {
    ///
    /// Creates a stroke with the default cap, join and miter limit and no dash
    ///
    pub fn new(color: Rgba, width: f64) -> StrokeStyle {
        StrokeStyle {
            color,
            width,
            line_cap:       LineCap::Round,
            line_join:      LineJoin::Round,
            miter_limit:    10.0,
            dash:           vec![],
            dash_offset:    0.0,
        }
    }

    ///
    /// This stroke forced fully opaque, as used by the hit-detection tapes
    ///
    pub fn opaque(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color.opaque(),
            ..self.clone()
        }
    }

    ///
    /// A structurally-derived key for caches and style-group batching
    ///
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.color.hash(&mut hasher);
        self.width.to_bits().hash(&mut hasher);
        self.line_cap.hash(&mut hasher);
        self.line_join.hash(&mut hasher);
        self.miter_limit.to_bits().hash(&mut hasher);
        for length in self.dash.iter() {
            length.to_bits().hash(&mut hasher);
        }
        self.dash_offset.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}

///
/// Horizontal alignment of a text label relative to its anchor
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

///
/// Vertical alignment of a text label relative to its anchor
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TextBaseline {
    Top,
    Middle,
    Alphabetic,
    Bottom,
}

///
/// Whether a label is anchored to a single point or laid out along a line
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TextPlacement {
    Point,
    Line,
}

///
/// A resolved text style, including the text itself
///
/// The style model resolves which label a feature gets before handing the result to the
/// renderers, so the text travels with the style rather than with the geometry.
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TextStyle {
    pub text:               String,
    pub font:               String,
    pub fill:               Option<FillStyle>,
    pub stroke:             Option<StrokeStyle>,
    pub align:              TextAlign,
    pub baseline:           TextBaseline,
    pub placement:          TextPlacement,
    pub max_angle:          f64,
    pub offset_x:           f64,
    pub offset_y:           f64,
    pub padding:            [f64; 4],
    pub scale:              f64,
    pub rotation:           f64,
    pub rotate_with_view:   bool,
    pub background_fill:    Option<FillStyle>,
    pub background_stroke:  Option<StrokeStyle>,
}

impl TextStyle {
    ///
    /// Creates a point-placed label with a solid black fill and the defaults a style
    /// model would resolve when nothing else is specified
    ///
    pub fn new(text: impl Into<String>, font: impl Into<String>) -> TextStyle {
        TextStyle {
            text:               text.into(),
            font:               font.into(),
            fill:               Some(FillStyle::Color(Rgba([0, 0, 0, 255]))),
            stroke:             None,
            align:              TextAlign::Center,
            baseline:           TextBaseline::Middle,
            placement:          TextPlacement::Point,
            max_angle:          std::f64::consts::FRAC_PI_4,
            offset_x:           0.0,
            offset_y:           0.0,
            padding:            [0.0, 0.0, 0.0, 0.0],
            scale:              1.0,
            rotation:           0.0,
            rotate_with_view:   false,
            background_fill:    None,
            background_stroke:  None,
        }
    }
}

///
/// A resolved image (marker/icon) style
///
/// The anchor is in image pixels from the top-left of the displayed region; the origin
/// and size select that region out of the raster, which lets many icons share one
/// sprite sheet.
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ImageStyle {
    pub anchor:             (f64, f64),
    pub origin:             (f64, f64),
    pub size:               (f64, f64),
    pub scale:              f64,
    pub opacity:            f32,
    pub rotation:           f64,
    pub rotate_with_view:   bool,
    pub snap_to_pixel:      bool,
    pub raster:             ImageRaster,
}

impl ImageStyle {
    ///
    /// Creates a style displaying the whole raster, anchored at its centre
    ///
    pub fn new(raster: ImageRaster) -> ImageStyle {
        let width   = raster.width as f64;
        let height  = raster.height as f64;

        ImageStyle {
            anchor:             (width / 2.0, height / 2.0),
            origin:             (0.0, 0.0),
            size:               (width, height),
            scale:              1.0,
            opacity:            1.0,
            rotation:           0.0,
            rotate_with_view:   false,
            snap_to_pixel:      true,
            raster,
        }
    }

    ///
    /// This style forced fully opaque, as used by the hit-detection tapes
    ///
    pub fn opaque(&self) -> ImageStyle {
        ImageStyle {
            opacity: 1.0,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_color_keeps_channels() {
        let color = Rgba([10, 20, 30, 40]).opaque();

        assert!(color == Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn fill_checksum_distinguishes_colors() {
        let red     = FillStyle::Color(Rgba([255, 0, 0, 255]));
        let blue    = FillStyle::Color(Rgba([0, 0, 255, 255]));

        assert!(red.checksum() != blue.checksum());
        assert!(red.checksum() == red.clone().checksum());
    }

    #[test]
    fn stroke_checksum_tracks_width_and_dash() {
        let thin        = StrokeStyle::new(Rgba([0, 0, 0, 255]), 1.0);
        let thick       = StrokeStyle::new(Rgba([0, 0, 0, 255]), 3.0);
        let mut dashed  = StrokeStyle::new(Rgba([0, 0, 0, 255]), 1.0);
        dashed.dash     = vec![4.0, 2.0];

        assert!(thin.checksum() != thick.checksum());
        assert!(thin.checksum() != dashed.checksum());
    }

    #[test]
    fn raster_pixel_reads_are_bounded() {
        let raster = ImageRaster::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]);

        assert!(raster.pixel(1, 0) == [5, 6, 7, 8]);
        assert!(raster.pixel(2, 0) == [0, 0, 0, 0]);
    }

    #[test]
    fn styles_round_trip_through_serde() {
        let style   = ImageStyle::new(ImageRaster::new(1, 1, vec![9, 9, 9, 255]));
        let json    = serde_json::to_string(&style).unwrap();
        let back    = serde_json::from_str::<ImageStyle>(&json).unwrap();

        assert!(back == style);
    }
}
