use carta_geometry::*;
use carta_replay::*;

///
/// Where and how to stamp a raster image onto a surface
///
/// The anchor is the point the stamp rotates and snaps around; the offsets place the
/// image's top-left corner relative to it. All values are in device pixels.
///
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ImagePlacement {
    pub x:              f64,
    pub y:              f64,
    pub offset_x:       f64,
    pub offset_y:       f64,
    pub width:          f64,
    pub height:         f64,
    pub rotation:       f64,
    pub opacity:        f32,
    pub snap_to_pixel:  bool,

    /// Source region within the raster, in image pixels (icons often share a sprite sheet)
    pub src_x:          f64,
    pub src_y:          f64,
    pub src_width:      f64,
    pub src_height:     f64,
}

impl ImagePlacement {
    ///
    /// The axis-aligned extent the stamped image covers, accounting for rotation
    ///
    pub fn extent(&self) -> Extent {
        let sin = self.rotation.sin();
        let cos = self.rotation.cos();

        let mut extent = Extent::empty();
        for (cx, cy) in [
            (self.offset_x, self.offset_y),
            (self.offset_x + self.width, self.offset_y),
            (self.offset_x + self.width, self.offset_y + self.height),
            (self.offset_x, self.offset_y + self.height),
        ] {
            extent.extend_coordinate(self.x + cx*cos - cy*sin, self.y + cx*sin + cy*cos);
        }

        extent
    }
}

///
/// The 2D surface contract a recorded replay executes against
///
/// This is deliberately the shape of an immediate-mode raster context: a current path
/// built from move/line/close calls, current fill and stroke styles, and a global alpha.
/// The replay executor owns all policy (batching, clipping, skipping); a context only
/// has to draw what it is told.
///
pub trait RasterContext {
    /// Starts a new path, discarding any current one
    fn begin_path(&mut self);

    /// Starts a new subpath at x, y
    fn move_to(&mut self, x: f64, y: f64);

    /// Adds a line from the current point to x, y
    fn line_to(&mut self, x: f64, y: f64);

    /// Closes the current subpath back to its first point
    fn close_path(&mut self);

    /// Adds a circular subpath
    fn circle(&mut self, center_x: f64, center_y: f64, radius: f64);

    /// Sets the style used by subsequent fills
    fn set_fill_style(&mut self, fill: &FillStyle);

    /// Sets the style used by subsequent strokes
    fn set_stroke_style(&mut self, stroke: &StrokeStyle);

    /// Sets the alpha applied on top of style alpha by subsequent drawing
    fn set_global_alpha(&mut self, alpha: f32);

    /// Fills the current path, leaving the path in place so more drawing can batch onto it
    fn fill(&mut self, rule: FillRule);

    /// Strokes the current path, leaving the path in place
    fn stroke(&mut self);

    /// Stamps an image
    fn draw_image(&mut self, raster: &ImageRaster, placement: &ImagePlacement);

    /// Pushes the current style state
    fn save(&mut self);

    /// Pops the style state pushed by the matching `save`
    fn restore(&mut self);

    /// Reads back the alpha channel at a device pixel; hit detection probes drawn
    /// pixels through this after each candidate feature's instructions execute
    fn alpha_at(&self, x: usize, y: usize) -> u8;

    /// Resets every pixel to transparent, leaving path and style state alone
    fn clear(&mut self);
}
