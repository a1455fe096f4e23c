use crate::context::*;

use carta_replay::*;

use smallvec::SmallVec;

///
/// Number of segments used when a circle or round join is turned into a polygon
///
const CIRCLE_SEGMENTS: usize = 32;

#[derive(Clone)]
struct SurfaceState {
    fill:           Option<FillStyle>,
    stroke:         Option<StrokeStyle>,
    global_alpha:   f32,
}

#[derive(Clone)]
struct SubPath {
    points: Vec<(f64, f64)>,
    closed: bool,
}

///
/// An in-memory RGBA surface executing raster replays without a display
///
/// Pixels are stored premultiplied. Filling is a scanline pass over the current path
/// (non-zero or even-odd winding, sampled at pixel centres, no antialiasing); stroking
/// expands each segment into a quad and approximates joins and round caps with circular
/// fans, then fills the expanded outline. This is the surface hit detection probes and
/// tests assert against; an interactive shell would implement `RasterContext` over its
/// own canvas instead.
///
pub struct SoftwareSurface {
    width:      usize,
    height:     usize,
    pixels:     Vec<u8>,
    subpaths:   Vec<SubPath>,
    state:      SurfaceState,
    saved:      Vec<SurfaceState>,
}

impl SoftwareSurface {
    ///
    /// Creates a transparent surface
    ///
    pub fn new(width: usize, height: usize) -> SoftwareSurface {
        SoftwareSurface {
            width,
            height,
            pixels:     vec![0; width * height * 4],
            subpaths:   vec![],
            state:      SurfaceState { fill: None, stroke: None, global_alpha: 1.0 },
            saved:      vec![],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    ///
    /// The premultiplied RGBA pixel data, row by row
    ///
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    ///
    /// The alpha channel at x, y (0 outside the surface)
    ///
    #[inline]
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[(y * self.width + x) * 4 + 3]
    }

    ///
    /// The premultiplied RGBA pixel at x, y
    ///
    #[inline]
    pub fn pixel_at(&self, x: usize, y: usize) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let idx = (y * self.width + x) * 4;
        [self.pixels[idx], self.pixels[idx+1], self.pixels[idx+2], self.pixels[idx+3]]
    }

    ///
    /// Resets every pixel to transparent, leaving path and style state alone
    ///
    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|byte| *byte = 0);
    }

    ///
    /// Source-over blend of a straight RGBA colour with an extra alpha factor
    ///
    fn blend_pixel(&mut self, x: i64, y: i64, color: [u8; 4], alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }

        let src_alpha = (color[3] as f32 / 255.0) * alpha;
        if src_alpha <= 0.0 {
            return;
        }

        let idx = ((y as usize) * self.width + (x as usize)) * 4;
        let inverse = 1.0 - src_alpha;

        for channel in 0..3 {
            let src = (color[channel] as f32) * src_alpha;
            let dst = self.pixels[idx + channel] as f32;
            self.pixels[idx + channel] = (src + dst * inverse).round().min(255.0) as u8;
        }

        let dst_alpha = self.pixels[idx + 3] as f32;
        self.pixels[idx + 3] = (src_alpha * 255.0 + dst_alpha * inverse).round().min(255.0) as u8;
    }

    ///
    /// Scanline-fills a set of polygons sampled at pixel centres
    ///
    fn fill_polygons(&mut self, polygons: &[Vec<(f64, f64)>], rule: FillRule, fill: &FillStyle, alpha: f32) {
        // Bound the scan to the rows the polygons touch
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for polygon in polygons {
            for (_, y) in polygon {
                if *y < min_y { min_y = *y; }
                if *y > max_y { max_y = *y; }
            }
        }
        if min_y > max_y {
            return;
        }

        let first_row   = (min_y - 0.5).floor().max(0.0) as usize;
        let last_row    = ((max_y + 0.5).ceil() as i64).min(self.height as i64 - 1);
        if last_row < 0 {
            return;
        }

        let mut crossings: SmallVec<[(f64, i32); 16]> = SmallVec::new();

        for row in first_row..=(last_row as usize) {
            let sample_y = row as f64 + 0.5;
            crossings.clear();

            for polygon in polygons {
                if polygon.len() < 2 {
                    continue;
                }

                let mut previous = polygon[polygon.len() - 1];
                for point in polygon {
                    let (x1, y1) = previous;
                    let (x2, y2) = *point;

                    if y1 <= sample_y && y2 > sample_y {
                        crossings.push((x1 + (sample_y - y1) / (y2 - y1) * (x2 - x1), 1));
                    } else if y2 <= sample_y && y1 > sample_y {
                        crossings.push((x1 + (sample_y - y1) / (y2 - y1) * (x2 - x1), -1));
                    }

                    previous = *point;
                }
            }

            crossings.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

            let mut winding = 0;
            for pair in 0..crossings.len().saturating_sub(1) {
                winding += crossings[pair].1;

                let inside = match rule {
                    FillRule::NonZero   => winding != 0,
                    FillRule::EvenOdd   => winding % 2 != 0,
                };
                if !inside {
                    continue;
                }

                let span_start  = crossings[pair].0;
                let span_end    = crossings[pair + 1].0;

                let first_col   = (span_start - 0.5).ceil().max(0.0) as i64;
                let last_col    = ((span_end - 0.5).floor() as i64).min(self.width as i64 - 1);

                for col in first_col..=last_col {
                    let color = match fill {
                        FillStyle::Color(color)     => color.0,
                        FillStyle::Pattern(raster)  => {
                            // Tile the pattern at 1:1
                            let px = (col as u32) % raster.width.max(1);
                            let py = (row as u32) % raster.height.max(1);
                            raster.pixel(px, py)
                        }
                    };
                    self.blend_pixel(col, row as i64, color, alpha);
                }
            }
        }
    }

    ///
    /// The current subpaths as closed polygons (open subpaths close implicitly when
    /// filled, matching immediate-mode canvas behaviour)
    ///
    fn path_polygons(&self) -> Vec<Vec<(f64, f64)>> {
        self.subpaths.iter()
            .filter(|subpath| subpath.points.len() >= 3)
            .map(|subpath| subpath.points.clone())
            .collect()
    }

    ///
    /// Expands the current path into stroke outline polygons
    ///
    fn stroke_polygons(&self, stroke: &StrokeStyle) -> Vec<Vec<(f64, f64)>> {
        let half_width  = (stroke.width / 2.0).max(0.5);
        let mut result  = vec![];

        for subpath in self.subpaths.iter() {
            let mut runs: Vec<Vec<(f64, f64)>> = vec![];

            let mut points = subpath.points.clone();
            if subpath.closed && points.len() >= 2 && points[0] != points[points.len() - 1] {
                points.push(points[0]);
            }

            if stroke.dash.is_empty() {
                runs.push(points);
            } else {
                runs.extend(dash_runs(&points, &stroke.dash, stroke.dash_offset));
            }

            for run in runs {
                for pair in run.windows(2) {
                    let (x1, y1) = pair[0];
                    let (x2, y2) = pair[1];

                    let length = ((x2-x1)*(x2-x1) + (y2-y1)*(y2-y1)).sqrt();
                    if length == 0.0 {
                        continue;
                    }

                    // Segment quad offset by the unit normal
                    let nx = -(y2 - y1) / length * half_width;
                    let ny = (x2 - x1) / length * half_width;
                    result.push(vec![
                        (x1 + nx, y1 + ny),
                        (x2 + nx, y2 + ny),
                        (x2 - nx, y2 - ny),
                        (x1 - nx, y1 - ny),
                    ]);
                }

                // Joins and round caps: a circular fan at every vertex that needs one
                if run.len() >= 2 {
                    let interior        = &run[1..run.len()-1];
                    let round_ends      = stroke.line_cap == LineCap::Round || subpath.closed;

                    for (x, y) in interior {
                        result.push(circle_polygon(*x, *y, half_width));
                    }
                    if round_ends {
                        result.push(circle_polygon(run[0].0, run[0].1, half_width));
                        result.push(circle_polygon(run[run.len()-1].0, run[run.len()-1].1, half_width));
                    }
                    if stroke.line_cap == LineCap::Square && !subpath.closed {
                        result.push(square_cap(&run[1], &run[0], half_width));
                        result.push(square_cap(&run[run.len()-2], &run[run.len()-1], half_width));
                    }
                }
            }
        }

        result
    }

    ///
    /// Encodes the surface as a PNG (straight alpha)
    ///
    #[cfg(feature = "render_png")]
    pub fn to_png(&self) -> Vec<u8> {
        let mut straight = Vec::with_capacity(self.pixels.len());
        for pixel in self.pixels.chunks_exact(4) {
            let alpha = pixel[3] as f32 / 255.0;
            if alpha > 0.0 {
                for channel in 0..3 {
                    straight.push(((pixel[channel] as f32 / alpha).round().min(255.0)) as u8);
                }
                straight.push(pixel[3]);
            } else {
                straight.extend_from_slice(&[0, 0, 0, 0]);
            }
        }

        let mut bytes = vec![];
        {
            let mut encoder = png::Encoder::new(&mut bytes, self.width as u32, self.height as u32);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&straight).unwrap();
        }
        bytes
    }
}

///
/// A closed regular polygon approximating a circle
///
fn circle_polygon(center_x: f64, center_y: f64, radius: f64) -> Vec<(f64, f64)> {
    (0..CIRCLE_SEGMENTS)
        .map(|segment| {
            let angle = (segment as f64) / (CIRCLE_SEGMENTS as f64) * std::f64::consts::TAU;
            (center_x + radius * angle.cos(), center_y + radius * angle.sin())
        })
        .collect()
}

///
/// The quad extending a square cap beyond the endpoint `to`, away from `from`
///
fn square_cap(from: &(f64, f64), to: &(f64, f64), half_width: f64) -> Vec<(f64, f64)> {
    let dx      = to.0 - from.0;
    let dy      = to.1 - from.1;
    let length  = (dx*dx + dy*dy).sqrt();
    if length == 0.0 {
        return vec![];
    }

    let tx = dx / length * half_width;
    let ty = dy / length * half_width;
    let nx = -ty;
    let ny = tx;

    vec![
        (to.0 + nx, to.1 + ny),
        (to.0 + nx + tx, to.1 + ny + ty),
        (to.0 - nx + tx, to.1 - ny + ty),
        (to.0 - nx, to.1 - ny),
    ]
}

///
/// Splits a polyline into the 'on' runs of a dash pattern
///
fn dash_runs(points: &[(f64, f64)], dash: &[f64], dash_offset: f64) -> Vec<Vec<(f64, f64)>> {
    let pattern_length: f64 = dash.iter().sum();
    if pattern_length <= 0.0 || points.len() < 2 {
        return vec![points.to_vec()];
    }

    let mut runs        = vec![];
    let mut current: Vec<(f64, f64)> = vec![];
    let mut position    = dash_offset.rem_euclid(pattern_length);

    // Whether `position` falls in an 'on' stretch of the repeating pattern
    let phase = |position: f64| -> (bool, f64) {
        let mut remaining = position.rem_euclid(pattern_length);
        for (index, length) in dash.iter().enumerate() {
            if remaining < *length {
                return (index % 2 == 0, length - remaining);
            }
            remaining -= length;
        }
        (true, dash[0])
    };

    for pair in points.windows(2) {
        let (x1, y1) = pair[0];
        let (x2, y2) = pair[1];
        let segment = ((x2-x1)*(x2-x1) + (y2-y1)*(y2-y1)).sqrt();
        if segment == 0.0 {
            continue;
        }

        let mut walked = 0.0;
        while walked < segment {
            let (on, until_flip)    = phase(position);
            let step                = until_flip.min(segment - walked);

            let t1 = walked / segment;
            let t2 = (walked + step) / segment;
            let a = (x1 + (x2-x1)*t1, y1 + (y2-y1)*t1);
            let b = (x1 + (x2-x1)*t2, y1 + (y2-y1)*t2);

            if on {
                if current.is_empty() {
                    current.push(a);
                }
                current.push(b);
            } else if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }

            walked += step;
            position += step;
        }
    }

    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

impl RasterContext for SoftwareSurface {
    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.subpaths.push(SubPath { points: vec![(x, y)], closed: false });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        match self.subpaths.last_mut() {
            Some(subpath)   => subpath.points.push((x, y)),
            None            => self.subpaths.push(SubPath { points: vec![(x, y)], closed: false }),
        }
    }

    fn close_path(&mut self) {
        if let Some(subpath) = self.subpaths.last_mut() {
            subpath.closed = true;
        }
    }

    fn circle(&mut self, center_x: f64, center_y: f64, radius: f64) {
        self.subpaths.push(SubPath {
            points: circle_polygon(center_x, center_y, radius),
            closed: true,
        });
    }

    fn set_fill_style(&mut self, fill: &FillStyle) {
        self.state.fill = Some(fill.clone());
    }

    fn set_stroke_style(&mut self, stroke: &StrokeStyle) {
        self.state.stroke = Some(stroke.clone());
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.global_alpha = alpha;
    }

    fn fill(&mut self, rule: FillRule) {
        let fill = match &self.state.fill {
            Some(fill)  => fill.clone(),
            None        => return,
        };

        let polygons = self.path_polygons();
        self.fill_polygons(&polygons, rule, &fill, self.state.global_alpha);
    }

    fn stroke(&mut self) {
        let stroke = match &self.state.stroke {
            Some(stroke)    => stroke.clone(),
            None            => return,
        };

        let polygons    = self.stroke_polygons(&stroke);
        let fill        = FillStyle::Color(stroke.color);

        // Overlapping quads and fans must not double-blend: non-zero over the whole set
        self.fill_polygons(&polygons, FillRule::NonZero, &fill, self.state.global_alpha);
    }

    fn draw_image(&mut self, raster: &ImageRaster, placement: &ImagePlacement) {
        if placement.width <= 0.0 || placement.height <= 0.0 || placement.src_width <= 0.0 || placement.src_height <= 0.0 {
            return;
        }

        let mut anchor_x = placement.x;
        let mut anchor_y = placement.y;
        if placement.snap_to_pixel && placement.rotation == 0.0 {
            anchor_x = anchor_x.round();
            anchor_y = anchor_y.round();
        }

        let sin = placement.rotation.sin();
        let cos = placement.rotation.cos();

        let bounds      = placement.extent();
        let first_col   = (bounds.min_x + (anchor_x - placement.x)).floor().max(0.0) as i64;
        let first_row   = (bounds.min_y + (anchor_y - placement.y)).floor().max(0.0) as i64;
        let last_col    = ((bounds.max_x + (anchor_x - placement.x)).ceil() as i64).min(self.width as i64 - 1);
        let last_row    = ((bounds.max_y + (anchor_y - placement.y)).ceil() as i64).min(self.height as i64 - 1);

        for row in first_row..=last_row {
            for col in first_col..=last_col {
                // Inverse-rotate the pixel centre into the image's local frame
                let dx = (col as f64 + 0.5) - anchor_x;
                let dy = (row as f64 + 0.5) - anchor_y;
                let local_x = dx * cos + dy * sin - placement.offset_x;
                let local_y = -dx * sin + dy * cos - placement.offset_y;

                if local_x < 0.0 || local_y < 0.0 || local_x >= placement.width || local_y >= placement.height {
                    continue;
                }

                let src_x = placement.src_x + local_x / placement.width * placement.src_width;
                let src_y = placement.src_y + local_y / placement.height * placement.src_height;
                let color = raster.pixel(src_x as u32, src_y as u32);

                self.blend_pixel(col, row, color, placement.opacity * self.state.global_alpha);
            }
        }
    }

    fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn alpha_at(&self, x: usize, y: usize) -> u8 {
        SoftwareSurface::alpha_at(self, x, y)
    }

    fn clear(&mut self) {
        SoftwareSurface::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_square(surface: &mut SoftwareSurface, min: f64, max: f64, color: Rgba) {
        surface.set_fill_style(&FillStyle::Color(color));
        surface.begin_path();
        surface.move_to(min, min);
        surface.line_to(max, min);
        surface.line_to(max, max);
        surface.line_to(min, max);
        surface.close_path();
        surface.fill(FillRule::NonZero);
    }

    #[test]
    fn filled_square_covers_its_interior_only() {
        let mut surface = SoftwareSurface::new(20, 20);
        filled_square(&mut surface, 5.0, 15.0, Rgba([255, 0, 0, 255]));

        assert!(surface.alpha_at(10, 10) == 255);
        assert!(surface.alpha_at(2, 2) == 0);
        assert!(surface.alpha_at(17, 10) == 0);
    }

    #[test]
    fn even_odd_fill_leaves_holes_open() {
        let mut surface = SoftwareSurface::new(20, 20);

        surface.set_fill_style(&FillStyle::Color(Rgba([0, 255, 0, 255])));
        surface.begin_path();
        // Outer square and an inner square wound the same way: even-odd makes a hole
        surface.move_to(2.0, 2.0);
        surface.line_to(18.0, 2.0);
        surface.line_to(18.0, 18.0);
        surface.line_to(2.0, 18.0);
        surface.close_path();
        surface.move_to(7.0, 7.0);
        surface.line_to(13.0, 7.0);
        surface.line_to(13.0, 13.0);
        surface.line_to(7.0, 13.0);
        surface.close_path();
        surface.fill(FillRule::EvenOdd);

        assert!(surface.alpha_at(4, 10) == 255);
        assert!(surface.alpha_at(10, 10) == 0, "Hole was filled");
    }

    #[test]
    fn stroke_covers_the_line_but_not_far_away() {
        let mut surface = SoftwareSurface::new(20, 20);
        surface.set_stroke_style(&StrokeStyle::new(Rgba([0, 0, 255, 255]), 4.0));
        surface.begin_path();
        surface.move_to(2.0, 10.0);
        surface.line_to(18.0, 10.0);
        surface.stroke();

        assert!(surface.alpha_at(10, 10) == 255);
        assert!(surface.alpha_at(10, 2) == 0);
    }

    #[test]
    fn dashed_stroke_leaves_gaps() {
        let mut surface = SoftwareSurface::new(40, 10);
        let mut stroke  = StrokeStyle::new(Rgba([0, 0, 0, 255]), 2.0);
        stroke.dash     = vec![6.0, 6.0];
        stroke.line_cap = LineCap::Butt;

        surface.set_stroke_style(&stroke);
        surface.begin_path();
        surface.move_to(0.0, 5.0);
        surface.line_to(40.0, 5.0);
        surface.stroke();

        assert!(surface.alpha_at(2, 5) == 255);
        assert!(surface.alpha_at(8, 5) == 0, "Dash gap was drawn");
        assert!(surface.alpha_at(14, 5) == 255);
    }

    #[test]
    fn images_blend_with_opacity() {
        let mut surface = SoftwareSurface::new(10, 10);
        let raster      = ImageRaster::new(2, 2, vec![255, 0, 0, 255].repeat(4));

        surface.draw_image(&raster, &ImagePlacement {
            x: 5.0, y: 5.0,
            offset_x: -1.0, offset_y: -1.0,
            width: 2.0, height: 2.0,
            rotation: 0.0,
            opacity: 0.5,
            snap_to_pixel: true,
            src_x: 0.0, src_y: 0.0, src_width: 2.0, src_height: 2.0,
        });

        let alpha = surface.alpha_at(5, 5);
        assert!(alpha > 100 && alpha < 150, "Unexpected alpha: {}", alpha);
    }

    #[test]
    fn replaying_the_same_path_twice_is_deterministic() {
        let mut first   = SoftwareSurface::new(20, 20);
        let mut second  = SoftwareSurface::new(20, 20);

        for surface in [&mut first, &mut second] {
            filled_square(surface, 3.0, 16.0, Rgba([10, 200, 30, 200]));
        }

        assert!(first.data() == second.data());
    }
}
