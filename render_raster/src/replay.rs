use crate::clip::*;
use crate::context::*;
use crate::declutter::*;
use crate::label_cache::*;
use crate::text_replay::*;

use carta_geometry::flat;
use carta_geometry::*;
use carta_replay::*;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

///
/// How many deferred fills or strokes may accumulate before the executor flushes them
///
/// Coalescing consecutive same-style fill/stroke calls into one surface call is purely a
/// throughput policy; the threshold is a tunable, not a contract.
///
const PENDING_BATCH_LIMIT: usize = 200;

///
/// A renderer callback registered for `Custom` instructions
///
/// Receives the surface and the feature's projected device-pixel coordinates.
///
pub type CustomRenderer = dyn Fn(&mut dyn RasterContext, &[f64]);

///
/// A recorded, replayable program of raster drawing instructions
///
/// One replay holds the instructions for one (z-index, drawing-type) bucket: an
/// instruction tape, a parallel hit-detection tape with styles forced opaque, and one
/// shared coordinate buffer in map units. Recording walks geometries once; executing
/// projects the buffer to device pixels (cached against the transform used) and scans
/// the tape linearly, so repeated frames never re-walk geometry.
///
pub struct RasterReplay {
    pub(crate) tolerance:           f64,
    pub(crate) max_extent:          Extent,
    pub(crate) resolution:          f64,
    pub(crate) pixel_ratio:         f64,
    pub(crate) overlaps:            bool,

    pub(crate) instructions:        Vec<Instruction>,
    pub(crate) hit_instructions:    Vec<Instruction>,
    pub(crate) coordinates:         Vec<f64>,

    pub(crate) fill_style:          Option<FillStyle>,
    pub(crate) stroke_style:        Option<StrokeStyle>,
    pub(crate) max_line_width:      f64,
    pub(crate) label_rasterizer:    Option<Arc<dyn LabelRasterizer>>,
    pub(crate) custom_renderers:    Vec<Rc<CustomRenderer>>,

    recorded_fill:                  Option<FillStyle>,
    recorded_stroke:                Option<StrokeStyle>,
    pixel_cache:                    RefCell<Option<(Transform, Rc<Vec<f64>>)>>,
    begin_index:                    usize,
    hit_begin_index:                usize,
    finished:                       bool,
}

impl RasterReplay {
    ///
    /// Creates an empty replay
    ///
    /// `tolerance` is the simplification tolerance in map units, `max_extent` the
    /// viewport extent used for clipping (buffered by half the widest stroke recorded),
    /// and `overlaps` disables fill/stroke batching for sources whose geometries may
    /// overlap (where coalescing would change the composited output).
    ///
    pub fn new(tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool) -> RasterReplay {
        RasterReplay {
            tolerance,
            max_extent,
            resolution,
            pixel_ratio,
            overlaps,
            instructions:       vec![],
            hit_instructions:   vec![],
            coordinates:        vec![],
            fill_style:         None,
            stroke_style:       None,
            max_line_width:     0.0,
            label_rasterizer:   None,
            custom_renderers:   vec![],
            recorded_fill:      None,
            recorded_stroke:    None,
            pixel_cache:        RefCell::new(None),
            begin_index:        0,
            hit_begin_index:    0,
            finished:           false,
        }
    }

    ///
    /// The squared simplification tolerance geometries are simplified by before recording
    ///
    #[inline]
    pub fn squared_tolerance(&self) -> f64 {
        self.tolerance * self.tolerance
    }

    ///
    /// True if nothing was recorded
    ///
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    ///
    /// The recorded instruction tape
    ///
    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    ///
    /// The shared coordinate buffer, as XY pairs in map units
    ///
    #[inline]
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    ///
    /// The clip extent grown by half the widest stroke seen so far, so a clipped
    /// segment's stroke never visibly pops at the viewport edge
    ///
    pub fn buffered_max_extent(&self) -> Extent {
        self.max_extent.buffer(self.resolution * (self.max_line_width + 1.0) / 2.0)
    }

    ///
    /// Appends a run of coordinates to the shared buffer as XY pairs, returning the
    /// `(begin, end)` offsets of the appended run
    ///
    /// With `clip` set, runs that leave the buffered max extent are cut down to their
    /// boundary crossings so the tape stays bounded by what is visible.
    ///
    pub(crate) fn append_coordinates(&mut self, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, closed: bool, clip: bool) -> (usize, usize) {
        let begin = self.coordinates.len();

        let needs_clip = clip && !self.max_extent.is_empty() && {
            let run_extent = Extent::from_flat_coordinates(flat_coordinates, offset, end, stride);
            !self.buffered_max_extent().contains_extent(&run_extent)
        };

        let run_end = if needs_clip {
            let buffered = self.buffered_max_extent();
            append_clipped_coordinates(&mut self.coordinates, flat_coordinates, offset, end, stride, &buffered, closed)
        } else {
            let mut idx = offset;
            while idx < end {
                self.coordinates.push(flat_coordinates[idx]);
                self.coordinates.push(flat_coordinates[idx + 1]);
                idx += stride;
            }
            self.coordinates.len()
        };

        (begin, run_end)
    }

    ///
    /// Opens a feature bracket on both tapes
    ///
    pub(crate) fn begin_geometry(&mut self, feature: FeatureId) {
        self.begin_index = self.instructions.len();
        self.instructions.push(Instruction::BeginGeometry { feature, skip_target: 0 });

        self.hit_begin_index = self.hit_instructions.len();
        self.hit_instructions.push(Instruction::BeginGeometry { feature, skip_target: 0 });
    }

    ///
    /// Closes the feature bracket opened by `begin_geometry`, patching the skip targets
    ///
    pub(crate) fn end_geometry(&mut self, feature: FeatureId) {
        self.instructions.push(Instruction::EndGeometry { feature });
        let skip_to = self.instructions.len();
        if let Instruction::BeginGeometry { skip_target, .. } = &mut self.instructions[self.begin_index] {
            *skip_target = skip_to;
        }

        self.hit_instructions.push(Instruction::EndGeometry { feature });
        let hit_skip_to = self.hit_instructions.len();
        if let Instruction::BeginGeometry { skip_target, .. } = &mut self.hit_instructions[self.hit_begin_index] {
            *skip_target = hit_skip_to;
        }
    }

    ///
    /// Updates the pending fill/stroke state without recording anything
    ///
    /// Style instructions are recorded lazily by `apply_pending_styles` so that setting
    /// the same style repeatedly (one call per feature is typical) costs nothing.
    ///
    pub(crate) fn update_fill_stroke_state(&mut self, fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        if let Some(stroke) = &stroke {
            if stroke.width > self.max_line_width {
                self.max_line_width = stroke.width;
            }
        }

        self.fill_style     = fill;
        self.stroke_style   = stroke;
    }

    ///
    /// Records style instructions on the draw tape for any style that changed since the
    /// last recording
    ///
    pub(crate) fn apply_pending_styles(&mut self) {
        if self.fill_style != self.recorded_fill {
            if let Some(fill) = &self.fill_style {
                self.instructions.push(Instruction::SetFillStyle(fill.clone()));
            }
            self.recorded_fill = self.fill_style.clone();
        }

        if self.stroke_style != self.recorded_stroke {
            if let Some(stroke) = &self.stroke_style {
                self.instructions.push(Instruction::SetStrokeStyle(stroke.clone()));
            }
            self.recorded_stroke = self.stroke_style.clone();
        }
    }

    ///
    /// Registers a renderer for `Custom` instructions, returning its side-table index
    ///
    pub(crate) fn register_custom_renderer(&mut self, renderer: Rc<CustomRenderer>) -> usize {
        self.custom_renderers.push(renderer);
        self.custom_renderers.len() - 1
    }

    ///
    /// Seals the replay, making it executable
    ///
    /// The hit-detection tape was recorded in draw order; sealing reverses it so that
    /// features probe topmost-first: the whole list is reversed, then each feature's
    /// bracket is un-reversed so its instructions still execute in recorded order.
    ///
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        self.hit_instructions.reverse();

        let mut block_start = None;
        for idx in 0..self.hit_instructions.len() {
            if matches!(self.hit_instructions[idx], Instruction::EndGeometry { .. }) {
                block_start = Some(idx);
                continue;
            }

            if let Instruction::BeginGeometry { skip_target, .. } = &mut self.hit_instructions[idx] {
                *skip_target = idx + 1;
            } else {
                continue;
            }

            if let Some(start) = block_start.take() {
                self.hit_instructions[start..=idx].reverse();
            }
        }

        self.fill_style     = None;
        self.stroke_style   = None;
        self.recorded_fill  = None;
        self.recorded_stroke = None;
    }

    ///
    /// The coordinate buffer projected to device pixels, cached against the transform
    ///
    fn pixel_coordinates(&self, transform: &Transform) -> Rc<Vec<f64>> {
        let mut cache = self.pixel_cache.borrow_mut();

        if let Some((cached_transform, coordinates)) = &*cache {
            if cached_transform == transform {
                return Rc::clone(coordinates);
            }
        }

        let mut projected = Vec::with_capacity(self.coordinates.len());
        flat::transform_2d(&self.coordinates, 0, self.coordinates.len(), 2, transform, &mut projected);

        let projected = Rc::new(projected);
        *cache = Some((*transform, Rc::clone(&projected)));

        projected
    }

    ///
    /// Executes the recorded draw tape against a surface
    ///
    pub fn replay(&self, context: &mut dyn RasterContext, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet, declutter: Option<&mut Vec<DeclutterGroup>>) {
        debug_assert!(self.finished, "Replayed before finish()");

        self.execute::<()>(context, transform, view_rotation, skipped, &self.instructions, None, declutter);
    }

    ///
    /// Executes the hit-detection tape, probing features topmost-first
    ///
    /// After each feature's instructions execute, `feature_callback` receives the
    /// context back to inspect (and clear) the drawn pixels; the first non-`None`
    /// result short-circuits the scan.
    ///
    pub fn replay_hit_detection<T>(&self, context: &mut dyn RasterContext, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet, feature_callback: &mut dyn FnMut(&mut dyn RasterContext, FeatureId) -> Option<T>) -> Option<T> {
        debug_assert!(self.finished, "Replayed before finish()");

        self.execute(context, transform, view_rotation, skipped, &self.hit_instructions, Some(feature_callback), None)
    }

    fn execute<T>(
        &self,
        context: &mut dyn RasterContext,
        transform: &Transform,
        view_rotation: f64,
        skipped: &FeatureSkipSet,
        instructions: &[Instruction],
        mut feature_callback: Option<&mut dyn FnMut(&mut dyn RasterContext, FeatureId) -> Option<T>>,
        mut declutter: Option<&mut Vec<DeclutterGroup>>,
    ) -> Option<T> {
        let pixel_coordinates = self.pixel_coordinates(transform);

        let batch_size          = if self.overlaps { 0 } else { PENDING_BATCH_LIMIT };
        let mut pending_fill    = 0;
        let mut pending_stroke  = 0;
        let mut fill_rule       = FillRule::NonZero;

        macro_rules! flush_pending {
            () => {
                if pending_fill > 0     { context.fill(fill_rule); pending_fill = 0; }
                if pending_stroke > 0   { context.stroke(); pending_stroke = 0; }
            };
        }

        let mut idx = 0;
        while idx < instructions.len() {
            match &instructions[idx] {
                Instruction::BeginGeometry { feature, skip_target } => {
                    if skipped.contains(feature) {
                        idx = *skip_target;
                        continue;
                    }

                    if let Some(groups) = declutter.as_mut() {
                        // Everything a feature defers declutters as one unit
                        groups.push(DeclutterGroup::new());
                    }
                }

                Instruction::BeginPath => {
                    if pending_fill > batch_size    { context.fill(fill_rule); pending_fill = 0; }
                    if pending_stroke > batch_size  { context.stroke(); pending_stroke = 0; }
                    if pending_fill == 0 && pending_stroke == 0 {
                        context.begin_path();
                    }
                }

                Instruction::MoveToLineTo { begin, end } => {
                    if *end > *begin {
                        context.move_to(pixel_coordinates[*begin], pixel_coordinates[*begin + 1]);
                        let mut coord = *begin + 2;
                        while coord < *end {
                            context.line_to(pixel_coordinates[coord], pixel_coordinates[coord + 1]);
                            coord += 2;
                        }
                    }
                }

                Instruction::ClosePath => {
                    context.close_path();
                }

                Instruction::Circle { begin } => {
                    let center_x    = pixel_coordinates[*begin];
                    let center_y    = pixel_coordinates[*begin + 1];
                    let dx          = pixel_coordinates[*begin + 2] - center_x;
                    let dy          = pixel_coordinates[*begin + 3] - center_y;
                    context.circle(center_x, center_y, (dx*dx + dy*dy).sqrt());
                }

                Instruction::SetFillStyle(fill) => {
                    if pending_fill > 0 { context.fill(fill_rule); pending_fill = 0; }
                    context.set_fill_style(fill);
                }

                Instruction::SetStrokeStyle(stroke) => {
                    if pending_stroke > 0 { context.stroke(); pending_stroke = 0; }
                    context.set_stroke_style(stroke);
                }

                Instruction::Fill(rule) => {
                    fill_rule = *rule;
                    if batch_size == 0 {
                        context.fill(*rule);
                    } else {
                        pending_fill += 1;
                        if pending_fill > batch_size { context.fill(fill_rule); pending_fill = 0; }
                    }
                }

                Instruction::Stroke => {
                    if batch_size == 0 {
                        context.stroke();
                    } else {
                        pending_stroke += 1;
                        if pending_stroke > batch_size { context.stroke(); pending_stroke = 0; }
                    }
                }

                Instruction::DrawImage { begin, end, image } => {
                    flush_pending!();

                    let scale       = image.scale * self.pixel_ratio;
                    let rotation    = image.rotation + if image.rotate_with_view { view_rotation } else { 0.0 };

                    let mut coord = *begin;
                    while coord < *end {
                        let placement = ImagePlacement {
                            x:              pixel_coordinates[coord],
                            y:              pixel_coordinates[coord + 1],
                            offset_x:       -image.anchor.0 * scale,
                            offset_y:       -image.anchor.1 * scale,
                            width:          image.size.0 * scale,
                            height:         image.size.1 * scale,
                            rotation,
                            opacity:        image.opacity,
                            snap_to_pixel:  image.snap_to_pixel,
                            src_x:          image.origin.0,
                            src_y:          image.origin.1,
                            src_width:      image.size.0,
                            src_height:     image.size.1,
                        };

                        if let Some(group) = declutter.as_mut().and_then(|groups| groups.last_mut()) {
                            group.push(image.raster.clone(), placement);
                        } else {
                            context.draw_image(&image.raster, &placement);
                        }

                        coord += 2;
                    }
                }

                Instruction::DrawChars { begin, end, style } => {
                    flush_pending!();

                    if let Some(rasterizer) = &self.label_rasterizer {
                        if let Some(group) = declutter.as_mut().and_then(|groups| groups.last_mut()) {
                            execute_draw_chars(&pixel_coordinates, *begin, *end, style, rasterizer.as_ref(), self.pixel_ratio, &mut |raster, placement| {
                                group.push(raster.clone(), placement);
                            });
                        } else {
                            execute_draw_chars(&pixel_coordinates, *begin, *end, style, rasterizer.as_ref(), self.pixel_ratio, &mut |raster, placement| {
                                context.draw_image(raster, &placement);
                            });
                        }
                    }
                }

                Instruction::Custom { begin, end, feature: _, renderer } => {
                    flush_pending!();

                    if let Some(renderer) = self.custom_renderers.get(*renderer) {
                        renderer(context, &pixel_coordinates[*begin..*end]);
                    }
                }

                Instruction::EndGeometry { feature } => {
                    if let Some(callback) = feature_callback.as_mut() {
                        // The probe inspects pixels, so everything pending must land first
                        flush_pending!();

                        if let Some(result) = callback(context, *feature) {
                            return Some(result);
                        }
                    }
                }
            }

            idx += 1;
        }

        flush_pending!();
        None
    }
}
