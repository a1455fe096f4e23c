use crate::replay::*;

use carta_geometry::*;
use carta_replay::*;

///
/// Records marker/icon stamps into a raster replay
///
/// A point or multi-point under an image style becomes one `DrawImage` instruction over
/// the run of anchor coordinates; the hit-detection tape records the same stamp forced
/// fully opaque so translucent markers stay pickable.
///
pub struct ImageReplay {
    replay:         RasterReplay,
    image_style:    Option<ImageStyle>,
}

impl ImageReplay {
    pub fn new(tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool) -> ImageReplay {
        ImageReplay {
            replay:         RasterReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps),
            image_style:    None,
        }
    }

    #[inline]
    pub fn replay(&self) -> &RasterReplay {
        &self.replay
    }

    #[inline]
    pub fn replay_mut(&mut self) -> &mut RasterReplay {
        &mut self.replay
    }

    fn draw_coordinates(&mut self, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, feature: FeatureId) {
        let image = match &self.image_style {
            Some(image) => image.clone(),
            None        => return,
        };

        self.replay.begin_geometry(feature);

        let (begin, run_end) = self.replay.append_coordinates(flat_coordinates, offset, end, stride, false, false);

        self.replay.instructions.push(Instruction::DrawImage { begin, end: run_end, image: image.clone() });
        self.replay.hit_instructions.push(Instruction::DrawImage { begin, end: run_end, image: image.opaque() });

        self.replay.end_geometry(feature);
    }
}

impl GeometryRenderer for ImageReplay {
    fn set_image_style(&mut self, image: ImageStyle) {
        self.image_style = Some(image);
    }

    fn draw_point(&mut self, point: &Point, feature: FeatureId) {
        let flat    = point.base().flat_coordinates().to_vec();
        let stride  = point.base().stride();
        if flat.is_empty() {
            return;
        }

        self.draw_coordinates(&flat, 0, flat.len(), stride, feature);
    }

    fn draw_multi_point(&mut self, points: &MultiPoint, feature: FeatureId) {
        let flat    = points.base().flat_coordinates().to_vec();
        let stride  = points.base().stride();
        if flat.is_empty() {
            return;
        }

        self.draw_coordinates(&flat, 0, flat.len(), stride, feature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> ImageStyle {
        let mut style = ImageStyle::new(ImageRaster::new(2, 2, vec![255; 16]));
        style.opacity = 0.5;
        style
    }

    #[test]
    fn styleless_points_record_nothing() {
        let mut replay = ImageReplay::new(0.0, Extent::empty(), 1.0, 1.0, false);

        replay.draw_point(&Point::new(1.0, 2.0), FeatureId(1));

        assert!(replay.replay().is_empty());
    }

    #[test]
    fn hit_stamp_is_forced_opaque() {
        let mut replay = ImageReplay::new(0.0, Extent::empty(), 1.0, 1.0, false);
        replay.set_image_style(marker());
        replay.draw_point(&Point::new(1.0, 2.0), FeatureId(1));

        let hit_opacity = replay.replay().hit_instructions.iter()
            .find_map(|instruction| match instruction {
                Instruction::DrawImage { image, .. }    => Some(image.opacity),
                _                                       => None,
            });

        assert!(hit_opacity == Some(1.0), "Unexpected hit opacity: {:?}", hit_opacity);
    }

    #[test]
    fn multi_points_stamp_every_coordinate() {
        let mut replay = ImageReplay::new(0.0, Extent::empty(), 1.0, 1.0, false);
        replay.set_image_style(marker());

        let points = MultiPoint::from_coordinates(&[[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]]);
        replay.draw_multi_point(&points, FeatureId(1));

        let stamped = replay.replay().instructions.iter()
            .find_map(|instruction| match instruction {
                Instruction::DrawImage { begin, end, .. }   => Some((end - begin) / 2),
                _                                           => None,
            });

        assert!(stamped == Some(3), "Unexpected stamp count: {:?}", stamped);
    }
}
