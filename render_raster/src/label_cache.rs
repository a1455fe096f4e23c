use carta_replay::*;

use once_cell::sync::Lazy;

use std::collections::HashMap;
use std::sync::*;

///
/// Rasterises text into images the replays can stamp
///
/// Real font loading and shaping live outside this core: a map shell supplies an
/// implementation backed by whatever text stack it uses, and the replays only ever see
/// measured sizes and finished rasters. Returning `None` from `rasterize` means the
/// label is skipped for the frame rather than failing it.
///
pub trait LabelRasterizer: Send + Sync {
    ///
    /// The width and height of the text in device-independent pixels at scale 1
    ///
    fn measure(&self, text: &str, font: &str) -> (f64, f64);

    ///
    /// Renders the text into a straight-RGBA raster at the supplied pixel ratio
    ///
    fn rasterize(&self, text: &str, font: &str, fill: Option<&FillStyle>, stroke: Option<&StrokeStyle>, pixel_ratio: f64) -> Option<ImageRaster>;
}

///
/// A rasterizer drawing every character as a solid cell
///
/// This stands in for a real text stack in tests and demos: labels measure as
/// `cell_width × character count` and rasterise as opaque blocks of the fill colour,
/// which is all the declutter and hit-detection machinery needs to be exercised.
///
pub struct BlockLabelRasterizer {
    pub cell_width:     f64,
    pub cell_height:    f64,
}

impl BlockLabelRasterizer {
    pub fn new() -> BlockLabelRasterizer {
        BlockLabelRasterizer {
            cell_width:     8.0,
            cell_height:    16.0,
        }
    }
}

impl LabelRasterizer for BlockLabelRasterizer {
    fn measure(&self, text: &str, _font: &str) -> (f64, f64) {
        (self.cell_width * (text.chars().count() as f64), self.cell_height)
    }

    fn rasterize(&self, text: &str, font: &str, fill: Option<&FillStyle>, _stroke: Option<&StrokeStyle>, pixel_ratio: f64) -> Option<ImageRaster> {
        let (width, height) = self.measure(text, font);
        let width           = ((width * pixel_ratio).round() as u32).max(1);
        let height          = ((height * pixel_ratio).round() as u32).max(1);

        let color = match fill {
            Some(FillStyle::Color(color))   => *color,
            _                               => Rgba([0, 0, 0, 255]),
        };

        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..(width as usize) * (height as usize) {
            pixels.extend_from_slice(&color.0);
        }

        Some(ImageRaster::new(width, height, pixels))
    }
}

///
/// Key identifying one rasterised label
///
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct LabelKey {
    text:               String,
    font:               String,
    fill_checksum:      u64,
    stroke_checksum:    u64,
    pixel_ratio_bits:   u64,
}

impl LabelKey {
    pub fn new(text: &str, font: &str, fill: Option<&FillStyle>, stroke: Option<&StrokeStyle>, pixel_ratio: f64) -> LabelKey {
        LabelKey {
            text:               text.to_string(),
            font:               font.to_string(),
            fill_checksum:      fill.map(|fill| fill.checksum()).unwrap_or(0),
            stroke_checksum:    stroke.map(|stroke| stroke.checksum()).unwrap_or(0),
            pixel_ratio_bits:   pixel_ratio.to_bits(),
        }
    }
}

///
/// A bounded least-recently-used cache of rasterised labels
///
/// Every lookup stamps the entry with a monotonic counter; pruning evicts the stalest
/// entries until the cache is back under capacity. Pruning is opportunistic: replay
/// groups call it once at construction time, so a long rendering session cannot grow
/// the cache without bound but no frame ever pays for more than one sweep.
///
pub struct LabelCache {
    capacity:   usize,
    stamp:      u64,
    entries:    HashMap<LabelKey, (u64, ImageRaster)>,
}

impl LabelCache {
    pub fn new(capacity: usize) -> LabelCache {
        LabelCache {
            capacity,
            stamp:      0,
            entries:    HashMap::new(),
        }
    }

    ///
    /// Fetches a cached label, marking it as recently used
    ///
    pub fn get(&mut self, key: &LabelKey) -> Option<ImageRaster> {
        self.stamp += 1;
        let stamp = self.stamp;

        self.entries.get_mut(key).map(|entry| {
            entry.0 = stamp;
            entry.1.clone()
        })
    }

    pub fn insert(&mut self, key: LabelKey, raster: ImageRaster) {
        self.stamp += 1;
        self.entries.insert(key, (self.stamp, raster));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    ///
    /// Evicts least-recently-used entries until the cache is within capacity
    ///
    pub fn prune(&mut self) {
        while self.entries.len() > self.capacity {
            let stalest = self.entries.iter()
                .min_by_key(|(_, (stamp, _))| *stamp)
                .map(|(key, _)| key.clone());

            match stalest {
                Some(key)   => { self.entries.remove(&key); }
                None        => break,
            }
        }
    }
}

///
/// The process-wide label cache, shared by every replay
///
pub static LABEL_CACHE: Lazy<Mutex<LabelCache>> = Lazy::new(|| Mutex::new(LabelCache::new(512)));

///
/// Fetches a label raster through the process-wide cache, rasterising on a miss
///
pub fn cached_label(rasterizer: &dyn LabelRasterizer, text: &str, font: &str, fill: Option<&FillStyle>, stroke: Option<&StrokeStyle>, pixel_ratio: f64) -> Option<ImageRaster> {
    let key = LabelKey::new(text, font, fill, stroke, pixel_ratio);

    if let Some(raster) = LABEL_CACHE.lock().unwrap().get(&key) {
        return Some(raster);
    }

    let raster = rasterizer.rasterize(text, font, fill, stroke, pixel_ratio)?;
    LABEL_CACHE.lock().unwrap().insert(key, raster.clone());

    Some(raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_evicts_least_recently_used() {
        let mut cache   = LabelCache::new(2);
        let raster      = ImageRaster::new(1, 1, vec![0, 0, 0, 255]);

        let key_a = LabelKey::new("a", "mono", None, None, 1.0);
        let key_b = LabelKey::new("b", "mono", None, None, 1.0);
        let key_c = LabelKey::new("c", "mono", None, None, 1.0);

        cache.insert(key_a.clone(), raster.clone());
        cache.insert(key_b.clone(), raster.clone());

        // Touch 'a' so that 'b' is the stalest when 'c' pushes the cache over capacity
        cache.get(&key_a);
        cache.insert(key_c.clone(), raster.clone());
        cache.prune();

        assert!(cache.len() == 2);
        assert!(cache.get(&key_a).is_some());
        assert!(cache.get(&key_b).is_none());
        assert!(cache.get(&key_c).is_some());
    }

    #[test]
    fn block_rasterizer_fills_with_the_fill_color() {
        let rasterizer  = BlockLabelRasterizer::new();
        let fill        = FillStyle::Color(Rgba([10, 20, 30, 255]));
        let raster      = rasterizer.rasterize("ab", "mono", Some(&fill), None, 1.0).unwrap();

        assert!(raster.width == 16 && raster.height == 16, "Unexpected size: {}x{}", raster.width, raster.height);
        assert!(raster.pixel(0, 0) == [10, 20, 30, 255]);
    }
}
