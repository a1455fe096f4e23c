use carta_replay::*;

use once_cell::sync::Lazy;

use std::collections::HashMap;
use std::sync::*;

///
/// Rasterises single glyphs for the atlas
///
/// Like the raster backend's label seam, real font handling lives with the map shell;
/// the atlas only needs measured boxes and finished pixels. `None` from `rasterize`
/// means the glyph is skipped, never that the frame fails.
///
pub trait GlyphRasterizer: Send + Sync {
    ///
    /// The width and height of the glyph in pixels
    ///
    fn measure_glyph(&self, glyph: char, font: &str) -> (u32, u32);

    ///
    /// Renders the glyph into straight RGBA pixels
    ///
    fn rasterize_glyph(&self, glyph: char, font: &str, fill: Option<&FillStyle>) -> Option<ImageRaster>;
}

///
/// A rasterizer drawing every glyph as a solid cell, for tests and demos
///
pub struct BlockGlyphRasterizer {
    pub cell_width:     u32,
    pub cell_height:    u32,
}

impl BlockGlyphRasterizer {
    pub fn new() -> BlockGlyphRasterizer {
        BlockGlyphRasterizer {
            cell_width:     8,
            cell_height:    16,
        }
    }
}

impl GlyphRasterizer for BlockGlyphRasterizer {
    fn measure_glyph(&self, _glyph: char, _font: &str) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    fn rasterize_glyph(&self, _glyph: char, _font: &str, fill: Option<&FillStyle>) -> Option<ImageRaster> {
        let color = match fill {
            Some(FillStyle::Color(color))   => *color,
            _                               => Rgba([0, 0, 0, 255]),
        };

        let mut pixels = Vec::with_capacity((self.cell_width * self.cell_height * 4) as usize);
        for _ in 0..self.cell_width * self.cell_height {
            pixels.extend_from_slice(&color.0);
        }

        Some(ImageRaster::new(self.cell_width, self.cell_height, pixels))
    }
}

///
/// Key identifying one glyph in the atlas
///
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GlyphKey {
    pub glyph:          char,
    pub font:           String,
    pub fill_checksum:  u64,
}

///
/// Where a glyph landed in the atlas
///
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GlyphSlot {
    pub page:   usize,
    pub x:      u32,
    pub y:      u32,
    pub width:  u32,
    pub height: u32,
}

struct Shelf {
    y:      u32,
    height: u32,
    next_x: u32,
}

struct AtlasPage {
    pixels:         Vec<u8>,
    shelves:        Vec<Shelf>,
    next_shelf_y:   u32,
    stamp:          u64,
}

impl AtlasPage {
    fn new(size: u32) -> AtlasPage {
        AtlasPage {
            pixels:         vec![0; (size * size * 4) as usize],
            shelves:        vec![],
            next_shelf_y:   0,
            stamp:          0,
        }
    }

    ///
    /// Finds or opens a shelf with room for a width x height box
    ///
    fn allocate(&mut self, size: u32, width: u32, height: u32) -> Option<(u32, u32)> {
        for shelf in self.shelves.iter_mut() {
            if shelf.height >= height && shelf.next_x + width <= size {
                let slot = (shelf.next_x, shelf.y);
                shelf.next_x += width;
                return Some(slot);
            }
        }

        if self.next_shelf_y + height <= size && width <= size {
            let shelf = Shelf { y: self.next_shelf_y, height, next_x: width };
            self.next_shelf_y += height;
            let slot = (0, shelf.y);
            self.shelves.push(shelf);
            return Some(slot);
        }

        None
    }

    fn blit(&mut self, size: u32, x: u32, y: u32, raster: &ImageRaster) {
        for row in 0..raster.height {
            for col in 0..raster.width {
                let source = raster.pixel(col, row);
                let target = (((y + row) * size + x + col) * 4) as usize;
                self.pixels[target..target+4].copy_from_slice(&source);
            }
        }
    }

    fn reset(&mut self) {
        self.pixels.iter_mut().for_each(|byte| *byte = 0);
        self.shelves.clear();
        self.next_shelf_y = 0;
    }
}

///
/// A shelf-packed, page-bounded glyph atlas
///
/// Glyph rasters pack into fixed-size texture pages. When every page is full the
/// least-recently-used page is evicted whole (cheaper than repacking, and a page's
/// glyphs age together); a glyph larger than a page cannot be allocated at all and
/// returns `None`, which callers handle by skipping that glyph for the frame.
///
pub struct GlyphAtlas {
    page_size:  u32,
    max_pages:  usize,
    pages:      Vec<AtlasPage>,
    entries:    HashMap<GlyphKey, GlyphSlot>,
    stamp:      u64,
}

impl GlyphAtlas {
    pub fn new(page_size: u32, max_pages: usize) -> GlyphAtlas {
        GlyphAtlas {
            page_size,
            max_pages,
            pages:      vec![],
            entries:    HashMap::new(),
            stamp:      0,
        }
    }

    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    ///
    /// Returns the slot for a glyph, rasterising and packing it on first use
    ///
    pub fn slot(&mut self, key: GlyphKey, rasterizer: &dyn GlyphRasterizer, fill: Option<&FillStyle>) -> Option<GlyphSlot> {
        self.stamp += 1;
        let stamp = self.stamp;

        if let Some(slot) = self.entries.get(&key) {
            let slot = *slot;
            self.pages[slot.page].stamp = stamp;
            return Some(slot);
        }

        let raster = rasterizer.rasterize_glyph(key.glyph, &key.font, fill)?;
        if raster.width > self.page_size || raster.height > self.page_size {
            // Too large for any page: resource exhaustion surfaces as None, not a panic
            return None;
        }

        let (page, x, y) = self.allocate(raster.width, raster.height)?;
        let page_size = self.page_size;
        self.pages[page].blit(page_size, x, y, &raster);
        self.pages[page].stamp = stamp;

        let slot = GlyphSlot { page, x, y, width: raster.width, height: raster.height };
        self.entries.insert(key, slot);
        Some(slot)
    }

    fn allocate(&mut self, width: u32, height: u32) -> Option<(usize, u32, u32)> {
        let page_size = self.page_size;

        for (page, state) in self.pages.iter_mut().enumerate() {
            if let Some((x, y)) = state.allocate(page_size, width, height) {
                return Some((page, x, y));
            }
        }

        if self.pages.len() < self.max_pages {
            self.pages.push(AtlasPage::new(page_size));
            let page = self.pages.len() - 1;
            let (x, y) = self.pages[page].allocate(page_size, width, height)?;
            return Some((page, x, y));
        }

        // All pages full: evict the least recently used one and retry
        let evicted = self.pages.iter().enumerate().min_by_key(|(_, page)| page.stamp).map(|(index, _)| index)?;
        self.pages[evicted].reset();
        self.entries.retain(|_, slot| slot.page != evicted);

        let (x, y) = self.pages[evicted].allocate(page_size, width, height)?;
        Some((evicted, x, y))
    }

    ///
    /// A snapshot of one page's pixels as an uploadable raster
    ///
    pub fn page_raster(&self, page: usize) -> Option<ImageRaster> {
        self.pages.get(page).map(|state| {
            ImageRaster::new(self.page_size, self.page_size, state.pixels.clone())
        })
    }
}

///
/// The process-wide glyph atlas, shared by every text replay
///
pub static GLYPH_ATLAS: Lazy<Mutex<GlyphAtlas>> = Lazy::new(|| Mutex::new(GlyphAtlas::new(256, 4)));

#[cfg(test)]
mod tests {
    use super::*;

    fn key(glyph: char) -> GlyphKey {
        GlyphKey { glyph, font: "mono".to_string(), fill_checksum: 0 }
    }

    #[test]
    fn repeated_lookups_reuse_the_slot() {
        let rasterizer  = BlockGlyphRasterizer::new();
        let mut atlas   = GlyphAtlas::new(64, 2);

        let first   = atlas.slot(key('a'), &rasterizer, None).unwrap();
        let second  = atlas.slot(key('a'), &rasterizer, None).unwrap();

        assert!(first == second);
    }

    #[test]
    fn distinct_glyphs_get_distinct_slots() {
        let rasterizer  = BlockGlyphRasterizer::new();
        let mut atlas   = GlyphAtlas::new(64, 2);

        let a = atlas.slot(key('a'), &rasterizer, None).unwrap();
        let b = atlas.slot(key('b'), &rasterizer, None).unwrap();

        assert!((a.x, a.y, a.page) != (b.x, b.y, b.page));
    }

    #[test]
    fn oversized_glyphs_are_refused_not_fatal() {
        let rasterizer  = BlockGlyphRasterizer { cell_width: 128, cell_height: 128 };
        let mut atlas   = GlyphAtlas::new(64, 2);

        assert!(atlas.slot(key('a'), &rasterizer, None).is_none());
    }

    #[test]
    fn full_atlas_evicts_the_least_recently_used_page() {
        let rasterizer  = BlockGlyphRasterizer { cell_width: 32, cell_height: 32 };
        // One page holds exactly four 32x32 glyphs
        let mut atlas   = GlyphAtlas::new(64, 1);

        for glyph in ['a', 'b', 'c', 'd'] {
            assert!(atlas.slot(key(glyph), &rasterizer, None).is_some());
        }

        // A fifth glyph forces the (only) page to recycle; earlier entries are gone
        assert!(atlas.slot(key('e'), &rasterizer, None).is_some());
        assert!(atlas.entries.len() == 1, "Unexpected entry count: {}", atlas.entries.len());
    }
}
