use carta_replay::*;

use std::ops::Range;

///
/// The CPU-side vertex/index arenas one GPU replay accumulates into
///
/// `start_indices`/`start_indices_feature` are parallel arrays mapping each feature to
/// the start of its contiguous index range, in insertion order: hit detection walks them
/// in reverse, and per-feature skipping splits draw ranges around them. The starts are
/// monotonically non-decreasing by construction.
///
pub struct ReplayBuffers {
    pub vertices:           Vec<f32>,
    pub indices:            Vec<u32>,
    start_indices:          Vec<usize>,
    start_indices_feature:  Vec<FeatureId>,
}

impl ReplayBuffers {
    pub fn new() -> ReplayBuffers {
        ReplayBuffers {
            vertices:               vec![],
            indices:                vec![],
            start_indices:          vec![],
            start_indices_feature:  vec![],
        }
    }

    ///
    /// The number of vertices currently stored, given this layout's floats per vertex
    ///
    #[inline]
    pub fn vertex_count(&self, floats_per_vertex: usize) -> usize {
        self.vertices.len() / floats_per_vertex
    }

    ///
    /// Marks the start of a feature's index range
    ///
    /// Consecutive marks for the same feature merge: a multi-part geometry stays one
    /// contiguous range however many parts record it.
    ///
    pub fn begin_feature(&mut self, feature: FeatureId) {
        if self.start_indices_feature.last() == Some(&feature) {
            return;
        }

        debug_assert!(
            self.start_indices.last().map(|last| *last <= self.indices.len()).unwrap_or(true),
            "Feature start indices must be non-decreasing"
        );

        self.start_indices.push(self.indices.len());
        self.start_indices_feature.push(feature);
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }

    ///
    /// The features and their index ranges, in insertion order
    ///
    pub fn feature_ranges(&self) -> Vec<(FeatureId, Range<usize>)> {
        let mut ranges = Vec::with_capacity(self.start_indices.len());

        for (position, feature) in self.start_indices_feature.iter().enumerate() {
            let begin   = self.start_indices[position];
            let end     = self.start_indices.get(position + 1).copied().unwrap_or(self.indices.len());
            ranges.push((*feature, begin..end));
        }

        ranges
    }

    ///
    /// Splits an index range into the contiguous sub-ranges not owned by skipped features
    ///
    /// With nothing skipped this returns the range itself, so the common case stays one
    /// draw call.
    ///
    pub fn non_skipped_subranges(&self, range: &Range<usize>, skipped: &FeatureSkipSet) -> Vec<Range<usize>> {
        if skipped.is_empty() {
            return vec![range.clone()];
        }

        let mut result  = vec![];
        let mut cursor  = range.start;

        for (feature, feature_range) in self.feature_ranges() {
            if feature_range.end <= range.start || feature_range.start >= range.end {
                continue;
            }

            if skipped.contains(&feature) {
                let hole_start  = feature_range.start.max(range.start);
                let hole_end    = feature_range.end.min(range.end);

                if hole_start > cursor {
                    result.push(cursor..hole_start);
                }
                cursor = cursor.max(hole_end);
            }
        }

        if cursor < range.end {
            result.push(cursor..range.end);
        }

        result
    }
}

///
/// Style-group boundaries over an index buffer
///
/// Setting a style that differs from the current one opens a new group at the current
/// index position; draw time walks the groups issuing one draw call each, so state
/// changes scale with the number of distinct styles rather than features.
///
pub struct StyleGroups<Style> {
    styles: Vec<Style>,
    starts: Vec<usize>,
}

impl<Style: Clone + PartialEq> StyleGroups<Style> {
    pub fn new() -> StyleGroups<Style> {
        StyleGroups {
            styles: vec![],
            starts: vec![],
        }
    }

    ///
    /// Opens a new group at `index_position` unless the style is unchanged
    ///
    /// Two styles set at the same position collapse to the later one: the earlier group
    /// would have covered no indices.
    ///
    pub fn set_style(&mut self, style: Style, index_position: usize) {
        if self.styles.last() == Some(&style) {
            return;
        }

        if self.starts.last() == Some(&index_position) {
            *self.styles.last_mut().unwrap() = style;
            return;
        }

        self.styles.push(style);
        self.starts.push(index_position);
    }

    ///
    /// The groups and their index ranges, in insertion (painter's) order
    ///
    pub fn groups(&self, total_indices: usize) -> Vec<(Style, Range<usize>)> {
        let mut result = Vec::with_capacity(self.styles.len());

        for (position, style) in self.styles.iter().enumerate() {
            let begin   = self.starts[position];
            let end     = self.starts.get(position + 1).copied().unwrap_or(total_indices);
            if end > begin {
                result.push((style.clone(), begin..end));
            }
        }

        result
    }
}
