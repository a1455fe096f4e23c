use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

///
/// The drawing types a replay group buckets its replays by
///
/// Within one z-index, drawing types stack in a fixed painter's order so that fills and
/// strokes always sit under markers and labels.
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ReplayType {
    Circle,
    Default,
    Image,
    LineString,
    Polygon,
    Text,
}

///
/// The order drawing types replay in when composing a frame
///
pub const REPLAY_ORDER: [ReplayType; 6] = [
    ReplayType::Polygon,
    ReplayType::Circle,
    ReplayType::LineString,
    ReplayType::Image,
    ReplayType::Text,
    ReplayType::Default,
];

///
/// The order drawing types are probed in for hit detection: the reverse of the draw
/// order, so the topmost drawing wins
///
pub const HIT_DETECT_ORDER: [ReplayType; 6] = [
    ReplayType::Default,
    ReplayType::Text,
    ReplayType::Image,
    ReplayType::LineString,
    ReplayType::Circle,
    ReplayType::Polygon,
];

///
/// A z-index key ordering replays numerically
///
/// Z-indices arrive from the style model as plain numbers (fractional values are legal),
/// so the key wraps an `f64` with a total order: replay groups iterate their z-indices
/// ascending to draw and descending to hit-test.
///
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ZIndex(pub f64);

impl ZIndex {
    ///
    /// The key used when a feature's style declares no z-index
    ///
    #[inline]
    pub fn default_key() -> ZIndex {
        ZIndex(0.0)
    }
}

impl PartialEq for ZIndex {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for ZIndex { }

impl PartialOrd for ZIndex {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ZIndex {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for ZIndex {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
