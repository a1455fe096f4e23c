///
/// The ordering and meaning of the values that make up one coordinate in a flat buffer
///
/// `XY` is the common case. `XYZ` adds an elevation, `XYM` a measure (eg, the distance
/// along a route), and `XYZM` both. The renderers only ever read the leading X and Y
/// values of each coordinate: the extra dimensions ride along through simplification
/// and transformation untouched.
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GeometryLayout {
    XY,
    XYZ,
    XYM,
    XYZM,
}

impl GeometryLayout {
    ///
    /// The number of values used by one coordinate in this layout
    ///
    #[inline]
    pub fn stride(&self) -> usize {
        match self {
            GeometryLayout::XY      => 2,
            GeometryLayout::XYZ     => 3,
            GeometryLayout::XYM     => 3,
            GeometryLayout::XYZM    => 4,
        }
    }
}

impl Default for GeometryLayout {
    #[inline]
    fn default() -> Self {
        GeometryLayout::XY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_layouts() {
        assert!(GeometryLayout::XY.stride() == 2);
        assert!(GeometryLayout::XYZ.stride() == 3);
        assert!(GeometryLayout::XYM.stride() == 3);
        assert!(GeometryLayout::XYZM.stride() == 4);
    }
}
