//! Frame and detection result shapes exchanged with the vision backend.

/// A single camera frame or sample image, 8-bit RGB.
pub type Frame = image::RgbImage;

/// A rotated bounding box produced by box extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedBox {
    pub center: (f32, f32),
    pub size: (f32, f32),
    pub angle: f32,
}

impl DetectedBox {
    pub fn area(&self) -> f32 {
        self.size.0 * self.size.1
    }
}

/// Result of grouping boxes and pairing left/right items.
#[derive(Debug, Clone, Default)]
pub struct PairOutcome {
    pub groups: usize,
    pub left: Option<Frame>,
    pub right: Option<Frame>,
}

impl PairOutcome {
    pub fn is_paired(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Reference images stored alongside a configuration. Either side may be
/// missing, in which case screens show no preview.
#[derive(Debug, Clone, Default)]
pub struct SampleImages {
    pub left: Option<Frame>,
    pub right: Option<Frame>,
}

impl SampleImages {
    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}
