//! Per-frame detection output shared by every detector and the annotator.
//!
//! Coordinates are normalized to the frame (0.0..=1.0 on both axes) so a
//! result stays valid regardless of the resolution the model ran at.

/// Axis-aligned box in normalized frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Smallest box enclosing all points, or `None` for an empty slice.
    pub fn enclosing(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut x1, mut y1, mut x2, mut y2) = (first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
        }
        Some(Self::from_corners(x1, y1, x2, y2))
    }

    pub fn x_max(&self) -> f64 {
        self.x_min + self.width
    }

    pub fn y_max(&self) -> f64 {
        self.y_min + self.height
    }

    /// Pixel corners `(x1, y1, x2, y2)` for a frame of the given size.
    ///
    /// Not clamped: callers that draw must clip themselves.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (i32, i32, i32, i32) {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        (
            (self.x_min * fw).round() as i32,
            (self.y_min * fh).round() as i32,
            (self.x_max() * fw).round() as i32,
            (self.y_max() * fh).round() as i32,
        )
    }

}

/// A named landmark. `z` is relative depth when the model provides one.
#[derive(Clone, Debug, PartialEq)]
pub struct Keypoint {
    pub name: &'static str,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Keypoint {
    pub fn new(name: &'static str, x: f64, y: f64) -> Self {
        Self {
            name,
            x,
            y,
            z: None,
        }
    }

    pub fn with_depth(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn to_pixel(&self, frame_width: u32, frame_height: u32) -> (i32, i32) {
        (
            (self.x * frame_width as f64).round() as i32,
            (self.y * frame_height as f64).round() as i32,
        )
    }
}

/// One detected entity: a face, a hand, ...
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub score: f64,
    pub bounding_box: Option<BoundingBox>,
    pub keypoints: Vec<Keypoint>,
    /// Free-form class label, e.g. handedness.
    pub label: Option<String>,
    /// Skeleton edges as index pairs into `keypoints`.
    pub connections: &'static [(usize, usize)],
}

impl Detection {
    pub fn new(score: f64, bounding_box: Option<BoundingBox>, keypoints: Vec<Keypoint>) -> Self {
        Self {
            score,
            bounding_box,
            keypoints,
            label: None,
            connections: &[],
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_connections(mut self, connections: &'static [(usize, usize)]) -> Self {
        self.connections = connections;
        self
    }

    pub fn keypoint(&self, name: &str) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }
}

/// Everything a detector found in one frame. Lives for a single iteration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub fn keypoint_count(&self) -> usize {
        self.detections.iter().map(|d| d.keypoints.len()).sum()
    }
}

impl<'a> IntoIterator for &'a DetectionResult {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}
