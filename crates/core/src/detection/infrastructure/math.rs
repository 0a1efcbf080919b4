//! Shared math utilities for the SSD-style detection backends.

/// A decoded candidate before non-maximum suppression, in normalized
/// model-input coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]`
    pub bbox: [f64; 4],
    pub score: f64,
    pub keypoints: Vec<(f64, f64)>,
}

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy non-maximum suppression. Output is sorted by descending score.
pub fn nms(mut dets: Vec<RawDetection>, iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets {
        if keep
            .iter()
            .all(|kept| bbox_iou(&kept.bbox, &det.bbox) <= iou_thresh)
        {
            keep.push(det);
        }
    }
    keep
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Scores outside `[0, 1]` are logits; squash them.
pub fn as_probability(x: f32) -> f64 {
    if (0.0..=1.0).contains(&x) {
        x as f64
    } else {
        sigmoid(x) as f64
    }
}
