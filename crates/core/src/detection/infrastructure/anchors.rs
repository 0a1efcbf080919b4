//! SSD anchor grids and box decoding shared by BlazeFace and palm detection.

use super::math::{sigmoid, RawDetection};
use super::onnx_session::OutputTensor;
use crate::detection::domain::detector::DetectionError;

/// Raw scores are clipped to this magnitude before the sigmoid.
const SCORE_CLIP: f32 = 100.0;

/// `(stride, anchors_per_cell)` for BlazeFace short range (16x16 and 8x8 grids).
pub const FACE_SHORT_RANGE_LAYERS: &[(u32, usize)] = &[(8, 2), (16, 6)];

/// `(stride, anchors_per_cell)` for BlazeFace full range (one 48x48 grid).
pub const FACE_FULL_RANGE_LAYERS: &[(u32, usize)] = &[(4, 1)];

/// `(stride, anchors_per_cell)` for palm detection (24x24 and 12x12 grids).
pub const PALM_LAYERS: &[(u32, usize)] = &[(8, 2), (16, 6)];

/// Anchor centers in normalized coordinates, one per prediction slot.
pub fn generate_anchors(input_size: u32, layers: &[(u32, usize)]) -> Vec<[f32; 2]> {
    let mut anchors = Vec::new();

    for &(stride, per_cell) in layers {
        let grid_size = (input_size / stride) as usize;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Picks the regressor and score tensors out of a model's outputs by size.
///
/// Returns `(regressors, scores)`.
pub fn select_outputs(
    outputs: &[OutputTensor],
    num_anchors: usize,
    values_per_anchor: usize,
) -> Result<(&[f32], &[f32]), DetectionError> {
    let find = |len: usize| {
        outputs
            .iter()
            .find(|t| t.data.len() == len)
            .map(|t| t.data.as_slice())
    };

    let regressors = find(num_anchors * values_per_anchor).ok_or_else(|| {
        DetectionError::ModelOutput(format!(
            "no regressor tensor with {num_anchors}x{values_per_anchor} values"
        ))
    })?;
    let scores = find(num_anchors).ok_or_else(|| {
        DetectionError::ModelOutput(format!("no score tensor with {num_anchors} values"))
    })?;
    Ok((regressors, scores))
}

/// Decodes anchor-relative regressions into candidates scoring at least
/// `min_score`.
///
/// Each regressor row is `[dx, dy, w, h, kp0x, kp0y, ...]` in input pixels.
pub fn decode_boxes(
    regressors: &[f32],
    scores: &[f32],
    anchors: &[[f32; 2]],
    input_size: u32,
    num_keypoints: usize,
    min_score: f64,
) -> Vec<RawDetection> {
    let stride = 4 + 2 * num_keypoints;
    let scale = input_size as f32;
    let mut dets = Vec::new();

    for (i, (&raw_score, anchor)) in scores.iter().zip(anchors).enumerate() {
        let score = sigmoid(raw_score.clamp(-SCORE_CLIP, SCORE_CLIP)) as f64;
        if score < min_score {
            continue;
        }

        let offset = i * stride;
        let Some(row) = regressors.get(offset..offset + stride) else {
            break;
        };

        let cx = anchor[0] + row[0] / scale;
        let cy = anchor[1] + row[1] / scale;
        let w = row[2] / scale;
        let h = row[3] / scale;

        let keypoints = (0..num_keypoints)
            .map(|k| {
                (
                    (anchor[0] + row[4 + 2 * k] / scale) as f64,
                    (anchor[1] + row[5 + 2 * k] / scale) as f64,
                )
            })
            .collect();

        dets.push(RawDetection {
            bbox: [
                (cx - w / 2.0) as f64,
                (cy - h / 2.0) as f64,
                (cx + w / 2.0) as f64,
                (cy + h / 2.0) as f64,
            ],
            score,
            keypoints,
        });
    }

    dets
}
