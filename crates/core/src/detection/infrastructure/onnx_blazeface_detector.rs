//! BlazeFace face detector using ONNX Runtime via `ort`.
//!
//! Produces one bounding box and six keypoints per face. No tracking: every
//! frame is detected from scratch.

use std::path::Path;

use crate::detection::domain::detector::{validate_frame, DetectionError, Detector};
use crate::detection::domain::detector_config::{FaceDetectorConfig, FaceModel};
use crate::detection::domain::face_keypoints::FACE_KEYPOINT_NAMES;
use crate::shared::detection::{BoundingBox, Detection, DetectionResult, Keypoint};
use crate::shared::frame::Frame;

use super::anchors::{
    decode_boxes, generate_anchors, select_outputs, FACE_FULL_RANGE_LAYERS,
    FACE_SHORT_RANGE_LAYERS,
};
use super::math::{nms, RawDetection};
use super::onnx_session::{input_layout, load_session, run};
use super::tensor::{to_tensor, Normalization, SampleWindow, TensorLayout};

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Box (4) plus six `(x, y)` keypoints per anchor.
const VALUES_PER_ANCHOR: usize = 4 + 2 * FACE_KEYPOINT_NAMES.len();

/// BlazeFace face detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    layout: TensorLayout,
    config: FaceDetectorConfig,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model matching `config.model`.
    pub fn new(model_path: &Path, config: FaceDetectorConfig) -> Result<Self, DetectionError> {
        let session = load_session(model_path)?;
        let layout = input_layout(&session);
        let anchors = anchors_for(config.model);
        Ok(Self {
            session,
            layout,
            config,
            anchors,
        })
    }
}

impl Detector for OnnxBlazefaceDetector {
    fn name(&self) -> &str {
        "Face Detector"
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, DetectionError> {
        validate_frame(frame)?;
        let input_size = self.config.model.input_size();

        let tensor = to_tensor(
            frame,
            &SampleWindow::full(frame),
            input_size,
            Normalization::SymmetricRange,
            self.layout,
        );
        let outputs = run(&mut self.session, tensor)?;
        let (regressors, scores) =
            select_outputs(&outputs, self.anchors.len(), VALUES_PER_ANCHOR)?;

        let candidates = decode_boxes(
            regressors,
            scores,
            &self.anchors,
            input_size,
            FACE_KEYPOINT_NAMES.len(),
            self.config.min_detection_confidence,
        );
        let kept = nms(candidates, NMS_IOU_THRESH);

        Ok(DetectionResult::new(kept.iter().map(to_detection).collect()))
    }
}

fn anchors_for(model: FaceModel) -> Vec<[f32; 2]> {
    let layers = match model {
        FaceModel::ShortRange => FACE_SHORT_RANGE_LAYERS,
        FaceModel::FullRange => FACE_FULL_RANGE_LAYERS,
    };
    generate_anchors(model.input_size(), layers)
}

/// The input is the whole frame stretched to a square, so normalized model
/// coordinates are already normalized frame coordinates.
fn to_detection(raw: &RawDetection) -> Detection {
    let [x1, y1, x2, y2] = raw.bbox;
    let bbox = BoundingBox::from_corners(
        x1.clamp(0.0, 1.0),
        y1.clamp(0.0, 1.0),
        x2.clamp(0.0, 1.0),
        y2.clamp(0.0, 1.0),
    );
    let keypoints = FACE_KEYPOINT_NAMES
        .iter()
        .zip(&raw.keypoints)
        .map(|(&name, &(x, y))| Keypoint::new(name, x, y))
        .collect();
    Detection::new(raw.score, Some(bbox), keypoints)
}
