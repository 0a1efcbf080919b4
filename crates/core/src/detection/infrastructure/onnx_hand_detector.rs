//! Two-stage hand landmark detector using ONNX Runtime via `ort`.
//!
//! Palm detection proposes square regions of interest; the landmark model
//! then returns 21 points, a presence score and a handedness score for each
//! crop. Outside static-image mode, hands found in one frame seed the regions
//! for the next and palm detection only runs while fewer than
//! `max_num_hands` hands are tracked.

use std::path::Path;

use crate::detection::domain::detector::{validate_frame, DetectionError, Detector};
use crate::detection::domain::detector_config::HandDetectorConfig;
use crate::detection::domain::hand_landmarks::{
    Handedness, HAND_CONNECTIONS, HAND_LANDMARK_COUNT, HAND_LANDMARK_NAMES,
};
use crate::shared::detection::{BoundingBox, Detection, DetectionResult, Keypoint};
use crate::shared::frame::Frame;

use super::anchors::{decode_boxes, generate_anchors, select_outputs, PALM_LAYERS};
use super::math::{as_probability, bbox_iou, nms, RawDetection};
use super::onnx_session::{input_layout, load_session, run, OutputTensor};
use super::tensor::{to_tensor, Normalization, SampleWindow, TensorLayout};

const PALM_INPUT_SIZE: u32 = 192;
const LANDMARK_INPUT_SIZE: u32 = 224;

/// Palm keypoints: wrist, index MCP, middle MCP, ring MCP, pinky MCP, two thumb joints.
const PALM_KEYPOINTS: usize = 7;
const PALM_WRIST: usize = 0;
const PALM_MIDDLE_MCP: usize = 2;
const PALM_VALUES_PER_ANCHOR: usize = 4 + 2 * PALM_KEYPOINTS;
const PALM_NMS_IOU_THRESH: f64 = 0.3;

/// A palm box covers only the palm; the crop must hold the whole hand.
const PALM_ROI_SCALE: f64 = 2.6;
/// Fraction of the palm size to move the crop towards the fingers.
const PALM_ROI_SHIFT: f64 = 0.5;
/// Margin around tracked landmarks when deriving the next frame's crop.
const LANDMARK_ROI_SCALE: f64 = 1.6;

/// Two regions overlapping more than this are the same hand.
const DUPLICATE_IOU_THRESH: f64 = 0.5;

/// Square crop of the frame, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct HandRoi {
    cx: f64,
    cy: f64,
    size: f64,
}

impl HandRoi {
    fn window(&self) -> SampleWindow {
        SampleWindow {
            x0: self.cx - self.size / 2.0,
            y0: self.cy - self.size / 2.0,
            width: self.size,
            height: self.size,
        }
    }

    fn corners(&self) -> [f64; 4] {
        let half = self.size / 2.0;
        [
            self.cx - half,
            self.cy - half,
            self.cx + half,
            self.cy + half,
        ]
    }
}

/// Landmark model output mapped back to frame pixels.
#[derive(Clone, Debug, PartialEq)]
struct HandLandmarks {
    /// `(x, y, z)`; z is relative depth in pixels.
    points: Vec<(f64, f64, f64)>,
    presence: f64,
    handedness: Option<Handedness>,
}

impl HandLandmarks {
    fn pixel_bounds(&self) -> [f64; 4] {
        let mut b = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
        for &(x, y, _) in &self.points {
            b[0] = b[0].min(x);
            b[1] = b[1].min(y);
            b[2] = b[2].max(x);
            b[3] = b[3].max(y);
        }
        b
    }

    fn to_detection(&self, frame_width: f64, frame_height: f64) -> Detection {
        let keypoints: Vec<Keypoint> = HAND_LANDMARK_NAMES
            .iter()
            .zip(&self.points)
            .map(|(&name, &(x, y, z))| {
                Keypoint::new(name, x / frame_width, y / frame_height).with_depth(z / frame_width)
            })
            .collect();
        let normalized: Vec<(f64, f64)> = keypoints.iter().map(|k| (k.x, k.y)).collect();

        let detection = Detection::new(
            self.presence,
            BoundingBox::enclosing(&normalized),
            keypoints,
        )
        .with_connections(&HAND_CONNECTIONS);

        match self.handedness {
            Some(h) => detection.with_label(h.label()),
            None => detection,
        }
    }
}

/// Hand detector backed by a palm detection and a hand landmark session.
pub struct OnnxHandDetector {
    palm: PalmModel,
    landmarks: LandmarkModel,
    config: HandDetectorConfig,
    tracked: Vec<HandRoi>,
}

struct PalmModel {
    session: ort::session::Session,
    layout: TensorLayout,
    anchors: Vec<[f32; 2]>,
}

struct LandmarkModel {
    session: ort::session::Session,
    layout: TensorLayout,
}

impl OnnxHandDetector {
    pub fn new(
        palm_model_path: &Path,
        landmark_model_path: &Path,
        config: HandDetectorConfig,
    ) -> Result<Self, DetectionError> {
        let palm_session = load_session(palm_model_path)?;
        let landmark_session = load_session(landmark_model_path)?;
        Ok(Self {
            palm: PalmModel {
                layout: input_layout(&palm_session),
                session: palm_session,
                anchors: generate_anchors(PALM_INPUT_SIZE, PALM_LAYERS),
            },
            landmarks: LandmarkModel {
                layout: input_layout(&landmark_session),
                session: landmark_session,
            },
            config,
            tracked: Vec::new(),
        })
    }
}

impl PalmModel {
    fn detect(&mut self, frame: &Frame, min_confidence: f64) -> Result<Vec<HandRoi>, DetectionError> {
        let tensor = to_tensor(
            frame,
            &SampleWindow::full(frame),
            PALM_INPUT_SIZE,
            Normalization::UnitRange,
            self.layout,
        );
        let outputs = run(&mut self.session, tensor)?;
        let (regressors, scores) =
            select_outputs(&outputs, self.anchors.len(), PALM_VALUES_PER_ANCHOR)?;

        let candidates = decode_boxes(
            regressors,
            scores,
            &self.anchors,
            PALM_INPUT_SIZE,
            PALM_KEYPOINTS,
            min_confidence,
        );
        let palms = nms(candidates, PALM_NMS_IOU_THRESH);
        log::trace!("palm detection: {} candidate(s)", palms.len());

        let (fw, fh) = (frame.width() as f64, frame.height() as f64);
        Ok(palms.iter().map(|p| palm_to_roi(p, fw, fh)).collect())
    }
}

impl LandmarkModel {
    fn detect(&mut self, frame: &Frame, roi: &HandRoi) -> Result<HandLandmarks, DetectionError> {
        let tensor = to_tensor(
            frame,
            &roi.window(),
            LANDMARK_INPUT_SIZE,
            Normalization::UnitRange,
            self.layout,
        );
        let outputs = run(&mut self.session, tensor)?;
        parse_landmarks(&outputs, roi)
    }
}

impl Detector for OnnxHandDetector {
    fn name(&self) -> &str {
        "Hand Detector"
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, DetectionError> {
        validate_frame(frame)?;
        let palm = &mut self.palm;
        let landmarks = &mut self.landmarks;
        let min_confidence = self.config.min_detection_confidence;

        let hands = select_hands(
            std::mem::take(&mut self.tracked),
            &self.config,
            || palm.detect(frame, min_confidence),
            |roi| landmarks.detect(frame, roi),
        )?;
        self.tracked = next_tracked(&hands, &self.config);

        let (fw, fh) = (frame.width() as f64, frame.height() as f64);
        Ok(DetectionResult::new(
            hands.iter().map(|h| h.to_detection(fw, fh)).collect(),
        ))
    }
}

/// Picks at most `max_num_hands` hands for one frame.
///
/// Tracked regions are tried first. Palm detection runs in static-image mode
/// or while fewer than `max_num_hands` regions are tracked; palms overlapping
/// a tracked region are dropped. A hand is kept when its presence reaches the
/// active threshold (detection confidence in static-image mode, tracking
/// confidence otherwise) and it does not overlap a hand already kept.
fn select_hands<P, L>(
    tracked: Vec<HandRoi>,
    config: &HandDetectorConfig,
    mut detect_palms: P,
    mut detect_landmarks: L,
) -> Result<Vec<HandLandmarks>, DetectionError>
where
    P: FnMut() -> Result<Vec<HandRoi>, DetectionError>,
    L: FnMut(&HandRoi) -> Result<HandLandmarks, DetectionError>,
{
    let max_hands = config.max_num_hands;
    let threshold = if config.static_image_mode {
        config.min_detection_confidence
    } else {
        config.min_tracking_confidence
    };

    let mut rois = tracked;
    if config.static_image_mode || rois.len() < max_hands {
        for palm in detect_palms()? {
            let corners = palm.corners();
            if rois
                .iter()
                .all(|r| bbox_iou(&r.corners(), &corners) <= DUPLICATE_IOU_THRESH)
            {
                rois.push(palm);
            }
        }
    }

    let mut hands: Vec<HandLandmarks> = Vec::new();
    for roi in &rois {
        if hands.len() >= max_hands {
            break;
        }
        let hand = detect_landmarks(roi)?;
        if hand.presence < threshold {
            continue;
        }
        let bounds = hand.pixel_bounds();
        if hands
            .iter()
            .any(|h| bbox_iou(&h.pixel_bounds(), &bounds) > DUPLICATE_IOU_THRESH)
        {
            continue;
        }
        hands.push(hand);
    }
    Ok(hands)
}

/// Regions to seed the next frame with; none in static-image mode.
fn next_tracked(hands: &[HandLandmarks], config: &HandDetectorConfig) -> Vec<HandRoi> {
    if config.static_image_mode {
        return Vec::new();
    }
    hands.iter().map(|h| roi_from_landmarks(&h.points)).collect()
}

/// Square crop around a palm, enlarged to the whole hand and shifted from
/// the wrist towards the middle finger.
fn palm_to_roi(palm: &RawDetection, frame_width: f64, frame_height: f64) -> HandRoi {
    let [x1, y1, x2, y2] = palm.bbox;
    let w = (x2 - x1) * frame_width;
    let h = (y2 - y1) * frame_height;
    let cx = (x1 + x2) / 2.0 * frame_width;
    let cy = (y1 + y2) / 2.0 * frame_height;
    let side = w.max(h);

    let (dx, dy) = match (
        palm.keypoints.get(PALM_WRIST),
        palm.keypoints.get(PALM_MIDDLE_MCP),
    ) {
        (Some(&(wx, wy)), Some(&(mx, my))) => {
            let dx = (mx - wx) * frame_width;
            let dy = (my - wy) * frame_height;
            let len = dx.hypot(dy);
            if len > f64::EPSILON {
                (dx / len, dy / len)
            } else {
                (0.0, -1.0)
            }
        }
        _ => (0.0, -1.0),
    };

    HandRoi {
        cx: cx + dx * PALM_ROI_SHIFT * side,
        cy: cy + dy * PALM_ROI_SHIFT * side,
        size: side * PALM_ROI_SCALE,
    }
}

fn roi_from_landmarks(points: &[(f64, f64, f64)]) -> HandRoi {
    let xy: Vec<(f64, f64)> = points.iter().map(|&(x, y, _)| (x, y)).collect();
    match BoundingBox::enclosing(&xy) {
        Some(b) => HandRoi {
            cx: b.x_min + b.width / 2.0,
            cy: b.y_min + b.height / 2.0,
            size: b.width.max(b.height) * LANDMARK_ROI_SCALE,
        },
        None => HandRoi {
            cx: 0.0,
            cy: 0.0,
            size: 0.0,
        },
    }
}

/// Landmarks are the first tensor with 21x3 values; presence and handedness
/// are the first and second scalar outputs.
fn parse_landmarks(outputs: &[OutputTensor], roi: &HandRoi) -> Result<HandLandmarks, DetectionError> {
    let coords = outputs
        .iter()
        .find(|t| t.data.len() == HAND_LANDMARK_COUNT * 3)
        .ok_or_else(|| {
            DetectionError::ModelOutput(format!(
                "no landmark tensor with {} values",
                HAND_LANDMARK_COUNT * 3
            ))
        })?;
    let mut scalars = outputs.iter().filter(|t| t.data.len() == 1);
    let presence = scalars
        .next()
        .map(|t| as_probability(t.data[0]))
        .ok_or_else(|| DetectionError::ModelOutput("no hand presence score".to_string()))?;
    let handedness = scalars
        .next()
        .map(|t| Handedness::from_score(as_probability(t.data[0])));

    let window = roi.window();
    let scale = roi.size / LANDMARK_INPUT_SIZE as f64;
    let points = coords
        .data
        .chunks_exact(3)
        .map(|c| {
            (
                window.x0 + c[0] as f64 * scale,
                window.y0 + c[1] as f64 * scale,
                c[2] as f64 * scale,
            )
        })
        .collect();

    Ok(HandLandmarks {
        points,
        presence,
        handedness,
    })
}
