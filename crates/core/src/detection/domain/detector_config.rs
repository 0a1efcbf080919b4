use thiserror::Error;

use crate::shared::constants::{FACE_FULL_RANGE_MODEL_NAME, FACE_SHORT_RANGE_MODEL_NAME};

/// Default minimum score for a candidate to be reported.
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f64 = 0.5;

/// Default minimum hand-presence score for keeping a tracked hand.
pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f64 = 0.5;

pub const DEFAULT_MAX_NUM_HANDS: usize = 2;

#[derive(Error, Debug, PartialEq)]
pub enum DetectorConfigError {
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    ConfidenceOutOfRange { name: &'static str, value: f64 },
    #[error("max_num_hands must be at least 1")]
    NoHands,
}

/// Which BlazeFace variant to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaceModel {
    /// Faces within roughly two meters of the camera.
    ShortRange,
    /// Faces up to roughly five meters away.
    #[default]
    FullRange,
}

impl FaceModel {
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::ShortRange => FACE_SHORT_RANGE_MODEL_NAME,
            Self::FullRange => FACE_FULL_RANGE_MODEL_NAME,
        }
    }

    pub fn input_size(&self) -> u32 {
        match self {
            Self::ShortRange => 128,
            Self::FullRange => 192,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetectorConfig {
    pub model: FaceModel,
    pub min_detection_confidence: f64,
}

impl Default for FaceDetectorConfig {
    fn default() -> Self {
        Self {
            model: FaceModel::default(),
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
        }
    }
}

impl FaceDetectorConfig {
    pub fn validate(&self) -> Result<(), DetectorConfigError> {
        check_unit_range("min_detection_confidence", self.min_detection_confidence)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandDetectorConfig {
    pub min_detection_confidence: f64,
    pub min_tracking_confidence: f64,
    pub max_num_hands: usize,
    /// Run palm detection on every frame instead of tracking.
    pub static_image_mode: bool,
}

impl Default for HandDetectorConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
            max_num_hands: DEFAULT_MAX_NUM_HANDS,
            static_image_mode: false,
        }
    }
}

impl HandDetectorConfig {
    pub fn validate(&self) -> Result<(), DetectorConfigError> {
        check_unit_range("min_detection_confidence", self.min_detection_confidence)?;
        check_unit_range("min_tracking_confidence", self.min_tracking_confidence)?;
        if self.max_num_hands == 0 {
            return Err(DetectorConfigError::NoHands);
        }
        Ok(())
    }
}

fn check_unit_range(name: &'static str, value: f64) -> Result<(), DetectorConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DetectorConfigError::ConfidenceOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FaceDetectorConfig::default().validate().is_ok());
        assert!(HandDetectorConfig::default().validate().is_ok());
        assert_eq!(FaceDetectorConfig::default().model, FaceModel::FullRange);
        assert_eq!(HandDetectorConfig::default().max_num_hands, 2);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_confidence_out_of_range(#[case] value: f64) {
        let config = FaceDetectorConfig {
            min_detection_confidence: value,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectorConfigError::ConfidenceOutOfRange { .. })
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    fn test_confidence_bounds_are_inclusive(#[case] value: f64) {
        let config = HandDetectorConfig {
            min_tracking_confidence: value,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_hands_rejected() {
        let config = HandDetectorConfig {
            max_num_hands: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(DetectorConfigError::NoHands));
    }

    #[rstest]
    #[case(FaceModel::ShortRange, 128, "blaze_face_short_range.onnx")]
    #[case(FaceModel::FullRange, 192, "blaze_face_full_range.onnx")]
    fn test_face_model_geometry(#[case] model: FaceModel, #[case] size: u32, #[case] name: &str) {
        assert_eq!(model.input_size(), size);
        assert_eq!(model.model_name(), name);
    }
}
