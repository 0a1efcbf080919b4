use thiserror::Error;

use crate::shared::detection::DetectionResult;
use crate::shared::frame::{ChannelOrder, Frame};

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    ModelOutput(String),
}

impl DetectionError {
    pub fn inference(e: impl std::fmt::Display) -> Self {
        Self::Inference(e.to_string())
    }
}

/// Domain interface for per-frame landmark detection.
///
/// Implementations may be stateful (e.g., tracking hands across frames),
/// hence `&mut self`. The input frame is never modified.
pub trait Detector: Send {
    /// Short human-readable name, used for window titles and logs.
    fn name(&self) -> &str;

    /// Channel order `detect` expects. Frames are converted before the call.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, DetectionError>;
}

/// Rejects frames a model cannot consume: empty, non-RGB, or with a pixel
/// buffer that does not match the stated dimensions.
pub fn validate_frame(frame: &Frame) -> Result<(), DetectionError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(DetectionError::MalformedFrame(format!(
            "empty frame {}x{}",
            frame.width(),
            frame.height()
        )));
    }
    if frame.channels() != 3 {
        return Err(DetectionError::MalformedFrame(format!(
            "expected 3 channels, got {}",
            frame.channels()
        )));
    }
    if frame.channel_order() != ChannelOrder::Rgb {
        return Err(DetectionError::MalformedFrame(
            "expected RGB channel order, got BGR".to_string(),
        ));
    }
    let expected = frame.width() as usize * frame.height() as usize * 3;
    if frame.data().len() != expected {
        return Err(DetectionError::MalformedFrame(format!(
            "expected {expected} bytes, got {}",
            frame.data().len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_frame_passes() {
        let frame = Frame::new(vec![0; 4 * 2 * 3], 4, 2, 3, 0);
        assert!(validate_frame(&frame).is_ok());
    }

    #[test]
    fn test_grayscale_frame_is_rejected() {
        let frame = Frame::new(vec![0; 4 * 2], 4, 2, 1, 0);
        assert!(matches!(
            validate_frame(&frame),
            Err(DetectionError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_bgr_frame_is_rejected() {
        let frame = Frame::new(vec![0; 4 * 2 * 3], 4, 2, 3, 0).with_channel_order(ChannelOrder::Bgr);
        assert!(matches!(
            validate_frame(&frame),
            Err(DetectionError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let frame = Frame::new(Vec::new(), 0, 0, 3, 0);
        assert!(matches!(
            validate_frame(&frame),
            Err(DetectionError::MalformedFrame(_))
        ));
    }
}
