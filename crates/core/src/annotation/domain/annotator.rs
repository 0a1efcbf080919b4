use crate::shared::detection::DetectionResult;
use crate::shared::frame::Frame;

/// What an [`Annotator`] drew on one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub boxes: usize,
    pub keypoints: usize,
    pub connections: usize,
}

impl AnnotationSummary {
    pub fn is_empty(&self) -> bool {
        self.boxes == 0 && self.keypoints == 0 && self.connections == 0
    }
}

/// Domain interface for drawing detection results onto a frame in place.
///
/// Infallible: any well-formed result can be drawn, and marks that fall
/// outside the frame are clipped. An empty result leaves the frame untouched.
pub trait Annotator: Send {
    fn annotate(&self, frame: &mut Frame, result: &DetectionResult) -> AnnotationSummary;
}
