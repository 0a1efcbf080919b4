use crate::annotation::domain::annotator::{AnnotationSummary, Annotator};
use crate::annotation::domain::drawing_spec::AnnotationStyle;
use crate::shared::detection::DetectionResult;
use crate::shared::frame::Frame;

use super::canvas::Canvas;

/// Draws boxes, skeleton connections and keypoints, in that order, so
/// keypoints stay visible on top of lines.
pub struct LandmarkAnnotator {
    style: AnnotationStyle,
}

impl LandmarkAnnotator {
    pub fn new(style: AnnotationStyle) -> Self {
        Self { style }
    }
}

impl Default for LandmarkAnnotator {
    fn default() -> Self {
        Self::new(AnnotationStyle::default())
    }
}

impl Annotator for LandmarkAnnotator {
    fn annotate(&self, frame: &mut Frame, result: &DetectionResult) -> AnnotationSummary {
        let mut summary = AnnotationSummary::default();
        if result.is_empty() {
            return summary;
        }

        let (w, h) = (frame.width(), frame.height());
        let style = &self.style;
        let mut canvas = Canvas::new(frame);

        for det in result {
            if let Some(bbox) = &det.bounding_box {
                let (x1, y1, x2, y2) = bbox.to_pixels(w, h);
                canvas.draw_rectangle(
                    (x1, y1),
                    (x2, y2),
                    style.bounding_box.color,
                    style.bounding_box.thickness,
                );
                summary.boxes += 1;
            }

            for &(a, b) in det.connections {
                if let (Some(from), Some(to)) = (det.keypoints.get(a), det.keypoints.get(b)) {
                    canvas.draw_line(
                        from.to_pixel(w, h),
                        to.to_pixel(w, h),
                        style.connection.color,
                        style.connection.thickness,
                    );
                    summary.connections += 1;
                }
            }

            for kp in &det.keypoints {
                canvas.fill_circle(
                    kp.to_pixel(w, h),
                    style.keypoint.circle_radius,
                    style.keypoint.color,
                );
                summary.keypoints += 1;
            }
        }

        summary
    }
}
