#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    /// Width of the frames `read` returns, after rotation.
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Zero when the container does not know (live or remote streams).
    pub total_frames: usize,
    pub codec: String,
    /// Human-readable description of what was opened (path or URL).
    pub source: String,
    /// Clockwise rotation (0, 90, 180 or 270) applied to decoded frames so
    /// they display upright.
    pub rotation: i32,
}

impl VideoMetadata {
    /// Display refresh rate to aim for, falling back to `default_fps` when
    /// the stream does not advertise a usable rate.
    pub fn display_fps(&self, default_fps: usize) -> usize {
        if self.fps.is_finite() && self.fps >= 1.0 {
            self.fps.round() as usize
        } else {
            default_fps
        }
    }
}
