use std::path::PathBuf;

/// What to do when the detector fails on a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetectionFailurePolicy {
    /// Show the frame unannotated and keep going.
    #[default]
    SkipAnnotation,
    /// Stop playback; the run ends `Failed`.
    Abort,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackConfig {
    /// Flip frames horizontally before detection (selfie view).
    pub mirror: bool,
    pub failure_policy: DetectionFailurePolicy,
    /// Window title; `None` uses the detector's name.
    pub window_title: Option<String>,
    /// Where snapshots are written. Snapshots are disabled when `None`.
    pub snapshot_dir: Option<PathBuf>,
    /// Stop after this many frames.
    pub max_frames: Option<usize>,
    /// Display refresh rate; `None` follows the stream.
    pub target_fps: Option<usize>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            failure_policy: DetectionFailurePolicy::default(),
            window_title: None,
            snapshot_dir: None,
            max_frames: None,
            target_fps: None,
        }
    }
}

/// File name for the snapshot of frame `index`, e.g. `frame_000123.png`.
pub fn snapshot_file_name(index: usize) -> String {
    format!("frame_{index:06}.png")
}
