pub const FACE_SHORT_RANGE_MODEL_NAME: &str = "blaze_face_short_range.onnx";
pub const FACE_FULL_RANGE_MODEL_NAME: &str = "blaze_face_full_range.onnx";
pub const PALM_DETECTION_MODEL_NAME: &str = "palm_detection_full.onnx";
pub const HAND_LANDMARK_MODEL_NAME: &str = "hand_landmark_full.onnx";

/// Reference opened when none is given on the command line.
pub const DEFAULT_REFERENCE: &str = "face.mp4";

/// Window refresh rate when the stream does not report one.
pub const DEFAULT_DISPLAY_FPS: usize = 30;

/// yt-dlp format selector: best progressive MP4, else best available.
pub const YOUTUBE_FORMAT: &str = "best[ext=mp4]/best";

pub const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

pub const REMOTE_SCHEMES: &[&str] = &["http", "https", "rtsp", "rtsps", "rtmp", "udp", "tcp"];
