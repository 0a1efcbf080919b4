//! The six BlazeFace keypoints, in model output order.
//!
//! "Right" and "left" are from the subject's point of view.

pub const RIGHT_EYE: &str = "right_eye";
pub const LEFT_EYE: &str = "left_eye";
pub const NOSE_TIP: &str = "nose_tip";
pub const MOUTH_CENTER: &str = "mouth_center";
pub const RIGHT_EAR_TRAGION: &str = "right_ear_tragion";
pub const LEFT_EAR_TRAGION: &str = "left_ear_tragion";

pub const FACE_KEYPOINT_NAMES: [&str; 6] = [
    RIGHT_EYE,
    LEFT_EYE,
    NOSE_TIP,
    MOUTH_CENTER,
    RIGHT_EAR_TRAGION,
    LEFT_EAR_TRAGION,
];
