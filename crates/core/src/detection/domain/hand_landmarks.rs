//! The 21-point hand skeleton.
//!
//! Index 0 is the wrist; each finger contributes four points from the base
//! joint outward to the tip.

pub const HAND_LANDMARK_COUNT: usize = 21;

pub const HAND_LANDMARK_NAMES: [&str; HAND_LANDMARK_COUNT] = [
    "wrist",
    "thumb_cmc",
    "thumb_mcp",
    "thumb_ip",
    "thumb_tip",
    "index_finger_mcp",
    "index_finger_pip",
    "index_finger_dip",
    "index_finger_tip",
    "middle_finger_mcp",
    "middle_finger_pip",
    "middle_finger_dip",
    "middle_finger_tip",
    "ring_finger_mcp",
    "ring_finger_pip",
    "ring_finger_dip",
    "ring_finger_tip",
    "pinky_mcp",
    "pinky_pip",
    "pinky_dip",
    "pinky_tip",
];

/// Skeleton edges between landmark indices.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // palm
    (0, 1),
    (0, 5),
    (9, 13),
    (13, 17),
    (5, 9),
    (0, 17),
    // thumb
    (1, 2),
    (2, 3),
    (3, 4),
    // index
    (5, 6),
    (6, 7),
    (7, 8),
    // middle
    (9, 10),
    (10, 11),
    (11, 12),
    // ring
    (13, 14),
    (14, 15),
    (15, 16),
    // pinky
    (17, 18),
    (18, 19),
    (19, 20),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Interprets the landmark model's handedness score, where values at or
    /// above 0.5 mean a right hand.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.5 {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}
