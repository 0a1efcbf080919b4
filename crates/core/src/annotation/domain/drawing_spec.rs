use crate::shared::frame::ChannelOrder;

/// An RGB color, independent of any frame's byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pixel bytes in the given channel order.
    pub fn bytes(&self, order: ChannelOrder) -> [u8; 3] {
        match order {
            ChannelOrder::Rgb => [self.r, self.g, self.b],
            ChannelOrder::Bgr => [self.b, self.g, self.r],
        }
    }
}

/// How one kind of mark is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawingSpec {
    pub color: Color,
    /// Line width in pixels.
    pub thickness: u32,
    /// Radius of keypoint dots in pixels.
    pub circle_radius: u32,
}

impl DrawingSpec {
    pub const fn new(color: Color, thickness: u32, circle_radius: u32) -> Self {
        Self {
            color,
            thickness,
            circle_radius,
        }
    }
}

/// The full set of styles used for one detector's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationStyle {
    pub bounding_box: DrawingSpec,
    pub keypoint: DrawingSpec,
    pub connection: DrawingSpec,
}

impl AnnotationStyle {
    /// Green boxes, red keypoints.
    pub fn face() -> Self {
        Self {
            bounding_box: DrawingSpec::new(Color::GREEN, 2, 2),
            keypoint: DrawingSpec::new(Color::RED, 2, 2),
            connection: DrawingSpec::new(Color::WHITE, 2, 2),
        }
    }

    /// Red landmarks joined by white skeleton lines.
    ///
    /// Every finger is drawn in the same flat colours; there is no per-finger
    /// palette.
    pub fn hand() -> Self {
        Self {
            bounding_box: DrawingSpec::new(Color::GREEN, 1, 2),
            keypoint: DrawingSpec::new(Color::RED, 2, 2),
            connection: DrawingSpec::new(Color::WHITE, 2, 2),
        }
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self::face()
    }
}
