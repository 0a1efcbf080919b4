use ndarray::Array4;

use crate::shared::frame::Frame;

/// Memory layout of an image input tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TensorLayout {
    #[default]
    Nchw,
    Nhwc,
}

/// How 8-bit channel values map to model input values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    /// `[0, 255]` to `[0.0, 1.0]`
    UnitRange,
    /// `[0, 255]` to `[-1.0, 1.0]`
    SymmetricRange,
}

impl Normalization {
    fn apply(&self, v: u8) -> f32 {
        match self {
            Self::UnitRange => v as f32 / 255.0,
            Self::SymmetricRange => v as f32 / 127.5 - 1.0,
        }
    }
}

/// Rectangle of the source frame, in pixels, that is sampled into a tensor.
/// May extend past the frame edges; those samples are black.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleWindow {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl SampleWindow {
    pub fn full(frame: &Frame) -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            width: frame.width() as f64,
            height: frame.height() as f64,
        }
    }
}

/// Nearest-neighbour resample of `window` to a `size × size` RGB tensor.
pub fn to_tensor(
    frame: &Frame,
    window: &SampleWindow,
    size: u32,
    normalization: Normalization,
    layout: TensorLayout,
) -> Array4<f32> {
    let s = size as usize;
    let src_w = frame.width() as i64;
    let src_h = frame.height() as i64;
    let data = frame.data();
    let black = normalization.apply(0);

    let mut tensor = match layout {
        TensorLayout::Nchw => Array4::<f32>::from_elem((1, 3, s, s), black),
        TensorLayout::Nhwc => Array4::<f32>::from_elem((1, s, s, 3), black),
    };

    for y in 0..s {
        let src_y = (window.y0 + (y as f64 + 0.5) * window.height / s as f64).floor() as i64;
        if src_y < 0 || src_y >= src_h {
            continue;
        }
        for x in 0..s {
            let src_x = (window.x0 + (x as f64 + 0.5) * window.width / s as f64).floor() as i64;
            if src_x < 0 || src_x >= src_w {
                continue;
            }
            let offset = ((src_y * src_w + src_x) * 3) as usize;
            for c in 0..3 {
                let v = normalization.apply(data[offset + c]);
                match layout {
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = v,
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = v,
                }
            }
        }
    }

    tensor
}
