use std::borrow::Cow;

/// Byte order of the color channels within each pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A single decoded video frame: contiguous interleaved bytes in row-major order.
///
/// The channel order travels with the pixels so that detectors and drawing
/// code never have to guess what the decoder produced.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    order: ChannelOrder,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            order: ChannelOrder::Rgb,
        }
    }

    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /// Mirrors the frame around its vertical axis (selfie view).
    pub fn flip_horizontal(&mut self) {
        let w = self.width as usize;
        let c = self.channels as usize;
        let stride = w * c;
        if w < 2 || stride == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(stride) {
            for x in 0..w / 2 {
                let left = x * c;
                let right = (w - 1 - x) * c;
                for k in 0..c {
                    row.swap(left + k, right + k);
                }
            }
        }
    }

    /// Returns the frame in the requested channel order, copying only when
    /// a swap is actually needed.
    pub fn to_channel_order(&self, order: ChannelOrder) -> Cow<'_, Frame> {
        if self.order == order || self.channels < 3 {
            return Cow::Borrowed(self);
        }
        let mut converted = self.clone();
        for px in converted.data.chunks_exact_mut(self.channels as usize) {
            px.swap(0, 2);
        }
        converted.order = order;
        Cow::Owned(converted)
    }

    /// Returns the frame turned clockwise by `degrees` (0, 90, 180 or 270).
    /// Any other angle is snapped to the nearest quarter turn.
    pub fn rotated_clockwise(&self, degrees: i32) -> Frame {
        let quarter_turns = ((degrees as f64 / 90.0).round() as i32).rem_euclid(4);
        if quarter_turns == 0 {
            return self.clone();
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let c = self.channels as usize;
        let (out_w, out_h) = if quarter_turns % 2 == 1 { (h, w) } else { (w, h) };

        let mut data = vec![0u8; self.data.len()];
        for y in 0..out_h {
            for x in 0..out_w {
                let (sx, sy) = match quarter_turns {
                    1 => (y, h - 1 - x),
                    2 => (w - 1 - x, h - 1 - y),
                    _ => (w - 1 - y, x),
                };
                let src = (sy * w + sx) * c;
                let dst = (y * out_w + x) * c;
                data[dst..dst + c].copy_from_slice(&self.data[src..src + c]);
            }
        }

        Frame {
            data,
            width: out_w as u32,
            height: out_h as u32,
            channels: self.channels,
            index: self.index,
            order: self.order,
        }
    }
}
