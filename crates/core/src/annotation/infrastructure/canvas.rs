//! Clipped drawing primitives over a frame's pixel buffer.

use crate::annotation::domain::drawing_spec::Color;
use crate::shared::frame::{ChannelOrder, Frame};

pub struct Canvas<'a> {
    pixels: &'a mut [u8],
    width: i64,
    height: i64,
    channels: usize,
    order: ChannelOrder,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        let width = frame.width() as i64;
        let height = frame.height() as i64;
        let channels = frame.channels() as usize;
        let order = frame.channel_order();
        Self {
            pixels: frame.data_mut(),
            width,
            height,
            channels,
            order,
        }
    }

    /// Sets one pixel; coordinates outside the frame are ignored.
    pub fn set_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) as usize * self.channels;
        let bytes = color.bytes(self.order);
        let n = self.channels.min(3);
        if let Some(px) = self.pixels.get_mut(idx..idx + n) {
            px.copy_from_slice(&bytes[..n]);
        }
    }

    /// Rectangle outline with the border growing inwards from the corners.
    pub fn draw_rectangle(
        &mut self,
        (x1, y1): (i32, i32),
        (x2, y2): (i32, i32),
        color: Color,
        thickness: u32,
    ) {
        let (x1, x2) = (x1.min(x2) as i64, x1.max(x2) as i64);
        let (y1, y2) = (y1.min(y2) as i64, y1.max(y2) as i64);
        let t = (thickness.max(1) as i64).min(x2 - x1 + 1).min(y2 - y1 + 1);

        let cx1 = x1.max(0);
        let cx2 = x2.min(self.width - 1);
        let cy1 = y1.max(0);
        let cy2 = y2.min(self.height - 1);
        if cx1 > cx2 || cy1 > cy2 {
            return;
        }

        for k in 0..t {
            for x in cx1..=cx2 {
                self.set_pixel(x, y1 + k, color);
                self.set_pixel(x, y2 - k, color);
            }
            for y in cy1..=cy2 {
                self.set_pixel(x1 + k, y, color);
                self.set_pixel(x2 - k, y, color);
            }
        }
    }

    /// Straight line of the given thickness, clipped to the frame first.
    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Color, thickness: u32) {
        let radius = thickness as i64 / 2;
        let Some(((mut x0, mut y0), (x1, y1))) = self.clip_line(from, to, radius) else {
            return;
        };

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(x0, y0, radius, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    pub fn fill_circle(&mut self, (cx, cy): (i32, i32), radius: u32, color: Color) {
        self.stamp(cx as i64, cy as i64, radius as i64, color);
    }

    fn stamp(&mut self, cx: i64, cy: i64, radius: i64, color: Color) {
        if cx + radius < 0
            || cy + radius < 0
            || cx - radius >= self.width
            || cy - radius >= self.height
        {
            return;
        }
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Liang-Barsky clip against the frame grown by `margin`. Keeps the
    /// Bresenham walk bounded for far off-screen endpoints.
    fn clip_line(
        &self,
        (x0, y0): (i32, i32),
        (x1, y1): (i32, i32),
        margin: i64,
    ) -> Option<((i64, i64), (i64, i64))> {
        let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
        let min_x = -(margin as f64);
        let min_y = -(margin as f64);
        let max_x = (self.width - 1 + margin) as f64;
        let max_y = (self.height - 1 + margin) as f64;

        let dx = x1 - x0;
        let dy = y1 - y0;
        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;

        for (p, q) in [
            (-dx, x0 - min_x),
            (dx, max_x - x0),
            (-dy, y0 - min_y),
            (dy, max_y - y0),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    t0 = t0.max(r);
                } else {
                    t1 = t1.min(r);
                }
            }
        }

        if t0 > t1 {
            return None;
        }

        Some((
            (
                (x0 + t0 * dx).round() as i64,
                (y0 + t0 * dy).round() as i64,
            ),
            (
                (x0 + t1 * dx).round() as i64,
                (y0 + t1 * dy).round() as i64,
            ),
        ))
    }
}
