use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::display::domain::display_surface::{DisplayError, DisplaySurface, UserInput};
use crate::shared::frame::{ChannelOrder, Frame};

/// A native window backed by minifb. ESC or closing the window requests
/// exit; `S` requests a snapshot.
pub struct MinifbDisplay {
    window: Option<Window>,
    buffer: Vec<u32>,
}

impl MinifbDisplay {
    pub fn new() -> Self {
        Self {
            window: None,
            buffer: Vec::new(),
        }
    }
}

impl Default for MinifbDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySurface for MinifbDisplay {
    fn open(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        target_fps: usize,
    ) -> Result<(), DisplayError> {
        let mut window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| DisplayError::Create(e.to_string()))?;
        window.set_target_fps(target_fps);
        self.window = Some(window);
        Ok(())
    }

    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let window = self.window.as_mut().ok_or(DisplayError::NotOpen)?;
        frame_to_argb(frame, &mut self.buffer);
        window
            .update_with_buffer(
                &self.buffer,
                frame.width() as usize,
                frame.height() as usize,
            )
            .map_err(|e| DisplayError::Present(e.to_string()))
    }

    fn poll_input(&mut self) -> UserInput {
        match &self.window {
            Some(window) => UserInput {
                exit_requested: !window.is_open() || window.is_key_down(Key::Escape),
                snapshot_requested: window.is_key_pressed(Key::S, KeyRepeat::No),
            },
            None => UserInput {
                exit_requested: true,
                snapshot_requested: false,
            },
        }
    }

    fn close(&mut self) {
        self.window = None;
    }
}

/// Packs frame pixels as `0RGB` u32 values, reusing `out`'s allocation.
fn frame_to_argb(frame: &Frame, out: &mut Vec<u32>) {
    let channels = frame.channels() as usize;
    out.clear();
    out.reserve(frame.width() as usize * frame.height() as usize);

    if channels < 3 {
        out.extend(frame.data().chunks_exact(channels.max(1)).map(|px| {
            let v = px[0] as u32;
            (v << 16) | (v << 8) | v
        }));
        return;
    }

    let (ri, bi) = match frame.channel_order() {
        ChannelOrder::Rgb => (0, 2),
        ChannelOrder::Bgr => (2, 0),
    };
    out.extend(frame.data().chunks_exact(channels).map(|px| {
        let r = px[ri] as u32;
        let g = px[1] as u32;
        let b = px[bi] as u32;
        (r << 16) | (g << 8) | b
    }));
}
