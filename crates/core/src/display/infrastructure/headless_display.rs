use crate::display::domain::display_surface::{DisplayError, DisplaySurface, UserInput};
use crate::shared::frame::Frame;

/// Accepts frames without showing them. Never requests exit, so playback
/// runs until the stream ends or `max_frames` is reached.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    open: bool,
    frames_shown: usize,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn open(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        _target_fps: usize,
    ) -> Result<(), DisplayError> {
        log::debug!("Headless display for \"{title}\" ({width}x{height})");
        self.open = true;
        Ok(())
    }

    fn show(&mut self, _frame: &Frame) -> Result<(), DisplayError> {
        if !self.open {
            return Err(DisplayError::NotOpen);
        }
        self.frames_shown += 1;
        Ok(())
    }

    fn poll_input(&mut self) -> UserInput {
        UserInput::default()
    }

    fn close(&mut self) {
        self.open = false;
    }
}
