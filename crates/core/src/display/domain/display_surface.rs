use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("failed to create window: {0}")]
    Create(String),
    #[error("failed to present frame: {0}")]
    Present(String),
    #[error("display is not open")]
    NotOpen,
}

/// Input gathered since the previous poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserInput {
    /// ESC was pressed or the window was closed.
    pub exit_requested: bool,
    pub snapshot_requested: bool,
}

/// Where annotated frames are shown and user input comes from.
///
/// Window systems are generally tied to the thread that created them, so
/// surfaces need not be `Send`.
pub trait DisplaySurface {
    fn open(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        target_fps: usize,
    ) -> Result<(), DisplayError>;

    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Polled once per iteration, after `show`.
    fn poll_input(&mut self) -> UserInput;

    /// Releases the window. Safe to call more than once.
    fn close(&mut self);
}
