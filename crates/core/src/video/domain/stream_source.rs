use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

use super::source_reference::SourceReference;
use super::url_resolver::ResolutionError;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source unavailable: {reference}: {reason}")]
    Unavailable { reference: String, reason: String },
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("frame read failed: {0}")]
    ReadFailure(String),
    #[error("stream is not open")]
    NotOpen,
}

impl SourceError {
    pub fn unavailable(reference: &SourceReference, reason: impl ToString) -> Self {
        Self::Unavailable {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A sequential provider of decoded frames.
///
/// Implementations own OS or network resources between `open` and `close`.
/// The playback loop is single-threaded, so sources need not be `Send`.
pub trait StreamSource {
    /// Opens the reference and verifies that frames can actually be decoded.
    fn open(&mut self, reference: &SourceReference) -> Result<VideoMetadata, SourceError>;

    /// Next frame in decode order, or `Ok(None)` once the stream has ended.
    fn read(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Releases the underlying resources. Safe to call more than once.
    fn close(&mut self);
}
