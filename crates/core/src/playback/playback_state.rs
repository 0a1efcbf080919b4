use std::fmt;

use thiserror::Error;

/// Lifecycle of one playback run.
///
/// `Init -> Running -> {Drained, Cancelled, Failed} -> Closed`, with
/// `Init -> Failed` when the source or window cannot be opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    #[default]
    Init,
    Running,
    /// The source ran out of frames.
    Drained,
    /// The user asked to stop.
    Cancelled,
    Failed,
    Closed,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("illegal playback transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: PlaybackState,
    pub to: PlaybackState,
}

impl PlaybackState {
    pub fn can_transition_to(self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, next),
            (Init, Running)
                | (Init, Failed)
                | (Running, Drained)
                | (Running, Cancelled)
                | (Running, Failed)
                | (Drained, Closed)
                | (Cancelled, Closed)
                | (Failed, Closed)
        )
    }

    pub fn transition(self, next: PlaybackState) -> Result<PlaybackState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Running => "RUNNING",
            Self::Drained => "DRAINED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}
