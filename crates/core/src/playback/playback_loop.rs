use std::borrow::Cow;
use std::time::Instant;

use thiserror::Error;

use crate::annotation::domain::annotator::Annotator;
use crate::detection::domain::detector::{DetectionError, Detector};
use crate::display::domain::display_surface::{DisplayError, DisplaySurface, UserInput};
use crate::shared::constants::DEFAULT_DISPLAY_FPS;
use crate::shared::detection::DetectionResult;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::source_reference::SourceReference;
use crate::video::domain::stream_source::{SourceError, StreamSource};

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::playback_config::{snapshot_file_name, DetectionFailurePolicy, PlaybackConfig};
use super::playback_state::{InvalidTransition, PlaybackState};

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("detection failed on frame {frame}: {source}")]
    Detection {
        frame: usize,
        source: DetectionError,
    },
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error("playback loop has already run")]
    AlreadyRun,
}

/// What happened during one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackReport {
    /// `Drained`, `Cancelled` or `Failed`.
    pub outcome: PlaybackState,
    pub frames_processed: usize,
    /// Frames that had at least one detection drawn on them.
    pub frames_annotated: usize,
    pub detection_failures: usize,
    pub snapshots_written: usize,
    /// Set when the stream ended on a read error rather than a clean EOF.
    pub read_failure: Option<String>,
}

/// Reads frames from a stream, runs the detector on each, draws the
/// results and shows them until the stream ends or the user exits.
///
/// Single-use: a second call to [`PlaybackLoop::run`] fails with
/// [`PlaybackError::AlreadyRun`]. The stream and display are closed exactly
/// once on every exit path.
pub struct PlaybackLoop {
    source: Box<dyn StreamSource>,
    detector: Box<dyn Detector>,
    annotator: Box<dyn Annotator>,
    display: Box<dyn DisplaySurface>,
    snapshot_writer: Option<Box<dyn ImageWriter>>,
    logger: Box<dyn PipelineLogger>,
    config: PlaybackConfig,
    lifecycle: Lifecycle,
    report: PlaybackReport,
}

impl PlaybackLoop {
    pub fn new(
        source: Box<dyn StreamSource>,
        detector: Box<dyn Detector>,
        annotator: Box<dyn Annotator>,
        display: Box<dyn DisplaySurface>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            source,
            detector,
            annotator,
            display,
            snapshot_writer: None,
            logger: Box::new(NullPipelineLogger),
            config,
            lifecycle: Lifecycle::new(),
            report: PlaybackReport::default(),
        }
    }

    pub fn with_snapshot_writer(mut self, writer: Box<dyn ImageWriter>) -> Self {
        self.snapshot_writer = Some(writer);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.lifecycle.state
    }

    /// Every state the loop has been in, starting with `Init`.
    pub fn history(&self) -> &[PlaybackState] {
        &self.lifecycle.history
    }

    /// Report of the last run, also available after a failed run.
    pub fn report(&self) -> &PlaybackReport {
        &self.report
    }

    pub fn run(&mut self, reference: &SourceReference) -> Result<PlaybackReport, PlaybackError> {
        if self.lifecycle.state != PlaybackState::Init {
            return Err(PlaybackError::AlreadyRun);
        }

        let Self {
            source,
            detector,
            annotator,
            display,
            snapshot_writer,
            logger,
            config,
            lifecycle,
            report,
        } = self;

        let metadata = match source.open(reference) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::error!("Cannot open {reference}: {e}");
                lifecycle.finish(PlaybackState::Failed, report)?;
                return Err(e.into());
            }
        };
        let source = SourceGuard { source };

        let title = config
            .window_title
            .clone()
            .unwrap_or_else(|| detector.name().to_string());
        let fps = config
            .target_fps
            .unwrap_or_else(|| metadata.display_fps(DEFAULT_DISPLAY_FPS));
        if let Err(e) = display.open(&title, metadata.width, metadata.height, fps) {
            log::error!("Cannot open display: {e}");
            drop(source);
            lifecycle.finish(PlaybackState::Failed, report)?;
            return Err(e.into());
        }
        let display = DisplayGuard { display };

        log::info!(
            "Playing {} ({}x{}, {fps} fps) with {}",
            metadata.source,
            metadata.width,
            metadata.height,
            detector.name()
        );
        lifecycle.advance(PlaybackState::Running)?;

        let mut session = Session {
            display,
            source,
            detector,
            annotator: &**annotator,
            snapshot_writer: snapshot_writer.as_deref(),
            logger,
            config,
            total_frames: metadata.total_frames,
        };
        let outcome = session.play(report);
        drop(session);

        let terminal = match &outcome {
            Ok(state) => *state,
            Err(e) => {
                log::error!("Playback failed: {e}");
                PlaybackState::Failed
            }
        };
        lifecycle.finish(terminal, report)?;
        self.logger.summary();

        outcome.map(|_| self.report.clone())
    }
}

/// Current state plus every state visited, with transitions checked.
struct Lifecycle {
    state: PlaybackState,
    history: Vec<PlaybackState>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: PlaybackState::Init,
            history: vec![PlaybackState::Init],
        }
    }

    fn advance(&mut self, next: PlaybackState) -> Result<(), InvalidTransition> {
        self.state = self.state.transition(next)?;
        self.history.push(next);
        log::debug!("Playback state -> {next}");
        Ok(())
    }

    /// Moves to an outcome state and on to `Closed`.
    fn finish(
        &mut self,
        outcome: PlaybackState,
        report: &mut PlaybackReport,
    ) -> Result<(), InvalidTransition> {
        self.advance(outcome)?;
        report.outcome = outcome;
        self.advance(PlaybackState::Closed)
    }
}

/// Closes the stream when dropped.
struct SourceGuard<'a> {
    source: &'a mut Box<dyn StreamSource>,
}

impl SourceGuard<'_> {
    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        self.source.read()
    }
}

impl Drop for SourceGuard<'_> {
    fn drop(&mut self) {
        self.source.close();
    }
}

/// Closes the display when dropped.
struct DisplayGuard<'a> {
    display: &'a mut Box<dyn DisplaySurface>,
}

impl DisplayGuard<'_> {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.display.show(frame)
    }

    fn poll_input(&mut self) -> UserInput {
        self.display.poll_input()
    }
}

impl Drop for DisplayGuard<'_> {
    fn drop(&mut self) {
        self.display.close();
    }
}

/// Everything one running loop borrows. Dropping it closes the display,
/// then the stream.
struct Session<'a> {
    display: DisplayGuard<'a>,
    source: SourceGuard<'a>,
    detector: &'a mut Box<dyn Detector>,
    annotator: &'a dyn Annotator,
    snapshot_writer: Option<&'a dyn ImageWriter>,
    logger: &'a mut Box<dyn PipelineLogger>,
    config: &'a PlaybackConfig,
    total_frames: usize,
}

impl Session<'_> {
    /// Runs iterations until the stream drains or the user exits.
    /// `Err` means the run failed.
    fn play(&mut self, report: &mut PlaybackReport) -> Result<PlaybackState, PlaybackError> {
        loop {
            let started = Instant::now();
            let mut frame = match self.source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(PlaybackState::Drained),
                Err(e) => {
                    log::warn!("Frame read failed, treating as end of stream: {e}");
                    report.read_failure = Some(e.to_string());
                    return Ok(PlaybackState::Drained);
                }
            };
            self.logger.timing("read", elapsed_ms(started));

            if self.config.mirror {
                frame.flip_horizontal();
            }
            let converted = match frame.to_channel_order(self.detector.channel_order()) {
                Cow::Owned(converted) => Some(converted),
                Cow::Borrowed(_) => None,
            };
            if let Some(converted) = converted {
                frame = converted;
            }

            let detections = self.detect(&frame, report)?;

            if !detections.is_empty() {
                let started = Instant::now();
                self.annotator.annotate(&mut frame, &detections);
                report.frames_annotated += 1;
                self.logger.timing("annotate", elapsed_ms(started));
            }

            let started = Instant::now();
            self.display.show(&frame)?;
            self.logger.timing("display", elapsed_ms(started));

            let input = self.display.poll_input();
            report.frames_processed += 1;
            self.logger.progress(report.frames_processed, self.total_frames);

            if input.snapshot_requested {
                self.snapshot(&frame, report);
            }
            if input.exit_requested {
                log::info!("Exit requested after {} frames", report.frames_processed);
                return Ok(PlaybackState::Cancelled);
            }
            if self
                .config
                .max_frames
                .is_some_and(|max| report.frames_processed >= max)
            {
                return Ok(PlaybackState::Drained);
            }
        }
    }

    fn detect(
        &mut self,
        frame: &Frame,
        report: &mut PlaybackReport,
    ) -> Result<DetectionResult, PlaybackError> {
        let started = Instant::now();
        let result = self.detector.detect(frame);
        self.logger.timing("detect", elapsed_ms(started));

        match result {
            Ok(detections) => {
                self.logger.metric("detections", detections.len() as f64);
                Ok(detections)
            }
            Err(e) => {
                report.detection_failures += 1;
                match self.config.failure_policy {
                    DetectionFailurePolicy::SkipAnnotation => {
                        log::warn!("Detection failed on frame {}: {e}", frame.index());
                        Ok(DetectionResult::empty())
                    }
                    DetectionFailurePolicy::Abort => Err(PlaybackError::Detection {
                        frame: frame.index(),
                        source: e,
                    }),
                }
            }
        }
    }

    fn snapshot(&mut self, frame: &Frame, report: &mut PlaybackReport) {
        let (Some(writer), Some(dir)) = (self.snapshot_writer, &self.config.snapshot_dir) else {
            log::debug!("Snapshot requested but no snapshot directory is configured");
            return;
        };
        let path = dir.join(snapshot_file_name(frame.index()));
        match writer.write(&path, frame) {
            Ok(()) => {
                report.snapshots_written += 1;
                self.logger.info(&format!("Saved snapshot {}", path.display()));
            }
            Err(e) => log::warn!("Failed to save snapshot {}: {e}", path.display()),
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
