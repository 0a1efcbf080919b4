use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use landmark_player_core::annotation::domain::drawing_spec::AnnotationStyle;
use landmark_player_core::annotation::infrastructure::landmark_annotator::LandmarkAnnotator;
use landmark_player_core::detection::domain::detector::Detector;
use landmark_player_core::detection::domain::detector_config::{
    FaceDetectorConfig, FaceModel, HandDetectorConfig,
};
use landmark_player_core::detection::infrastructure::model_resolver;
use landmark_player_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use landmark_player_core::detection::infrastructure::onnx_hand_detector::OnnxHandDetector;
use landmark_player_core::display::domain::display_surface::DisplaySurface;
use landmark_player_core::display::infrastructure::headless_display::HeadlessDisplay;
use landmark_player_core::display::infrastructure::minifb_display::MinifbDisplay;
use landmark_player_core::playback::pipeline_logger::StdoutPipelineLogger;
use landmark_player_core::playback::playback_config::{DetectionFailurePolicy, PlaybackConfig};
use landmark_player_core::playback::playback_loop::PlaybackLoop;
use landmark_player_core::shared::constants::{
    DEFAULT_REFERENCE, HAND_LANDMARK_MODEL_NAME, PALM_DETECTION_MODEL_NAME,
};
use landmark_player_core::video::domain::source_reference::SourceReference;
use landmark_player_core::video::infrastructure::ffmpeg_stream_source::FfmpegStreamSource;
use landmark_player_core::video::infrastructure::image_file_writer::ImageFileWriter;
use landmark_player_core::video::infrastructure::resolving_stream_source::ResolvingStreamSource;
use landmark_player_core::video::infrastructure::ytdlp_resolver::YtDlpResolver;

/// Play a video file, stream or YouTube URL with live face or hand landmarks.
#[derive(Parser, Debug)]
#[command(name = "landmark-player")]
struct Cli {
    /// Video file, stream URL or YouTube URL.
    #[arg(default_value = DEFAULT_REFERENCE)]
    input: String,

    /// What to detect: face or hand.
    #[arg(long, default_value = "face")]
    detector: String,

    /// Minimum detection confidence (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Minimum hand presence score to keep tracking a hand (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    tracking_confidence: f64,

    /// Maximum number of hands to detect.
    #[arg(long, default_value = "2")]
    max_hands: usize,

    /// Face model range: full (up to ~5m) or short (up to ~2m).
    #[arg(long, default_value = "full")]
    face_model: String,

    /// Run palm detection on every frame instead of tracking hands.
    #[arg(long)]
    static_image_mode: bool,

    /// Show frames as decoded instead of mirrored.
    #[arg(long)]
    no_mirror: bool,

    /// Run without a window (no exit key; stops at end of stream).
    #[arg(long)]
    headless: bool,

    /// Directory for snapshots taken with the S key.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Network read timeout in seconds for remote streams.
    #[arg(long)]
    read_timeout: Option<f64>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Display refresh rate (defaults to the stream's frame rate).
    #[arg(long)]
    fps: Option<usize>,

    /// What to do when detection fails on a frame: skip or abort.
    #[arg(long, default_value = "skip")]
    on_detection_error: String,

    /// Directory containing the ONNX models.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Base URL to download missing models from.
    #[arg(long)]
    model_base_url: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let reference = SourceReference::parse(&cli.input);
    let detector = build_detector(&cli)?;
    let style = if cli.detector == "hand" {
        AnnotationStyle::hand()
    } else {
        AnnotationStyle::face()
    };

    let mut ffmpeg_source = FfmpegStreamSource::new();
    if let Some(secs) = cli.read_timeout {
        ffmpeg_source = ffmpeg_source.with_read_timeout(Duration::from_secs_f64(secs));
    }
    let source = ResolvingStreamSource::new(Box::new(ffmpeg_source), Box::new(YtDlpResolver::new()));

    let display: Box<dyn DisplaySurface> = if cli.headless {
        Box::new(HeadlessDisplay::new())
    } else {
        log::info!("Press ESC to exit, S to save a snapshot");
        Box::new(MinifbDisplay::new())
    };

    let config = build_config(&cli);
    let snapshot_dir = config.snapshot_dir.clone();
    let mut playback = PlaybackLoop::new(
        Box::new(source),
        detector,
        Box::new(LandmarkAnnotator::new(style)),
        display,
        config,
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()));
    if snapshot_dir.is_some() {
        playback = playback.with_snapshot_writer(Box::new(ImageFileWriter::new()));
    }

    let report = playback.run(&reference)?;
    log::info!(
        "Finished ({}): {} frames, {} annotated, {} detection failures, {} snapshots",
        report.outcome,
        report.frames_processed,
        report.frames_annotated,
        report.detection_failures,
        report.snapshots_written
    );
    if let Some(reason) = &report.read_failure {
        log::warn!("Stream ended early: {reason}");
    }
    Ok(())
}

fn build_config(cli: &Cli) -> PlaybackConfig {
    PlaybackConfig {
        mirror: !cli.no_mirror,
        failure_policy: parse_failure_policy(&cli.on_detection_error),
        snapshot_dir: cli.snapshot_dir.clone(),
        max_frames: cli.max_frames,
        target_fps: cli.fps,
        ..PlaybackConfig::default()
    }
}

fn build_detector(cli: &Cli) -> Result<Box<dyn Detector>, Box<dyn std::error::Error>> {
    if cli.detector == "hand" {
        let config = HandDetectorConfig {
            min_detection_confidence: cli.confidence,
            min_tracking_confidence: cli.tracking_confidence,
            max_num_hands: cli.max_hands,
            static_image_mode: cli.static_image_mode,
        };
        config.validate()?;
        let palm_path = resolve_model(cli, PALM_DETECTION_MODEL_NAME)?;
        let landmark_path = resolve_model(cli, HAND_LANDMARK_MODEL_NAME)?;
        Ok(Box::new(OnnxHandDetector::new(
            &palm_path,
            &landmark_path,
            config,
        )?))
    } else {
        let config = FaceDetectorConfig {
            model: parse_face_model(&cli.face_model),
            min_detection_confidence: cli.confidence,
        };
        config.validate()?;
        let model_path = resolve_model(cli, config.model.model_name())?;
        Ok(Box::new(OnnxBlazefaceDetector::new(&model_path, config)?))
    }
}

fn resolve_model(cli: &Cli, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let path = model_resolver::resolve(
        name,
        cli.model_dir.as_deref(),
        cli.model_base_url.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    log::debug!("Using model {}", path.display());
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.input.trim().is_empty() {
        return Err("Input must not be empty".into());
    }
    if cli.detector != "face" && cli.detector != "hand" {
        return Err(format!(
            "Detector must be 'face' or 'hand', got '{}'",
            cli.detector
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.tracking_confidence) {
        return Err(format!(
            "Tracking confidence must be between 0.0 and 1.0, got {}",
            cli.tracking_confidence
        )
        .into());
    }
    if cli.max_hands == 0 {
        return Err("Max hands must be at least 1".into());
    }
    if cli.face_model != "full" && cli.face_model != "short" {
        return Err(format!(
            "Face model must be 'full' or 'short', got '{}'",
            cli.face_model
        )
        .into());
    }
    if let Some(secs) = cli.read_timeout {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(format!("Read timeout must be a positive number, got {secs}").into());
        }
    }
    if cli.max_frames == Some(0) {
        return Err("Max frames must be at least 1".into());
    }
    if cli.fps == Some(0) {
        return Err("FPS must be at least 1".into());
    }
    if cli.on_detection_error != "skip" && cli.on_detection_error != "abort" {
        return Err(format!(
            "On detection error must be 'skip' or 'abort', got '{}'",
            cli.on_detection_error
        )
        .into());
    }
    Ok(())
}

fn parse_face_model(model: &str) -> FaceModel {
    if model == "short" {
        FaceModel::ShortRange
    } else {
        FaceModel::FullRange
    }
}

fn parse_failure_policy(policy: &str) -> DetectionFailurePolicy {
    if policy == "abort" {
        DetectionFailurePolicy::Abort
    } else {
        DetectionFailurePolicy::SkipAnnotation
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["landmark-player"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.input, "face.mp4");
        assert_eq!(cli.detector, "face");
        assert_eq!(cli.max_hands, 2);
        assert!(validate(&cli).is_ok());

        let config = build_config(&cli);
        assert!(config.mirror);
        assert_eq!(config.failure_policy, DetectionFailurePolicy::SkipAnnotation);
        assert!(config.snapshot_dir.is_none());
    }

    #[test]
    fn test_hand_options_parse() {
        let cli = parse(&[
            "https://youtu.be/abc",
            "--detector",
            "hand",
            "--max-hands",
            "1",
            "--static-image-mode",
            "--no-mirror",
            "--on-detection-error",
            "abort",
            "--max-frames",
            "100",
        ]);
        assert!(validate(&cli).is_ok());
        assert_eq!(cli.max_hands, 1);
        assert!(cli.static_image_mode);

        let config = build_config(&cli);
        assert!(!config.mirror);
        assert_eq!(config.failure_policy, DetectionFailurePolicy::Abort);
        assert_eq!(config.max_frames, Some(100));
        assert!(SourceReference::parse(&cli.input).needs_resolution());
    }

    #[rstest]
    #[case(&["--detector", "pose"])]
    #[case(&["--confidence", "1.5"])]
    #[case(&["--tracking-confidence", "1.1"])]
    #[case(&["--max-hands", "0"])]
    #[case(&["--face-model", "medium"])]
    #[case(&["--read-timeout", "0"])]
    #[case(&["--max-frames", "0"])]
    #[case(&["--fps", "0"])]
    #[case(&["--on-detection-error", "retry"])]
    fn test_validate_rejects(#[case] args: &[&str]) {
        assert!(validate(&parse(args)).is_err());
    }

    #[test]
    fn test_face_model_selection() {
        assert_eq!(parse_face_model("short"), FaceModel::ShortRange);
        assert_eq!(parse_face_model("full"), FaceModel::FullRange);
    }
}
