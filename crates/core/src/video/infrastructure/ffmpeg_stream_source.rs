use std::time::Duration;

use crate::shared::frame::{ChannelOrder, Frame};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::source_reference::SourceReference;
use crate::video::domain::stream_source::{SourceError, StreamSource};

/// Decodes frames from files and network streams via ffmpeg-next.
///
/// Every decoded frame is converted to packed RGB24 and wrapped in a
/// [`Frame`], turned upright when the container carries a rotation. Frames
/// are pulled one at a time; nothing is buffered beyond what the decoder
/// itself holds.
pub struct FfmpegStreamSource {
    read_timeout: Option<Duration>,
    stream: Option<OpenStream>,
}

struct OpenStream {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    rotation: i32,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegStreamSource {
    pub fn new() -> Self {
        Self {
            read_timeout: None,
            stream: None,
        }
    }

    /// Bounds how long a single network read may block. Ignored for files.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}

impl Default for FfmpegStreamSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSource for FfmpegStreamSource {
    fn open(&mut self, reference: &SourceReference) -> Result<VideoMetadata, SourceError> {
        self.close();
        ffmpeg_next::init().map_err(|e| SourceError::unavailable(reference, e))?;

        let input = match reference {
            SourceReference::File(path) => {
                if !path.exists() {
                    return Err(SourceError::unavailable(reference, "file not found"));
                }
                ffmpeg_next::format::input(path)
            }
            SourceReference::Remote(url) | SourceReference::YouTube(url) => {
                match rw_timeout_micros(reference, self.read_timeout) {
                    Some(micros) => {
                        let mut options = ffmpeg_next::Dictionary::new();
                        options.set("rw_timeout", &micros);
                        ffmpeg_next::format::input_with_dictionary(url, options)
                    }
                    None => ffmpeg_next::format::input(url),
                }
            }
        }
        .map_err(|e| SourceError::unavailable(reference, e))?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| SourceError::unavailable(reference, "no video stream found"))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| SourceError::unavailable(reference, e))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| SourceError::unavailable(reference, e))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(SourceError::unavailable(
                reference,
                "video stream reports zero dimensions",
            ));
        }

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let rotation = extract_rotation(&stream);
        let (display_width, display_height) = if rotation == 90 || rotation == 270 {
            (height, width)
        } else {
            (width, height)
        };

        let metadata = VideoMetadata {
            width: display_width,
            height: display_height,
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: reference.to_string(),
            rotation,
        };

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| SourceError::unavailable(reference, e))?;

        log::debug!(
            "Opened {} ({}x{} @ {:.2} fps, codec {}, rotation {})",
            metadata.source,
            width,
            height,
            fps,
            metadata.codec,
            rotation
        );

        self.stream = Some(OpenStream {
            input,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            rotation,
            frame_index: 0,
            flushing: false,
            done: false,
        });

        Ok(metadata)
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        match self.stream.as_mut() {
            Some(stream) => stream.next_frame(),
            None => Err(SourceError::NotOpen),
        }
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

impl OpenStream {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Eof) => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                    if let Some(frame) = self.try_receive()? {
                        return Ok(Some(frame));
                    }
                    self.done = true;
                    return Ok(None);
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {
                    continue;
                }
                Err(e) => {
                    self.done = true;
                    return Err(SourceError::ReadFailure(e.to_string()));
                }
            }

            if packet.stream() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }

            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, SourceError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| SourceError::ReadFailure(e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let mut frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index)
            .with_channel_order(ChannelOrder::Rgb);
        if self.rotation != 0 {
            frame = frame.rotated_clockwise(self.rotation);
        }
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

/// ffmpeg's `rw_timeout` value (microseconds) for network references.
fn rw_timeout_micros(reference: &SourceReference, timeout: Option<Duration>) -> Option<String> {
    if !reference.is_remote() {
        return None;
    }
    timeout.map(|t| t.as_micros().max(1).to_string())
}

/// Clockwise rotation needed to show the stream upright: the display matrix
/// side data if present, otherwise the legacy `rotate` tag.
fn extract_rotation(stream: &ffmpeg_next::format::stream::Stream) -> i32 {
    for side_data in stream.side_data() {
        if side_data.kind() == ffmpeg_next::codec::packet::side_data::Type::DisplayMatrix {
            if let Some(angle) = parse_display_matrix(side_data.data()) {
                return normalize_rotation(angle);
            }
        }
    }

    stream
        .metadata()
        .get("rotate")
        .and_then(|tag| tag.trim().parse::<i32>().ok())
        .map(normalize_rotation)
        .unwrap_or(0)
}

/// Reads the clockwise rotation in degrees from a 3x3 display matrix
/// (nine little-endian i32 values, 16.16 fixed point).
fn parse_display_matrix(data: &[u8]) -> Option<i32> {
    if data.len() < 36 {
        return None;
    }
    let a = i32::from_le_bytes(data[0..4].try_into().ok()?) as f64;
    let b = i32::from_le_bytes(data[4..8].try_into().ok()?) as f64;
    if a == 0.0 && b == 0.0 {
        return None;
    }
    Some(b.atan2(a).to_degrees().round() as i32)
}

/// Snaps an angle to the nearest of 0, 90, 180 or 270.
fn normalize_rotation(angle: i32) -> i32 {
    match angle.rem_euclid(360) {
        45..=134 => 90,
        135..=224 => 180,
        225..=315 => 270,
        _ => 0,
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping the per-row padding (stride > width * 3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        let drain = |encoder: &mut ffmpeg_next::encoder::Video,
                         octx: &mut ffmpeg_next::format::context::Output| {
            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(octx).unwrap();
            }
        };

        for i in 0..num_frames {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
            );
            let stride = rgb_frame.stride(0);
            let value = ((i * 40) % 256) as u8;
            let data = rgb_frame.data_mut(0);
            for row in 0..height as usize {
                let start = row * stride;
                data[start..start + width as usize * 3].fill(value);
            }

            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));
            encoder.send_frame(&yuv_frame).unwrap();
            drain(&mut encoder, &mut octx);
        }

        encoder.send_eof().unwrap();
        drain(&mut encoder, &mut octx);
        octx.write_trailer().unwrap();
    }

    fn test_video(dir: &Path, frames: usize) -> PathBuf {
        let path = dir.join("clip.mp4");
        create_test_video(&path, frames, 160, 120, 30);
        path
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut source = FfmpegStreamSource::new();
        let meta = source.open(&SourceReference::File(path.clone())).unwrap();
        assert_eq!(meta.width, 160);
        assert_eq!(meta.height, 120);
        assert!(meta.fps > 0.0);
        assert_eq!(meta.source, path.display().to_string());
    }

    #[test]
    fn test_first_read_has_expected_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 3);

        let mut source = FfmpegStreamSource::new();
        source.open(&SourceReference::File(path)).unwrap();
        let frame = source.read().unwrap().expect("first frame");
        assert_eq!(frame.width(), 160);
        assert_eq!(frame.height(), 120);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.channel_order(), ChannelOrder::Rgb);
        assert_eq!(frame.data().len(), 160 * 120 * 3);
        assert_eq!(frame.index(), 0);
    }

    #[test]
    fn test_reads_every_frame_then_end_of_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut source = FfmpegStreamSource::new();
        source.open(&SourceReference::File(path)).unwrap();

        let mut indices = Vec::new();
        while let Some(frame) = source.read().unwrap() {
            indices.push(frame.index());
        }
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        // Exhausted streams keep reporting end-of-stream.
        assert!(source.read().unwrap().is_none());
    }

    #[test]
    fn test_open_missing_file_is_unavailable() {
        let mut source = FfmpegStreamSource::new();
        let err = source
            .open(&SourceReference::File(PathBuf::from("/nonexistent/face.mp4")))
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }), "{err:?}");
    }

    #[test]
    fn test_open_garbage_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_video.mp4");
        std::fs::write(&path, b"definitely not a video").unwrap();

        let mut source = FfmpegStreamSource::new();
        let err = source.open(&SourceReference::File(path)).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }), "{err:?}");
    }

    #[test]
    fn test_read_before_open_is_an_error() {
        let mut source = FfmpegStreamSource::new();
        assert!(matches!(source.read(), Err(SourceError::NotOpen)));
    }

    #[test]
    fn test_read_after_close_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 2);

        let mut source = FfmpegStreamSource::new();
        source.open(&SourceReference::File(path)).unwrap();
        source.close();
        assert!(matches!(source.read(), Err(SourceError::NotOpen)));
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);

        let mut source = FfmpegStreamSource::new();
        source.open(&SourceReference::File(path)).unwrap();
        source.close();
        source.close();
    }

    fn display_matrix(a: i32, b: i32, c: i32, d: i32) -> Vec<u8> {
        [a, b, 0, c, d, 0, 0, 0, 1 << 30]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    #[test]
    fn test_display_matrix_rotation() {
        const ONE: i32 = 1 << 16;
        assert_eq!(parse_display_matrix(&display_matrix(ONE, 0, 0, ONE)), Some(0));
        // Portrait phone recording: stored landscape, shown turned a quarter clockwise.
        assert_eq!(parse_display_matrix(&display_matrix(0, ONE, -ONE, 0)), Some(90));
        assert_eq!(
            parse_display_matrix(&display_matrix(-ONE, 0, 0, -ONE)),
            Some(180)
        );
        assert_eq!(
            parse_display_matrix(&display_matrix(0, -ONE, ONE, 0)).map(normalize_rotation),
            Some(270)
        );
    }

    #[test]
    fn test_display_matrix_too_short_or_degenerate() {
        assert_eq!(parse_display_matrix(&[0u8; 20]), None);
        assert_eq!(parse_display_matrix(&display_matrix(0, 0, 0, 0)), None);
    }

    #[test]
    fn test_normalize_rotation_snaps_to_quarter_turns() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(93), 90);
        assert_eq!(normalize_rotation(180), 180);
        assert_eq!(normalize_rotation(-180), 180);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(350), 0);
    }

    #[test]
    fn test_unrotated_clip_reports_zero_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);

        let mut source = FfmpegStreamSource::new();
        let meta = source.open(&SourceReference::File(path)).unwrap();
        assert_eq!(meta.rotation, 0);
    }

    #[test]
    fn test_rw_timeout_only_applies_to_remote_references() {
        let timeout = Some(Duration::from_millis(1500));
        let remote = SourceReference::Remote("rtsp://cam/stream".to_string());
        let file = SourceReference::File(PathBuf::from("face.mp4"));

        assert_eq!(
            rw_timeout_micros(&remote, timeout),
            Some("1500000".to_string())
        );
        assert_eq!(rw_timeout_micros(&file, timeout), None);
        assert_eq!(rw_timeout_micros(&remote, None), None);
    }
}
