use std::path::Path;

use crate::shared::frame::{ChannelOrder, Frame};
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// The format follows the file extension. BGR frames are swapped to RGB
/// before encoding.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("expected 3 channels, got {}", frame.channels()).into());
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let rgb = frame.to_channel_order(ChannelOrder::Rgb);
        let img = image::RgbImage::from_raw(rgb.width(), rgb.height(), rgb.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        img.save(path)?;
        Ok(())
    }
}
