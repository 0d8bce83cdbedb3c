//! The display canvas: the image currently shown to the user

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use super::image::{BoundaryStyle, draw_boundary_on_image};
use crate::buffer::PixelBuffer;
use crate::domain::Corners;

pub const PLACEHOLDER_SIZE: (u32, u32) = (400, 300);
const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0xF5, 0xF5, 0xF5, 255]);

/// Drawing surface that previews images and carries the detected boundary
#[derive(Clone, Debug)]
pub struct Canvas {
    image: RgbaImage,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl Canvas {
    /// Blank surface shown before anything has been loaded
    pub fn placeholder() -> Self {
        let (w, h) = PLACEHOLDER_SIZE;
        Self {
            image: RgbaImage::from_pixel(w, h, PLACEHOLDER_FILL),
        }
    }

    /// Resize to the buffer and draw it
    pub fn show(&mut self, buffer: &PixelBuffer) {
        self.image = buffer.to_image();
    }

    pub fn draw_boundary(&mut self, corners: &Corners, style: &BoundaryStyle) {
        draw_boundary_on_image(&mut self.image, corners, style);
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Write the canvas to `path` as PNG, replacing any existing file atomically
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::Builder::new()
            .prefix(".qrpeek-")
            .suffix(".png")
            .tempfile_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        write_png(&mut file, &self.image)?;
        file.persist(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Canvas saved to {}", path.display());
        Ok(())
    }

    /// Timestamped file name in the user's pictures directory
    pub fn default_save_path() -> Option<PathBuf> {
        let mut path =
            dirs::picture_dir().or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))?;
        let name = chrono::Local::now()
            .format("qrpeek_%Y-%m-%d_%H-%M-%S.png")
            .to_string();
        path.push(name);
        Some(path)
    }
}

fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}
