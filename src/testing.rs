//! Shared fixtures for unit tests

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use image::{Rgba, RgbaImage};

use crate::buffer::PixelBuffer;
use crate::camera::{FrameStream, StreamRequest, VideoSource};
use crate::error::AcquisitionError;

const MODULE_PX: usize = 8;
const QUIET_ZONE: usize = 4;

/// Pixel extent of a rendered symbol (excluding the quiet zone)
#[derive(Clone, Copy, Debug)]
pub struct SymbolRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl SymbolRect {
    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) as f32 / 2.0,
            (self.top + self.bottom) as f32 / 2.0,
        )
    }
}

pub fn qr_image(payload: &str, dark: [u8; 4], light: [u8; 4]) -> (RgbaImage, SymbolRect) {
    let code = qrcode::QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width();
    let side = ((modules + QUIET_ZONE * 2) * MODULE_PX) as u32;

    let mut img = RgbaImage::from_pixel(side, side, Rgba(light));
    for my in 0..modules {
        for mx in 0..modules {
            if code[(mx, my)] != qrcode::Color::Dark {
                continue;
            }
            let x0 = ((mx + QUIET_ZONE) * MODULE_PX) as u32;
            let y0 = ((my + QUIET_ZONE) * MODULE_PX) as u32;
            for y in y0..y0 + MODULE_PX as u32 {
                for x in x0..x0 + MODULE_PX as u32 {
                    img.put_pixel(x, y, Rgba(dark));
                }
            }
        }
    }

    let start = (QUIET_ZONE * MODULE_PX) as i32;
    let end = ((QUIET_ZONE + modules) * MODULE_PX) as i32;
    let rect = SymbolRect {
        left: start,
        top: start,
        right: end,
        bottom: end,
    };
    (img, rect)
}

/// Dark-on-light symbol encoding `payload`
pub fn qr_buffer(payload: &str) -> (PixelBuffer, SymbolRect) {
    let (img, rect) = qr_image(payload, [0, 0, 0, 255], [255, 255, 255, 255]);
    (PixelBuffer::try_from(img).expect("valid image"), rect)
}

/// Light-on-dark symbol encoding `payload`
pub fn inverted_qr_buffer(payload: &str) -> PixelBuffer {
    let (img, _) = qr_image(payload, [255, 255, 255, 255], [0, 0, 0, 255]);
    PixelBuffer::try_from(img).expect("valid image")
}

pub fn blank_buffer(width: u32, height: u32) -> PixelBuffer {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    PixelBuffer::try_from(img).expect("valid image")
}

/// Write a dark-on-light symbol to `path` as PNG
pub fn write_qr_png(path: &Path, payload: &str) {
    let (img, _) = qr_image(payload, [0, 0, 0, 255], [255, 255, 255, 255]);
    img.save(path).expect("fixture written");
}

/// In-memory camera; counts streams that are open and not yet stopped
#[derive(Clone, Default)]
pub struct FakeSource {
    pub live: Rc<Cell<usize>>,
    pub opened: Rc<Cell<usize>>,
    pub fail_with: Option<AcquisitionError>,
    pub hang: bool,
    pub frame: Option<PixelBuffer>,
    /// Every frame grab on opened streams fails with this
    pub fail_frames: Option<AcquisitionError>,
}

pub struct FakeStream {
    live: Rc<Cell<usize>>,
    stopped: bool,
    frame: PixelBuffer,
    fail_frames: Option<AcquisitionError>,
}

impl VideoSource for FakeSource {
    type Stream = FakeStream;

    async fn open(&mut self, _request: &StreamRequest) -> Result<FakeStream, AcquisitionError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.opened.set(self.opened.get() + 1);
        self.live.set(self.live.get() + 1);
        Ok(FakeStream {
            live: self.live.clone(),
            stopped: false,
            frame: self.frame.clone().unwrap_or_else(|| blank_buffer(640, 480)),
            fail_frames: self.fail_frames.clone(),
        })
    }
}

impl FrameStream for FakeStream {
    fn grab_frame(&mut self) -> Result<PixelBuffer, AcquisitionError> {
        match &self.fail_frames {
            Some(err) => Err(err.clone()),
            None => Ok(self.frame.clone()),
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.set(self.live.get() - 1);
        }
    }

    fn describe(&self) -> String {
        "fake camera".to_string()
    }
}
