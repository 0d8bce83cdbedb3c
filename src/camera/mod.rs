//! Camera acquisition
//!
//! A [`VideoSource`] opens a [`FrameStream`]; the [`CameraController`] owns at
//! most one open stream at a time and moves it through the start/stop states.
//! Frames come from GStreamer in production and from in-memory sources in
//! tests.

pub mod device;
mod pipeline;
mod session;

use std::future::Future;

use crate::buffer::PixelBuffer;
use crate::config::{Facing, QrPeekConfig};
use crate::error::AcquisitionError;

pub use device::{CameraInfo, detect_cameras};
pub use pipeline::GstCamera;
pub use session::{CameraController, CameraPhase, Toggle};

/// What to ask the camera subsystem for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// Explicit device path or name; overrides `facing`
    pub device: Option<String>,
    pub facing: Facing,
    /// Preferred frame size; the device may deliver another
    pub width: u32,
    pub height: u32,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self::from(&QrPeekConfig::default())
    }
}

impl From<&QrPeekConfig> for StreamRequest {
    fn from(config: &QrPeekConfig) -> Self {
        Self {
            device: config.camera_device.clone(),
            facing: config.camera_facing,
            width: config.camera_width,
            height: config.camera_height,
        }
    }
}

/// Something that can open a live camera stream
pub trait VideoSource {
    type Stream: FrameStream;

    /// Resolves once the stream is producing frames
    fn open(
        &mut self,
        request: &StreamRequest,
    ) -> impl Future<Output = Result<Self::Stream, AcquisitionError>>;
}

/// An open camera stream
pub trait FrameStream {
    /// Rasterize the frame currently being delivered, at its actual size
    fn grab_frame(&mut self) -> Result<PixelBuffer, AcquisitionError>;

    /// Stop every track and release the device. Calling it again is a no-op.
    fn stop(&mut self);

    /// Human-readable device name for logs
    fn describe(&self) -> String;
}
