//! Decode pipeline controller
//!
//! Wires the user's actions to acquisition, decoding and presentation. Every
//! decode attempt shows the busy indicator, folds acquisition errors into the
//! result and hides the indicator before presenting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::buffer::PixelBuffer;
use crate::camera::{CameraController, CameraPhase, StreamRequest, Toggle, VideoSource};
use crate::capture::image::{acquire_from_file, display_name};
use crate::capture::{DecodeOptions, DecodeResult, decode};
use crate::config::QrPeekConfig;
use crate::error::AcquisitionError;
use crate::present::{Presentation, Surface, present};
use crate::render::{BoundaryStyle, Canvas};

pub const NO_FILE_MESSAGE: &str = "Please select an image file first.";
pub const CAMERA_STARTING_MESSAGE: &str = "Accessing camera...";
pub const CAMERA_ACTIVE_MESSAGE: &str =
    "Camera active. Position a QR code in view and run `capture`.";
pub const CAMERA_STOPPED_MESSAGE: &str = "Camera stopped.";

pub struct Controller<S: VideoSource, U: Surface> {
    options: DecodeOptions,
    style: BoundaryStyle,
    canvas: Canvas,
    surface: U,
    camera: CameraController<S>,
    selected: Option<PathBuf>,
}

impl<S: VideoSource, U: Surface> Controller<S, U> {
    pub fn new(config: &QrPeekConfig, source: S, surface: U) -> Self {
        let camera = CameraController::new(
            source,
            StreamRequest::from(config),
            config.camera_start_timeout_ms.map(Duration::from_millis),
        );
        Self {
            options: DecodeOptions {
                inversion: config.inversion,
            },
            style: BoundaryStyle::from(config),
            canvas: Canvas::placeholder(),
            surface,
            camera,
            selected: None,
        }
    }

    pub fn surface_mut(&mut self) -> &mut U {
        &mut self.surface
    }

    pub fn camera_phase(&self) -> CameraPhase {
        self.camera.phase()
    }

    /// Remember `path` as the current file and preview it; `None` clears it
    pub async fn select_file(&mut self, path: Option<PathBuf>) {
        self.selected = path;
        let Some(path) = self.selected.clone() else {
            self.surface.set_file_name(None);
            return;
        };

        self.surface.set_file_name(Some(&display_name(&path)));
        match acquire_from_file(&path).await {
            Ok(buffer) => self.canvas.show(&buffer),
            // Preview is best effort; decoding reports the error
            Err(err) => log::warn!("Preview of {} failed: {}", path.display(), err),
        }
    }

    /// Decode the selected file
    pub async fn decode_selected(&mut self) -> Option<DecodeResult> {
        let Some(path) = self.selected.clone() else {
            self.surface.show(&Presentation::status(NO_FILE_MESSAGE));
            return None;
        };
        Some(self.decode_file(&path).await)
    }

    /// Load `path`, decode it and present the result
    pub async fn decode_file(&mut self, path: &Path) -> DecodeResult {
        self.surface.set_busy(true);
        let acquired = acquire_from_file(path).await;
        self.finish_attempt(acquired)
    }

    /// Start the camera when idle, stop it when active
    ///
    /// The outcome is shown on the surface either way; a start failure is
    /// also returned for callers whose surface is quiet.
    pub async fn toggle_camera(&mut self) -> Result<Toggle, AcquisitionError> {
        if !self.camera.is_active() {
            self.surface.show(&Presentation::status(CAMERA_STARTING_MESSAGE));
        }
        let toggled = self.camera.toggle().await;
        match &toggled {
            Ok(Toggle::Started) => {
                self.surface.set_camera_active(true);
                self.surface.show(&Presentation::status(CAMERA_ACTIVE_MESSAGE));
            }
            Ok(Toggle::Stopped) => {
                self.surface.set_camera_active(false);
                self.surface.show(&Presentation::status(CAMERA_STOPPED_MESSAGE));
            }
            Err(err) => {
                self.surface.set_camera_active(false);
                self.surface.show(&Presentation::status(err.to_string()));
            }
        }
        toggled
    }

    /// Start the camera, decode one frame and stop again
    pub async fn capture_once(&mut self) -> DecodeResult {
        let result = match self.toggle_camera().await {
            Ok(_) => self.capture().unwrap_or_else(|| {
                AcquisitionError::DeviceUnavailable("camera is not active".to_string()).into()
            }),
            Err(err) => err.into(),
        };
        self.shutdown();
        result
    }

    /// Decode the current camera frame. Does nothing unless the camera is active.
    pub fn capture(&mut self) -> Option<DecodeResult> {
        if !self.camera.is_active() {
            log::debug!("Capture ignored: camera is not active");
            return None;
        }
        self.surface.set_busy(true);
        let acquired = match self.camera.capture() {
            Some(frame) => frame,
            None => Err(AcquisitionError::DeviceUnavailable(
                "camera is not active".to_string(),
            )),
        };
        Some(self.finish_attempt(acquired))
    }

    /// Stop everything owned by the controller
    pub fn shutdown(&mut self) {
        if self.camera.stop() {
            self.surface.set_camera_active(false);
        }
    }

    pub fn save_canvas(&self, path: &Path) -> anyhow::Result<()> {
        self.canvas.save_png(path)
    }

    /// Decode, hide the busy indicator, then present. Runs with the indicator shown.
    fn finish_attempt(&mut self, acquired: Result<PixelBuffer, AcquisitionError>) -> DecodeResult {
        let result = match acquired {
            Ok(buffer) => {
                self.canvas.show(&buffer);
                decode(&buffer, &self.options)
            }
            Err(err) => {
                log::error!("Acquisition failed: {}", err);
                err.into()
            }
        };
        self.surface.set_busy(false);

        let shown = present(&result, &mut self.canvas, &self.style);
        self.surface.show(&shown);
        result
    }
}
