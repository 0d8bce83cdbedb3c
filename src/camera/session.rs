//! Camera lifecycle state machine
//!
//! ```text
//! Idle ──start──▶ Starting ──playing──▶ Active ──stop──▶ Stopping ──▶ Idle
//!                    │
//!                    └──error──▶ Idle
//! ```
//!
//! The controller is the only owner of the capture session. Dropping the
//! controller stops the camera.

use std::time::{Duration, Instant};

use super::{FrameStream, StreamRequest, VideoSource};
use crate::buffer::PixelBuffer;
use crate::error::AcquisitionError;

/// Externally visible camera state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPhase {
    Idle,
    Starting,
    Active,
    Stopping,
}

/// What a toggle request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Started,
    Stopped,
}

/// Live handle to an open camera stream
pub struct CaptureSession<T: FrameStream> {
    stream: T,
    started_at: Instant,
    captures: u32,
}

impl<T: FrameStream> CaptureSession<T> {
    fn new(stream: T) -> Self {
        Self {
            stream,
            started_at: Instant::now(),
            captures: 0,
        }
    }

    fn grab_frame(&mut self) -> Result<PixelBuffer, AcquisitionError> {
        self.captures += 1;
        self.stream.grab_frame()
    }

    fn stop(mut self) {
        log::info!(
            "Closing capture session on {} after {:.1}s ({} capture(s))",
            self.stream.describe(),
            self.started_at.elapsed().as_secs_f32(),
            self.captures
        );
        self.stream.stop();
    }
}

impl<T: FrameStream> Drop for CaptureSession<T> {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

enum CameraState<T: FrameStream> {
    Idle,
    Starting,
    Active(CaptureSession<T>),
    Stopping,
}

/// Owns the camera and at most one capture session
pub struct CameraController<S: VideoSource> {
    source: S,
    request: StreamRequest,
    start_timeout: Option<Duration>,
    state: CameraState<S::Stream>,
}

impl<S: VideoSource> CameraController<S> {
    pub fn new(source: S, request: StreamRequest, start_timeout: Option<Duration>) -> Self {
        Self {
            source,
            request,
            start_timeout,
            state: CameraState::Idle,
        }
    }

    pub fn phase(&self) -> CameraPhase {
        match self.state {
            CameraState::Idle => CameraPhase::Idle,
            CameraState::Starting => CameraPhase::Starting,
            CameraState::Active(_) => CameraPhase::Active,
            CameraState::Stopping => CameraPhase::Stopping,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() == CameraPhase::Active
    }

    /// Open the camera. A no-op when a session is already active.
    pub async fn start(&mut self) -> Result<(), AcquisitionError> {
        if !matches!(self.state, CameraState::Idle) {
            return Ok(());
        }
        self.state = CameraState::Starting;

        let opened = match self.start_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.open(&self.request))
                .await
                .unwrap_or_else(|_| {
                    Err(AcquisitionError::DeviceUnavailable(format!(
                        "camera did not start within {} ms",
                        limit.as_millis()
                    )))
                }),
            None => self.source.open(&self.request).await,
        };

        match opened {
            Ok(stream) => {
                self.state = CameraState::Active(CaptureSession::new(stream));
                Ok(())
            }
            Err(err) => {
                log::error!("Camera failed to start: {}", err);
                self.state = CameraState::Idle;
                Err(err)
            }
        }
    }

    /// Stop the camera; returns whether a session was running
    pub fn stop(&mut self) -> bool {
        match std::mem::replace(&mut self.state, CameraState::Stopping) {
            CameraState::Active(session) => {
                session.stop();
                self.state = CameraState::Idle;
                true
            }
            _ => {
                self.state = CameraState::Idle;
                false
            }
        }
    }

    /// Start when idle, stop when active
    pub async fn toggle(&mut self) -> Result<Toggle, AcquisitionError> {
        if self.stop() {
            Ok(Toggle::Stopped)
        } else {
            self.start().await.map(|_| Toggle::Started)
        }
    }

    /// Rasterize the current frame; `None` unless a session is active
    pub fn capture(&mut self) -> Option<Result<PixelBuffer, AcquisitionError>> {
        match &mut self.state {
            CameraState::Active(session) => Some(session.grab_frame()),
            _ => None,
        }
    }
}

impl<S: VideoSource> Drop for CameraController<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
