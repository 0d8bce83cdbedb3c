//! GStreamer capture pipeline
//!
//! `<camera source> ! capsfilter ! videoconvert ! appsink(RGBA)`. The sink
//! keeps only the newest frame, so a capture always sees the current image.

use futures::{FutureExt, StreamExt};
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;

use super::device::{Camera, detect_cameras, select_camera};
use super::{FrameStream, StreamRequest, VideoSource};
use crate::buffer::PixelBuffer;
use crate::error::AcquisitionError;

const PIPELINE_NAME: &str = "qrpeek-camera";

/// Upper bound on waiting for the next frame once the stream is live
const FRAME_WAIT_SECS: u64 = 5;

/// Opens cameras through GStreamer
#[derive(Debug, Default)]
pub struct GstCamera;

impl GstCamera {
    pub fn new() -> Self {
        Self
    }
}

impl VideoSource for GstCamera {
    type Stream = GstStream;

    async fn open(&mut self, request: &StreamRequest) -> Result<GstStream, AcquisitionError> {
        let cameras = detect_cameras()
            .map_err(|err| AcquisitionError::DeviceUnavailable(format!("{:#}", err)))?;
        let infos: Vec<_> = cameras.iter().map(|c| c.info.clone()).collect();

        let index = select_camera(&infos, request).ok_or_else(|| match &request.device {
            Some(wanted) => AcquisitionError::DeviceUnavailable(format!(
                "camera '{}' not found",
                wanted
            )),
            None => AcquisitionError::DeviceUnavailable("no camera found".to_string()),
        })?;

        let camera = &cameras[index];
        log::info!(
            "Starting camera {} at preferred {}x{}",
            camera.info.display_name(),
            request.width,
            request.height
        );

        let stream = GstStream::new(camera, request)?;
        stream.play().await?;
        log::info!("Camera stream playing");
        Ok(stream)
    }
}

/// A playing camera pipeline
pub struct GstStream {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    device_name: String,
    stopped: bool,
}

impl GstStream {
    fn new(camera: &Camera, request: &StreamRequest) -> Result<Self, AcquisitionError> {
        let unavailable = |what: &str, err: glib::BoolError| {
            AcquisitionError::DeviceUnavailable(format!("{}: {}", what, err))
        };

        let pipeline = gst::Pipeline::with_name(PIPELINE_NAME);

        let source = camera
            .device
            .create_element(Some("camera-source"))
            .map_err(|e| unavailable("Failed to create camera source", e))?;

        let capsfilter = gst::ElementFactory::make("capsfilter")
            .name("camera-caps")
            .property("caps", preferred_caps(request.width, request.height))
            .build()
            .map_err(|e| unavailable("Failed to create capsfilter element", e))?;

        let videoconvert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| unavailable("Failed to create videoconvert element", e))?;

        let appsink = gst_app::AppSink::builder()
            .name("frame-sink")
            .caps(
                &gst::Caps::builder("video/x-raw")
                    .field("format", "RGBA")
                    .build(),
            )
            .max_buffers(1)
            .drop(true)
            .build();

        pipeline
            .add_many([&source, &capsfilter, &videoconvert, appsink.upcast_ref()])
            .map_err(|e| unavailable("Failed to assemble camera pipeline", e))?;
        gst::Element::link_many([&source, &capsfilter, &videoconvert, appsink.upcast_ref()])
            .map_err(|e| unavailable("Failed to link camera pipeline", e))?;

        Ok(Self {
            pipeline,
            appsink,
            device_name: camera.info.display_name(),
            stopped: false,
        })
    }

    /// Set the pipeline playing and wait until it is
    async fn play(&self) -> Result<(), AcquisitionError> {
        let bus = self.pipeline.bus().ok_or_else(|| {
            AcquisitionError::DeviceUnavailable("camera pipeline has no bus".to_string())
        })?;
        let mut messages = bus.stream();

        if let Err(err) = self.pipeline.set_state(gst::State::Playing) {
            log::debug!("Camera pipeline refused to play: {}", err);
            // Details, if any, were posted to the bus already
            while let Some(Some(msg)) = messages.next().now_or_never() {
                if let gst::MessageView::Error(err) = msg.view() {
                    return Err(classify_error(&err.error(), err.debug().as_deref()));
                }
            }
            return Err(AcquisitionError::DeviceUnavailable(
                "Failed to start camera stream".to_string(),
            ));
        }

        while let Some(msg) = messages.next().await {
            use gst::MessageView;
            match msg.view() {
                MessageView::Error(err) => {
                    return Err(classify_error(&err.error(), err.debug().as_deref()));
                }
                MessageView::Eos(..) => {
                    return Err(AcquisitionError::DeviceUnavailable(
                        "camera stream ended before it started".to_string(),
                    ));
                }
                MessageView::StateChanged(state_change) => {
                    let from_pipeline = msg
                        .src()
                        .map(|s| s.name().as_str() == PIPELINE_NAME)
                        .unwrap_or(false);
                    if from_pipeline {
                        log::debug!(
                            "Camera pipeline state changed: {:?} -> {:?}",
                            state_change.old(),
                            state_change.current()
                        );
                        if state_change.current() == gst::State::Playing {
                            return Ok(());
                        }
                    }
                }
                _ => {}
            }
        }

        Err(AcquisitionError::DeviceUnavailable(
            "camera pipeline closed unexpectedly".to_string(),
        ))
    }
}

impl FrameStream for GstStream {
    fn grab_frame(&mut self) -> Result<PixelBuffer, AcquisitionError> {
        if self.stopped {
            return Err(AcquisitionError::DeviceUnavailable(
                "camera is stopped".to_string(),
            ));
        }

        let failure = |msg: &str| AcquisitionError::DecodeFailure(msg.to_string());

        let sample = require_sample(
            self.appsink
                .try_pull_sample(gst::ClockTime::from_seconds(FRAME_WAIT_SECS)),
        )?;
        let caps = sample.caps().ok_or_else(|| failure("camera frame has no caps"))?;
        let info = gst_video::VideoInfo::from_caps(caps)
            .map_err(|e| AcquisitionError::DecodeFailure(format!("unreadable frame format: {}", e)))?;
        let buffer = sample
            .buffer()
            .ok_or_else(|| failure("camera frame has no data"))?;
        let map = buffer
            .map_readable()
            .map_err(|e| AcquisitionError::DecodeFailure(format!("failed to map frame: {}", e)))?;

        let stride = usize::try_from(info.stride()[0])
            .map_err(|_| failure("negative frame stride"))?;
        log::info!(
            "Captured {}x{} frame from {}",
            info.width(),
            info.height(),
            self.device_name
        );
        PixelBuffer::from_strided(info.width(), info.height(), stride, map.as_slice())
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(err) = self.pipeline.set_state(gst::State::Null) {
            log::error!("Failed to stop camera pipeline: {}", err);
        }
        log::info!("Camera {} stopped", self.device_name);
    }

    fn describe(&self) -> String {
        self.device_name.clone()
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A missing sample means the stream timed out or ended, not that decoding failed
fn require_sample(sample: Option<gst::Sample>) -> Result<gst::Sample, AcquisitionError> {
    sample.ok_or_else(|| {
        AcquisitionError::DeviceUnavailable(format!(
            "no frame from camera within {} s",
            FRAME_WAIT_SECS
        ))
    })
}

/// Ask for the preferred size first, then accept whatever raw video the device offers
pub fn preferred_caps(width: u32, height: u32) -> gst::Caps {
    let ideal = gst::Structure::builder("video/x-raw")
        .field("width", width as i32)
        .field("height", height as i32)
        .build();
    gst::Caps::builder_full()
        .structure(ideal)
        .structure(gst::Structure::new_empty("video/x-raw"))
        .build()
}

/// Map a pipeline error onto the acquisition taxonomy
pub fn classify_error(error: &glib::Error, debug: Option<&str>) -> AcquisitionError {
    let message = error.message().to_string();
    let mentions_denied = |text: &str| text.to_lowercase().contains("permission denied");

    let denied = matches!(
        error.kind::<gst::ResourceError>(),
        Some(gst::ResourceError::NotAuthorized)
    ) || mentions_denied(&message)
        || debug.map(mentions_denied).unwrap_or(false);

    if denied {
        AcquisitionError::PermissionDenied(message)
    } else {
        AcquisitionError::DeviceUnavailable(message)
    }
}
