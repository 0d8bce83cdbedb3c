//! Camera device discovery and selection
//!
//! Queries GStreamer's device monitor for video sources and picks the one
//! matching the requested device or facing direction.

use anyhow::{Context, Result};
use gstreamer as gst;
use gstreamer::prelude::*;

use super::StreamRequest;
use crate::config::Facing;

/// Information about an available camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// Human-readable name (e.g., "Integrated Camera")
    pub name: String,
    /// Device node when the provider exposes one (e.g., "/dev/video0")
    pub path: Option<String>,
    /// Mounting direction when the provider reports it
    pub facing: Option<Facing>,
}

impl CameraInfo {
    /// Display name with device path and facing indicator
    pub fn display_name(&self) -> String {
        let mut label = self.name.clone();
        if let Some(path) = &self.path {
            label.push_str(&format!(" ({})", path));
        }
        match self.facing {
            Some(Facing::Environment) => label.push_str(" [rear]"),
            Some(Facing::User) => label.push_str(" [front]"),
            _ => {}
        }
        label
    }

    fn matches(&self, wanted: &str) -> bool {
        self.path.as_deref() == Some(wanted) || self.name.eq_ignore_ascii_case(wanted)
    }
}

/// A discovered camera together with the GStreamer handle that opens it
#[derive(Debug, Clone)]
pub struct Camera {
    pub info: CameraInfo,
    pub device: gst::Device,
}

/// Detect available video capture devices
pub fn detect_cameras() -> Result<Vec<Camera>> {
    gst::init().context("Failed to initialize GStreamer")?;

    let monitor = gst::DeviceMonitor::new();
    monitor.add_filter(Some("Video/Source"), None);
    monitor
        .start()
        .context("Failed to start GStreamer device monitor")?;
    let devices = monitor.devices();
    monitor.stop();

    let cameras: Vec<Camera> = devices
        .into_iter()
        .map(|device| {
            let props = device.properties();
            let path = props.as_ref().and_then(|p| {
                ["device.path", "api.v4l2.path", "object.path"]
                    .iter()
                    .find_map(|key| p.get::<String>(*key).ok())
            });
            let location = props
                .as_ref()
                .and_then(|p| p.get::<String>("api.libcamera.location").ok());
            let name = device.display_name().to_string();
            let facing = guess_facing(&name, location.as_deref());
            Camera {
                info: CameraInfo { name, path, facing },
                device,
            }
        })
        .collect();

    log::info!(
        "Available cameras: {:?}",
        cameras.iter().map(|c| c.info.display_name()).collect::<Vec<_>>()
    );

    Ok(cameras)
}

/// Work out which way a camera faces from its reported location or name
pub fn guess_facing(name: &str, location: Option<&str>) -> Option<Facing> {
    match location {
        Some("back") => return Some(Facing::Environment),
        Some("front") => return Some(Facing::User),
        _ => {}
    }

    let name = name.to_lowercase();
    if ["rear", "back", "world", "environment"]
        .iter()
        .any(|w| name.contains(w))
    {
        Some(Facing::Environment)
    } else if ["front", "user", "facetime", "selfie"]
        .iter()
        .any(|w| name.contains(w))
    {
        Some(Facing::User)
    } else {
        None
    }
}

/// Index of the camera satisfying `request`
///
/// An explicit device must match by path or name. Otherwise a camera facing
/// the preferred direction wins, falling back to the first one.
pub fn select_camera(cameras: &[CameraInfo], request: &StreamRequest) -> Option<usize> {
    if let Some(wanted) = &request.device {
        return cameras.iter().position(|c| c.matches(wanted));
    }

    let preferred = match request.facing {
        Facing::Any => None,
        facing => cameras.iter().position(|c| c.facing == Some(facing)),
    };
    preferred.or(if cameras.is_empty() { None } else { Some(0) })
}
