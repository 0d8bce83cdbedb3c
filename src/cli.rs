//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::capture::InversionPolicy;
use crate::config::{Facing, QrPeekConfig};

/// Decode QR codes from image files or a live camera feed.
///
/// Without a subcommand, starts an interactive session.
#[derive(Parser, Debug)]
#[command(name = "qrpeek", version, about)]
pub struct Cli {
    /// Which polarities to try when decoding
    #[arg(long, value_enum, global = true)]
    pub inversion: Option<InversionPolicy>,

    /// Camera device path or name (e.g. /dev/video2)
    #[arg(long, value_name = "DEVICE", global = true)]
    pub device: Option<String>,

    /// Preferred camera direction
    #[arg(long, value_enum, global = true)]
    pub facing: Option<Facing>,

    /// Give up if the camera has not started after this many milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub camera_timeout: Option<u64>,

    /// Print URLs as plain text instead of terminal hyperlinks
    #[arg(long, global = true)]
    pub no_hyperlinks: bool,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Decode a QR code from an image file
    Decode {
        file: PathBuf,
        /// Save the image with the detected boundary drawn on it
        #[arg(long, value_name = "PNG")]
        annotate: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render an image file without decoding it
    Preview {
        file: PathBuf,
        #[arg(long, value_name = "PNG")]
        out: PathBuf,
    },
    /// Start the camera, decode one frame and stop
    Camera {
        #[arg(long, value_name = "PNG")]
        annotate: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List available cameras
    Devices,
}

impl Cli {
    /// Overlay command-line settings on `config`
    pub fn apply(&self, config: &mut QrPeekConfig) {
        if let Some(inversion) = self.inversion {
            config.inversion = inversion;
        }
        if let Some(device) = &self.device {
            config.camera_device = Some(device.clone());
        }
        if let Some(facing) = self.facing {
            config.camera_facing = facing;
        }
        if let Some(ms) = self.camera_timeout {
            config.camera_start_timeout_ms = Some(ms);
        }
        if self.no_hyperlinks {
            config.hyperlinks = false;
        }
    }
}
