//! Result presentation
//!
//! Turns a [`DecodeResult`] into what the user sees: the boundary drawn on
//! the canvas plus a [`Presentation`] handed to a [`Surface`].

pub mod terminal;

pub use terminal::TerminalSurface;

use crate::capture::DecodeResult;
use crate::render::{BoundaryStyle, Canvas};

pub const NOT_FOUND_MESSAGE: &str = "No QR code found in the image.";

/// What the result area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// Decoded text that is an absolute URL, shown as a link to itself
    Link { href: String },
    /// Decoded text shown verbatim
    Content(String),
    /// Status or error message
    Status(String),
}

impl Presentation {
    pub fn status(message: impl Into<String>) -> Self {
        Presentation::Status(message.into())
    }

    /// Classify decoded text as a link or plain content
    pub fn for_text(text: &str) -> Self {
        if is_valid_url(text) {
            Presentation::Link {
                href: text.to_string(),
            }
        } else {
            Presentation::Content(text.to_string())
        }
    }
}

/// Where presentations, busy state and control state are rendered
pub trait Surface {
    fn show(&mut self, presentation: &Presentation);

    /// Busy indicator for the duration of a decode attempt
    fn set_busy(&mut self, busy: bool);

    /// Name of the selected file, `None` when nothing is selected
    fn set_file_name(&mut self, name: Option<&str>);

    /// Camera running: capture enabled and the toggle stops the camera
    fn set_camera_active(&mut self, active: bool);
}

/// Whether `text` parses as an absolute URL
pub fn is_valid_url(text: &str) -> bool {
    url::Url::parse(text).is_ok()
}

/// Render `result`: boundary onto the canvas, then the text
pub fn present(result: &DecodeResult, canvas: &mut Canvas, style: &BoundaryStyle) -> Presentation {
    match result {
        DecodeResult::Found { text, corners } => {
            canvas.draw_boundary(corners, style);
            Presentation::for_text(text)
        }
        DecodeResult::NotFound => Presentation::status(NOT_FOUND_MESSAGE),
        DecodeResult::Error { message } => Presentation::status(message.clone()),
    }
}
