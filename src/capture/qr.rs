//! QR code decoding using rqrr
//!
//! The decoder is a black box: one synchronous call per pixel buffer, no
//! retries. Only the inversion policy is under our control.

use clap::ValueEnum;
use rqrr::PreparedImage;
use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::domain::{Corners, Point};
use crate::error::AcquisitionError;

/// Which luminance polarities are handed to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InversionPolicy {
    /// Only dark-on-light, as provided
    #[default]
    DontInvert,
    /// Only light-on-dark
    OnlyInvert,
    /// As provided, then inverted
    AttemptBoth,
    /// Inverted, then as provided
    InvertFirst,
}

impl InversionPolicy {
    /// Polarity passes in the order they are attempted (`true` = inverted)
    fn passes(self) -> &'static [bool] {
        match self {
            InversionPolicy::DontInvert => &[false],
            InversionPolicy::OnlyInvert => &[true],
            InversionPolicy::AttemptBoth => &[false, true],
            InversionPolicy::InvertFirst => &[true, false],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub inversion: InversionPolicy,
}

/// Outcome of one decode attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecodeResult {
    Found { text: String, corners: Corners },
    NotFound,
    Error { message: String },
}

impl From<AcquisitionError> for DecodeResult {
    fn from(err: AcquisitionError) -> Self {
        DecodeResult::Error {
            message: err.to_string(),
        }
    }
}

/// Decode the first QR symbol found in `buffer`
pub fn decode(buffer: &PixelBuffer, options: &DecodeOptions) -> DecodeResult {
    log::info!(
        "Decoding {}x{} buffer ({:?})",
        buffer.width(),
        buffer.height(),
        options.inversion
    );

    for &inverted in options.inversion.passes() {
        if let Some((text, corners)) = scan(buffer, inverted) {
            log::info!("QR code found (inverted={}): {} bytes", inverted, text.len());
            return DecodeResult::Found { text, corners };
        }
    }

    log::info!("No QR code found");
    DecodeResult::NotFound
}

fn scan(buffer: &PixelBuffer, inverted: bool) -> Option<(String, Corners)> {
    let mut prepared = PreparedImage::prepare_from_greyscale(
        buffer.width() as usize,
        buffer.height() as usize,
        |x, y| {
            let l = buffer.luma(x as u32, y as u32);
            if inverted { 255 - l } else { l }
        },
    );

    let grids = prepared.detect_grids();
    log::debug!("Detected {} candidate grid(s)", grids.len());

    for grid in grids {
        match grid.decode() {
            Ok((_, content)) => {
                let bounds = grid.bounds.map(|p| Point::new(p.x, p.y));
                return Some((content, Corners::from_clockwise(bounds)));
            }
            Err(err) => log::debug!("Grid failed to decode: {}", err),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{blank_buffer, inverted_qr_buffer, qr_buffer};

    #[test]
    fn test_decode_finds_payload_and_corners() {
        let (buffer, symbol) = qr_buffer("hello world");
        let result = decode(&buffer, &DecodeOptions::default());

        let DecodeResult::Found { text, corners } = result else {
            panic!("expected a QR code, got {:?}", result);
        };
        assert_eq!(text, "hello world");
        assert!(corners.is_simple());

        // The outline encloses the symbol's center and lies near its edges
        let (cx, cy) = symbol.center();
        assert!(corners.contains(cx, cy));
        let tolerance = 16;
        assert!((corners.top_left.x - symbol.left).abs() <= tolerance);
        assert!((corners.top_left.y - symbol.top).abs() <= tolerance);
        assert!((corners.bottom_right.x - symbol.right).abs() <= tolerance);
        assert!((corners.bottom_right.y - symbol.bottom).abs() <= tolerance);
    }

    #[test]
    fn test_decode_url_payload() {
        let (buffer, _) = qr_buffer("https://example.com/x");
        match decode(&buffer, &DecodeOptions::default()) {
            DecodeResult::Found { text, .. } => assert_eq!(text, "https://example.com/x"),
            other => panic!("expected a QR code, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_buffer_is_not_found() {
        let buffer = blank_buffer(320, 240);
        assert_eq!(
            decode(&buffer, &DecodeOptions::default()),
            DecodeResult::NotFound
        );
    }

    #[test]
    fn test_only_invert_reads_light_on_dark() {
        let buffer = inverted_qr_buffer("inverted");
        let options = DecodeOptions {
            inversion: InversionPolicy::OnlyInvert,
        };
        match decode(&buffer, &options) {
            DecodeResult::Found { text, .. } => assert_eq!(text, "inverted"),
            other => panic!("expected a QR code, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_buffer_becomes_error_result() {
        let err = PixelBuffer::new(0, 0, Vec::new()).unwrap_err();
        let DecodeResult::Error { message } = DecodeResult::from(err) else {
            panic!("expected an error result");
        };
        assert!(message.starts_with("Error processing QR code"));
    }

    #[test]
    fn test_policy_passes() {
        assert_eq!(InversionPolicy::DontInvert.passes(), &[false]);
        assert_eq!(InversionPolicy::InvertFirst.passes(), &[true, false]);
    }

    #[test]
    fn test_result_json_shape() {
        let json = serde_json::to_value(DecodeResult::NotFound).unwrap();
        assert_eq!(json["status"], "not_found");

        let found = DecodeResult::Found {
            text: "hi".into(),
            corners: Corners::from_clockwise([Point::new(0, 0); 4]),
        };
        let json = serde_json::to_value(found).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["text"], "hi");
        assert_eq!(json["corners"]["top_left"]["x"], 0);
    }
}
