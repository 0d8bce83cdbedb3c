//! Acquisition error taxonomy
//!
//! Every way an image can fail to reach the decoder. None of these escape a
//! decode attempt: the controller turns them into a rendered message.

/// Errors raised while turning a file or a camera frame into a pixel buffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    /// The camera exists but access was refused
    #[error("Error accessing camera: permission denied ({0})")]
    PermissionDenied(String),

    /// No usable camera, or the stream could not be started or read
    #[error("Error accessing camera: {0}")]
    DeviceUnavailable(String),

    /// The file could not be read or is not a decodable image
    #[error("Error loading image: {0}")]
    LoadError(String),

    /// Sizing or rasterizing the pixel buffer failed
    #[error("Error processing QR code: {0}")]
    DecodeFailure(String),
}

impl From<std::io::Error> for AcquisitionError {
    fn from(err: std::io::Error) -> Self {
        AcquisitionError::LoadError(err.to_string())
    }
}

impl From<image::ImageError> for AcquisitionError {
    fn from(err: image::ImageError) -> Self {
        AcquisitionError::LoadError(err.to_string())
    }
}
