//! File acquisition: read an image from disk and rasterize it

use std::path::{Path, PathBuf};

use crate::buffer::PixelBuffer;
use crate::error::AcquisitionError;

/// Read `path` and rasterize it at its native resolution
pub async fn acquire_from_file(path: &Path) -> Result<PixelBuffer, AcquisitionError> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        AcquisitionError::LoadError(format!("could not read {}: {}", path.display(), err))
    })?;
    rasterize(&bytes)
}

/// Decode encoded image bytes into an RGBA buffer
pub fn rasterize(bytes: &[u8]) -> Result<PixelBuffer, AcquisitionError> {
    if bytes.is_empty() {
        return Err(AcquisitionError::LoadError("file is empty".to_string()));
    }
    let img = image::load_from_memory(bytes)?;
    let rgba = img.to_rgba8();
    log::debug!(
        "Rasterized image: {}x{} pixels",
        rgba.width(),
        rgba.height()
    );
    PixelBuffer::try_from(rgba)
}

/// Ask the user for an image through the desktop file dialog
pub async fn pick_file() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Select an image containing a QR code")
        .add_filter(
            "Images",
            &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "pnm"],
        )
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

/// Name shown for the selected file
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_qr_png;

    #[tokio::test]
    async fn test_acquire_png_at_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.png");
        write_qr_png(&path, "native");

        let expected = image::open(&path).unwrap();
        let buffer = acquire_from_file(&path).await.unwrap();
        assert_eq!(buffer.width(), expected.width());
        assert_eq!(buffer.height(), expected.height());
    }

    #[tokio::test]
    async fn test_zero_byte_file_is_load_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = acquire_from_file(file.path()).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::LoadError(_)));
    }

    #[tokio::test]
    async fn test_truncated_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.png");
        write_qr_png(&path, "truncated");
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 3]).unwrap();

        let err = acquire_from_file(&path).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::LoadError(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = acquire_from_file(&dir.path().join("absent.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::LoadError(_)));
    }

    #[test]
    fn test_garbage_bytes_are_load_error() {
        let err = rasterize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AcquisitionError::LoadError(_)));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/scan/code.png")), "code.png");
    }
}
