//! RGBA pixel buffer handed to the decoder

use image::RgbaImage;

use crate::error::AcquisitionError;

/// A width × height grid of RGBA8 samples
///
/// Construction checks that both dimensions are positive and that the sample
/// data matches them, so a `PixelBuffer` in hand is always decodable input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap tightly packed RGBA data
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AcquisitionError> {
        let expected = checked_len(width, height)?;
        if data.len() != expected {
            return Err(AcquisitionError::DecodeFailure(format!(
                "pixel data is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Copy rows out of a frame whose rows may be padded past `width * 4`
    pub fn from_strided(
        width: u32,
        height: u32,
        stride: usize,
        data: &[u8],
    ) -> Result<Self, AcquisitionError> {
        let expected = checked_len(width, height)?;
        let row_len = width as usize * 4;
        if stride < row_len {
            return Err(AcquisitionError::DecodeFailure(format!(
                "row stride {} is shorter than a {} pixel row",
                stride, width
            )));
        }
        let needed = stride * (height as usize - 1) + row_len;
        if data.len() < needed {
            return Err(AcquisitionError::DecodeFailure(format!(
                "frame holds {} bytes, needed {} for {}x{} (stride {})",
                data.len(),
                needed,
                width,
                height,
                stride
            )));
        }

        let mut packed = Vec::with_capacity(expected);
        for row in data.chunks(stride).take(height as usize) {
            packed.extend_from_slice(&row[..row_len]);
        }
        Self::new(width, height, packed)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luminance of one pixel, alpha ignored
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let [r, g, b] = [self.data[i], self.data[i + 1], self.data[i + 2]];
        // Rec. 709 weights in 16.16 fixed point
        ((13933 * r as u32 + 46871 * g as u32 + 4732 * b as u32) >> 16) as u8
    }

    pub fn to_image(&self) -> RgbaImage {
        // Dimensions were validated on construction
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = AcquisitionError;

    fn try_from(img: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }
}

fn checked_len(width: u32, height: u32) -> Result<usize, AcquisitionError> {
    if width == 0 || height == 0 {
        return Err(AcquisitionError::DecodeFailure(format!(
            "image has no pixels ({}x{})",
            width, height
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| {
            AcquisitionError::DecodeFailure(format!("image too large ({}x{})", width, height))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sized_buffer_is_rejected() {
        let err = PixelBuffer::new(0, 10, Vec::new()).unwrap_err();
        assert!(matches!(err, AcquisitionError::DecodeFailure(_)));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        assert!(PixelBuffer::new(2, 2, vec![0; 15]).is_err());
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_from_strided_drops_row_padding() {
        // 2x2 image, 12 byte stride (4 bytes of padding per row)
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 1, 1, 255, 2, 2, 2, 255, 0, 0, 0, 0]);
        data.extend_from_slice(&[3, 3, 3, 255, 4, 4, 4, 255]);
        let buf = PixelBuffer::from_strided(2, 2, 12, &data).unwrap();
        assert_eq!(buf.to_image().into_raw().len(), 16);
        assert_eq!(buf.luma(0, 0), 1);
        assert_eq!(buf.luma(1, 1), 4);
    }

    #[test]
    fn test_from_strided_short_frame() {
        let err = PixelBuffer::from_strided(2, 2, 8, &[0; 12]).unwrap_err();
        assert!(matches!(err, AcquisitionError::DecodeFailure(_)));
    }

    #[test]
    fn test_luma_extremes() {
        let buf = PixelBuffer::new(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
        assert_eq!(buf.luma(0, 0), 0);
        assert_eq!(buf.luma(1, 0), 255);
    }
}
