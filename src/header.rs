//! The 6-byte bit-packed stream header and the image descriptor it carries.
//!
//! Layout, MSB-first: magic (8), width − 1 (16), height − 1 (16), color mode
//! (2), DWT levels − 1 (3), scan order (2), subsampling (1). Nothing else is
//! stored; the plane count is derived from the color mode and every payload
//! bit position follows from the scheduler.

use crate::color::ColorMode;
use crate::scan::ScanOrder;
use crate::utils::bits::{ilog2, BitReader, BitWriter};
use crate::utils::error::{Result, SqzError};
use crate::{DWT_MAX_LEVEL, HEADER_MAGIC, MAX_DIMENSION, MIN_DIMENSION};

/// Describes an image for encoding, and is recovered from the header when
/// decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub color_mode: ColorMode,
    pub scan_order: ScanOrder,
    pub width: usize,
    pub height: usize,
    /// Number of recursive DWT decompositions, in `[1, 8]`. The encoder
    /// clamps this down when the image is too small for the requested depth.
    pub dwt_levels: usize,
    /// Delays the chroma planes by one schedule round; for lossy truncation
    /// this acts like chroma subsampling, for lossless output it only
    /// reorders bits.
    pub subsampling: bool,
}

impl ImageDescriptor {
    /// Number of spectral planes, derived from the color mode.
    #[inline]
    pub fn num_planes(&self) -> usize {
        self.color_mode.planes()
    }

    /// Size in bytes of the raw pixel buffer for this image.
    #[inline]
    pub fn pixel_len(&self) -> usize {
        self.width * self.height * self.num_planes()
    }
}

/// Deepest decomposition the image dimensions support.
pub(crate) fn max_dwt_levels(width: usize, height: usize) -> usize {
    let smallest = width.min(height) as u32;
    let max_level = ilog2(smallest).saturating_sub(3) as usize;
    max_level.min(DWT_MAX_LEVEL)
}

fn check_bounds(descriptor: &ImageDescriptor) -> std::result::Result<(), &'static str> {
    if descriptor.width < MIN_DIMENSION || descriptor.width > MAX_DIMENSION {
        return Err("width");
    }
    if descriptor.height < MIN_DIMENSION || descriptor.height > MAX_DIMENSION {
        return Err("height");
    }
    if descriptor.dwt_levels == 0 || descriptor.dwt_levels > DWT_MAX_LEVEL {
        return Err("dwt_levels");
    }
    Ok(())
}

/// Encoder-side validation. Out-of-range fields are rejected, except that
/// `dwt_levels` is clamped to what the dimensions allow.
pub(crate) fn validate_encode(descriptor: &mut ImageDescriptor) -> Result<()> {
    check_bounds(descriptor).map_err(SqzError::InvalidParameter)?;
    let max_level = max_dwt_levels(descriptor.width, descriptor.height);
    if descriptor.dwt_levels > max_level {
        descriptor.dwt_levels = max_level;
    }
    Ok(())
}

/// Decoder-side validation of a parsed header. Everything an encoder would
/// have clamped is corruption here.
pub(crate) fn validate_decode(descriptor: &ImageDescriptor) -> Result<()> {
    check_bounds(descriptor).map_err(SqzError::DataCorrupted)?;
    if descriptor.dwt_levels > max_dwt_levels(descriptor.width, descriptor.height) {
        return Err(SqzError::DataCorrupted("dwt_levels"));
    }
    Ok(())
}

/// Writes the 6-byte header. Returns `false` if the buffer could not hold
/// all of it.
pub(crate) fn write_header(descriptor: &ImageDescriptor, buffer: &mut BitWriter) -> bool {
    let mut ok = buffer.write_bits(HEADER_MAGIC as u32, 8);
    ok &= buffer.write_bits(descriptor.width as u32 - 1, 16);
    ok &= buffer.write_bits(descriptor.height as u32 - 1, 16);
    ok &= buffer.write_bits(descriptor.color_mode as u32, 2);
    ok &= buffer.write_bits(descriptor.dwt_levels as u32 - 1, 3);
    ok &= buffer.write_bits(descriptor.scan_order as u32, 2);
    ok &= buffer.write_bit(descriptor.subsampling as u32);
    ok
}

/// Reads and parses the header. A stream shorter than the header, or one
/// with the wrong magic byte, is an invalid parameter rather than corrupted
/// data.
pub(crate) fn read_header(buffer: &mut BitReader) -> Result<ImageDescriptor> {
    let truncated = SqzError::InvalidParameter("truncated header");
    let magic = buffer.read_bits(8).ok_or(truncated.clone())?;
    if magic != HEADER_MAGIC as u32 {
        return Err(SqzError::InvalidParameter("magic"));
    }
    let width = buffer.read_bits(16).ok_or(truncated.clone())? as usize + 1;
    let height = buffer.read_bits(16).ok_or(truncated.clone())? as usize + 1;
    let color_mode = ColorMode::from_bits(buffer.read_bits(2).ok_or(truncated.clone())?);
    let dwt_levels = buffer.read_bits(3).ok_or(truncated.clone())? as usize + 1;
    let scan_order = ScanOrder::from_bits(buffer.read_bits(2).ok_or(truncated.clone())?);
    let subsampling = buffer.read_bit().ok_or(truncated)? != 0;
    Ok(ImageDescriptor {
        color_mode,
        scan_order,
        width,
        height,
        dwt_levels,
        subsampling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HEADER_SIZE;

    fn descriptor() -> ImageDescriptor {
        ImageDescriptor {
            color_mode: ColorMode::YcocgR,
            scan_order: ScanOrder::Snake,
            width: 640,
            height: 480,
            dwt_levels: 5,
            subsampling: true,
        }
    }

    #[test]
    fn test_header_round_trip() {
        let mut buf = [0u8; HEADER_SIZE];
        let desc = descriptor();
        let mut writer = BitWriter::new(&mut buf);
        assert!(write_header(&desc, &mut writer));
        assert_eq!(writer.bits_used(), HEADER_SIZE * 8);
        assert_eq!(buf[0], crate::HEADER_MAGIC);

        let mut reader = BitReader::new(&buf);
        let parsed = read_header(&mut reader).unwrap();
        assert_eq!(parsed, desc);
    }

    #[test]
    fn test_header_fits_exact_budget() {
        // a destination of exactly HEADER_SIZE bytes is enough
        let mut buf = [0u8; HEADER_SIZE];
        let mut writer = BitWriter::new(&mut buf);
        assert!(write_header(&descriptor(), &mut writer));
        // one byte short is not
        let mut short = [0u8; HEADER_SIZE - 1];
        let mut writer = BitWriter::new(&mut short);
        assert!(!write_header(&descriptor(), &mut writer));
    }

    #[test]
    fn test_bad_magic_is_invalid_parameter() {
        let mut buf = [0u8; HEADER_SIZE];
        let mut writer = BitWriter::new(&mut buf);
        assert!(write_header(&descriptor(), &mut writer));
        buf[0] = 0x00;
        let mut reader = BitReader::new(&buf);
        assert_eq!(
            read_header(&mut reader),
            Err(SqzError::InvalidParameter("magic"))
        );
    }

    #[test]
    fn test_encode_validation_clamps_levels() {
        let mut desc = descriptor();
        desc.width = 16;
        desc.height = 16;
        desc.dwt_levels = 6;
        validate_encode(&mut desc).unwrap();
        assert_eq!(desc.dwt_levels, 2, "ilog2(16) - 3");

        desc.dwt_levels = 0;
        assert_eq!(
            validate_encode(&mut desc),
            Err(SqzError::InvalidParameter("dwt_levels"))
        );
    }

    #[test]
    fn test_decode_validation_rejects_what_encode_clamps() {
        let mut desc = descriptor();
        desc.width = 16;
        desc.height = 16;
        desc.dwt_levels = 6;
        assert_eq!(
            validate_decode(&desc),
            Err(SqzError::DataCorrupted("dwt_levels"))
        );

        desc.dwt_levels = 1;
        desc.width = 7;
        assert_eq!(validate_decode(&desc), Err(SqzError::DataCorrupted("width")));
    }

    #[test]
    fn test_max_dwt_levels() {
        assert_eq!(max_dwt_levels(8, 8), 1);
        assert_eq!(max_dwt_levels(16, 4096), 2);
        assert_eq!(max_dwt_levels(64, 64), 4);
        assert_eq!(max_dwt_levels(65_535, 65_535), 8);
    }
}
