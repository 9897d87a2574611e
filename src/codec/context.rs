//! Codec context and end-to-end orchestration.
//!
//! Every encode or decode owns its coefficient allocation, subband tree and
//! bit cursor for the duration of the call; there is no global state and no
//! sharing, so concurrent calls with separate buffers are safe.

use std::array;

use crate::codec::schedule::{self, DecodeIo, EncodeIo, SCHEDULE};
use crate::codec::subband::{Subband, DWT_SUBBANDS};
use crate::color;
use crate::dwt::{self, Coefficient};
use crate::header::{self, ImageDescriptor};
use crate::utils::bits::{BitReader, BitWriter};
use crate::utils::error::{Result, SqzError};
use crate::{DWT_MAX_LEVEL, HEADER_SIZE};

/// One spectral channel: the subband tree addressing its slice of the shared
/// coefficient allocation.
pub struct SpectralPlane {
    pub bands: [[Subband; DWT_SUBBANDS]; DWT_MAX_LEVEL],
}

impl SpectralPlane {
    /// Computes the subband geometry of plane `plane`. Level 0 is the
    /// coarsest decomposition and the only one with a coded LL; the
    /// horizontal lowpass subbands take the rounded-up half widths, the
    /// vertical lowpass ones the rounded-up half heights.
    fn with_geometry(image: &ImageDescriptor, plane: usize) -> Self {
        let mut bands: [[Subband; DWT_SUBBANDS]; DWT_MAX_LEVEL] =
            array::from_fn(|_| array::from_fn(|_| Subband::default()));
        let levels = image.dwt_levels;
        let mut w = image.width;
        let mut h = image.height;
        for level in (0..levels).rev() {
            for orientation in (level > 0) as usize..DWT_SUBBANDS {
                let band = &mut bands[level][orientation];
                band.width = (w + (orientation & 1 == 0) as usize) >> 1;
                band.height = (h + (orientation <= 1) as usize) >> 1;
                band.stride = image.width << (levels - level);
                let horizontal = if orientation & 1 != 0 { (w + 1) >> 1 } else { 0 };
                let vertical = if orientation > 1 { band.stride >> 1 } else { 0 };
                band.offset = horizontal + vertical;
                band.round = SCHEDULE[image.color_mode as usize][plane][level][orientation] as i32
                    + (image.subsampling && plane > 0) as i32;
            }
            w = (w + 1) >> 1;
            h = (h + 1) >> 1;
        }
        SpectralPlane { bands }
    }
}

/// Owns everything one encode or decode needs: the descriptor, the single
/// coefficient allocation partitioned into planes, and the subband trees.
pub struct CodecContext {
    pub image: ImageDescriptor,
    pub data: Vec<Coefficient>,
    pub planes: Vec<SpectralPlane>,
}

impl CodecContext {
    pub fn new(image: ImageDescriptor) -> Result<CodecContext> {
        let data = dwt::alloc_coefficients(image.width * image.height * image.num_planes())?;
        let planes = (0..image.num_planes())
            .map(|plane| SpectralPlane::with_geometry(&image, plane))
            .collect();
        Ok(CodecContext {
            image,
            data,
            planes,
        })
    }
}

/// Encodes `source` into `dest`; `dest.len()` is the byte budget. Returns
/// the number of bytes actually written. The descriptor may be clamped.
pub(crate) fn encode(
    source: &[u8],
    dest: &mut [u8],
    descriptor: &mut ImageDescriptor,
) -> Result<usize> {
    header::validate_encode(descriptor)?;
    if source.len() < descriptor.pixel_len() {
        return Err(SqzError::InvalidParameter("source length"));
    }
    log::debug!(
        "encode {}x{} {:?}/{:?} levels={} budget={}",
        descriptor.width,
        descriptor.height,
        descriptor.color_mode,
        descriptor.scan_order,
        descriptor.dwt_levels,
        dest.len()
    );
    let mut writer = BitWriter::new(dest);
    if !header::write_header(descriptor, &mut writer) {
        return Err(SqzError::BufferTooSmall {
            required: HEADER_SIZE,
        });
    }
    let mut ctx = CodecContext::new(*descriptor)?;
    let image = ctx.image;
    color::forward(
        image.color_mode,
        source,
        &mut ctx.data,
        image.width * image.height,
    );
    dwt::forward(
        &mut ctx.data,
        image.width,
        image.height,
        image.num_planes(),
        image.dwt_levels,
    )?;
    dwt::to_sign_magnitude(&mut ctx.data);
    let mut io = EncodeIo {
        buffer: &mut writer,
    };
    schedule::run(&mut ctx, &mut io)?;
    let written = (writer.bits_used() + 7) / 8;
    log::debug!("encode finished at {written} bytes");
    Ok(written)
}

/// Decodes `source` into `dest`. Truncated payloads are tolerated and give a
/// best-effort reconstruction; only a broken header or impossible geometry
/// is an error. Returns the recovered descriptor.
pub(crate) fn decode(source: &[u8], dest: &mut [u8]) -> Result<ImageDescriptor> {
    let mut reader = BitReader::new(source);
    let image = header::read_header(&mut reader)?;
    header::validate_decode(&image)?;
    let required = image.pixel_len();
    if dest.len() < required {
        return Err(SqzError::BufferTooSmall { required });
    }
    log::debug!(
        "decode {}x{} {:?}/{:?} levels={} from {} bytes",
        image.width,
        image.height,
        image.color_mode,
        image.scan_order,
        image.dwt_levels,
        source.len()
    );
    let mut ctx = CodecContext::new(image)?;
    let mut io = DecodeIo {
        buffer: &mut reader,
    };
    schedule::run(&mut ctx, &mut io)?;
    round_coefficients(&mut ctx);
    dwt::from_sign_magnitude(&mut ctx.data);
    dwt::inverse(
        &mut ctx.data,
        image.width,
        image.height,
        image.num_planes(),
        image.dwt_levels,
    )?;
    color::inverse(
        image.color_mode,
        &ctx.data,
        &mut dest[..required],
        image.width * image.height,
    );
    Ok(image)
}

/// Parses and validates the header only, without touching pixel data. Use
/// [`ImageDescriptor::pixel_len`] on the result to size the decode buffer.
pub(crate) fn probe(source: &[u8]) -> Result<ImageDescriptor> {
    let mut reader = BitReader::new(source);
    let image = header::read_header(&mut reader)?;
    header::validate_decode(&image)?;
    Ok(image)
}

/// Rounds every partially received coefficient toward the midpoint of its
/// uncertainty interval: subbands stopped at bitplane `b >= 2` get the mask
/// `((1 << b) - 1) ^ 1` ORed into each LSP member, leaving the sign bit
/// untouched. Coefficients still in the LIP stay zero.
fn round_coefficients(ctx: &mut CodecContext) {
    let plane_len = ctx.image.width * ctx.image.height;
    let levels = ctx.image.dwt_levels;
    for (plane, spectral) in ctx.planes.iter().enumerate() {
        let data = &mut ctx.data[plane * plane_len..(plane + 1) * plane_len];
        for level in 0..levels {
            for orientation in (level > 0) as usize..DWT_SUBBANDS {
                let band = &spectral.bands[level][orientation];
                if band.max_bitplane == 0 || band.bitplane < 2 {
                    continue;
                }
                let Some(lists) = band.lists.as_deref() else {
                    continue;
                };
                let round_mask = (((1i32 << band.bitplane) - 1) ^ 1) as i16;
                let mut pixel = lists.lsp.head;
                while pixel >= 0 {
                    let (x, y) = lists.arena.xy(pixel);
                    data[band.offset + y as usize * band.stride + x as usize] |= round_mask;
                    pixel = lists.arena.next(pixel);
                }
            }
        }
    }
}
