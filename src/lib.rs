//! # SQZ image codec
//!
//! A byte-scalable progressive image codec: one encode produces a bitstream
//! whose every prefix decodes to a valid, progressively better
//! reconstruction of the same image. At full budget the reversible color
//! modes are mathematically lossless; at minimal budget the stream is a
//! low-quality image placeholder. Serving a different size never requires
//! re-encoding: truncate the buffer and ship it.
//!
//! The codec is a run-length wavelet bitplane coder with no entropy stage:
//! a reversible integer 5/3 DWT, per-subband significance/refinement passes
//! whose runs are coded with wavelet difference reduction (WDR), and a
//! static schedule that orders subband bitplanes by subjective importance.
//! No floating point is used anywhere; output is bit-identical across
//! platforms.
//!
//! This library is organized into several modules:
//! - `utils`: bit-level I/O, the node arena lists, and error handling
//! - `scan`: the four deterministic spatial scan orders
//! - `color`: reversible and lossy color transforms
//! - `dwt`: the reversible 5/3 wavelet and the sign-magnitude remap
//! - `codec`: subband state, the bitplane coder, the scheduler and the
//!   end-to-end pipelines
//! - `header`: the 6-byte stream header and descriptor validation
//!
//! ## Example
//!
//! ```
//! use sqz::{ColorMode, ImageDescriptor, ScanOrder};
//!
//! let pixels = vec![128u8; 32 * 32];
//! let mut descriptor = ImageDescriptor {
//!     color_mode: ColorMode::Grayscale,
//!     scan_order: ScanOrder::Snake,
//!     width: 32,
//!     height: 32,
//!     dwt_levels: 2,
//!     subsampling: false,
//! };
//! let mut compressed = vec![0u8; 1024];
//! let written = sqz::encode(&pixels, &mut compressed, &mut descriptor).unwrap();
//!
//! // any prefix decodes; the full stream round-trips losslessly
//! let info = sqz::probe(&compressed[..written]).unwrap();
//! let mut decoded = vec![0u8; info.pixel_len()];
//! sqz::decode(&compressed[..written], &mut decoded).unwrap();
//! assert_eq!(decoded, pixels);
//! ```

// Re-export commonly used types at the crate root
pub use color::ColorMode;
pub use header::ImageDescriptor;
pub use scan::ScanOrder;
pub use utils::error::{Result, SqzError};

pub mod utils {
    pub mod bits;
    pub mod error;
    pub mod lists;
}

pub mod codec {
    pub mod bitplane;
    pub mod context;
    pub mod schedule;
    pub mod subband;
}

pub mod color;
pub mod dwt;
pub mod header;
pub mod scan;

/// Magic byte opening every SQZ stream.
pub const HEADER_MAGIC: u8 = 0xA5;
/// Size of the bit-packed stream header, in bytes.
pub const HEADER_SIZE: usize = 6;
/// Smallest supported image dimension.
pub const MIN_DIMENSION: usize = 8;
/// Largest supported image dimension.
pub const MAX_DIMENSION: usize = (1 << 16) - 1;
/// Maximum number of recursive DWT decompositions.
pub const DWT_MAX_LEVEL: usize = 8;

/// Encodes an image into `dest`, treating `dest.len()` as the byte budget.
///
/// `source` holds packed pixel bytes: one byte per pixel for grayscale,
/// interleaved RGB triples otherwise. Returns the number of bytes written,
/// at most the budget. The descriptor's `dwt_levels` may be clamped down to
/// what the dimensions allow.
///
/// A budget too small for the whole image is not an error: encoding stops
/// when the buffer is full and the result is a valid truncated stream.
pub fn encode(source: &[u8], dest: &mut [u8], descriptor: &mut ImageDescriptor) -> Result<usize> {
    codec::context::encode(source, dest, descriptor)
}

/// Decodes a (possibly truncated) stream into `dest` and returns the image
/// descriptor recovered from the header.
///
/// `dest` must hold at least [`ImageDescriptor::pixel_len`] bytes; call
/// [`probe`] first to learn the size. Truncation anywhere after the header
/// is silently tolerated and yields a best-effort reconstruction.
pub fn decode(source: &[u8], dest: &mut [u8]) -> Result<ImageDescriptor> {
    codec::context::decode(source, dest)
}

/// Reads and validates only the header of a stream, without decoding pixel
/// data. Use this to size the buffer for [`decode`].
pub fn probe(source: &[u8]) -> Result<ImageDescriptor> {
    codec::context::probe(source)
}
