use thiserror::Error;

/// Main error type for the SQZ codec.
///
/// Running out of byte budget during encoding or decoding is *not* an error:
/// the partial stream (or partial reconstruction) is the contract of
/// progressive coding, and both directions return normally in that case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqzError {
    /// An allocation failed
    #[error("out of memory")]
    OutOfMemory,
    /// A caller-supplied descriptor field is out of range, or a compressed
    /// stream does not start with a parseable header
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    /// The provided buffer cannot hold the requested output
    #[error("buffer too small, {required} bytes required")]
    BufferTooSmall { required: usize },
    /// The header parsed but declares an impossible image
    #[error("compressed data corrupted: {0}")]
    DataCorrupted(&'static str),
}

/// A specialized `Result` type for SQZ codec operations.
pub type Result<T> = std::result::Result<T, SqzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SqzError::OutOfMemory.to_string(), "out of memory");
        assert_eq!(
            SqzError::InvalidParameter("width").to_string(),
            "invalid parameter: width"
        );
        assert_eq!(
            SqzError::BufferTooSmall { required: 192 }.to_string(),
            "buffer too small, 192 bytes required"
        );
        assert_eq!(
            SqzError::DataCorrupted("dimensions").to_string(),
            "compressed data corrupted: dimensions"
        );
    }
}
