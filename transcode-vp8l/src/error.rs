//! Error types for the VP8L decoder

use std::io;
use thiserror::Error;

/// Result type for VP8L operations
pub type Result<T> = std::result::Result<T, Vp8lError>;

/// Errors that can occur during VP8L decoding
///
/// Every variant is a format error: decoding is deterministic, so none of
/// them can be retried and the partially decoded pixels are discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Vp8lError {
    /// The chunk does not start with the VP8L signature byte
    #[error("Invalid VP8L signature: 0x{0:02x}")]
    InvalidSignature(u8),

    /// The header version field is not zero
    #[error("Unsupported VP8L version: {0}")]
    UnsupportedVersion(u8),

    /// The chunk header is too short or otherwise unusable
    #[error("Invalid VP8L header: {0}")]
    InvalidHeader(String),

    /// Image dimensions are zero or exceed the configured limits
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A code-length array violates the Kraft inequality, or the
    /// code-length code itself is malformed
    #[error("Malformed Huffman table: {0}")]
    MalformedHuffmanTable(String),

    /// The bit reader ran out of data before the image was complete
    #[error("Truncated bitstream: decoded {decoded} of {expected} pixels")]
    TruncatedBitstream { decoded: usize, expected: usize },

    /// Unknown, duplicated or badly parameterized transform
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// A code-length repeat instruction runs past the alphabet
    #[error("Code length repeat of {repeat} at symbol {position} overruns alphabet of {alphabet_size}")]
    RepeatOverrun {
        position: usize,
        repeat: usize,
        alphabet_size: usize,
    },

    /// Color cache bits outside 1..=11
    #[error("Invalid color cache bits: {0}")]
    InvalidColorCacheBits(u32),

    /// The stream's color cache size disagrees with the container
    #[error("Color cache mismatch: expected {expected} bits, stream declares {actual:?}")]
    ColorCacheMismatch { expected: u8, actual: Option<u32> },

    /// A backward reference points before the start of the image or past its end
    #[error("Invalid backward reference at pixel {position}: distance {distance}, length {length}")]
    InvalidBackwardReference {
        position: usize,
        distance: usize,
        length: usize,
    },

    /// A decoded green/length/cache symbol is outside its alphabet
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(u32),

    /// Buffer too small
    #[error("Buffer too small: expected {expected}, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
}

impl Vp8lError {
    /// Shorthand for a truncation error at the given decode position
    pub(crate) fn truncated(decoded: usize, expected: usize) -> Self {
        Vp8lError::TruncatedBitstream { decoded, expected }
    }
}

impl From<Vp8lError> for io::Error {
    fn from(err: Vp8lError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}
