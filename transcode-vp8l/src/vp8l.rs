//! VP8L chunk front end
//!
//! A VP8L chunk is a 5-byte header followed by the lossless image stream.
//! This module parses the header and hands the stream to the lossless
//! decoder, converting its ARGB output to the representation the caller asks for.

use crate::decoder::{LosslessDecoder, Vp8lDecoderConfig};
use crate::error::{Result, Vp8lError};
use byteorder::{ByteOrder, LittleEndian};
use image::RgbaImage;

/// VP8L signature byte
pub const VP8L_SIGNATURE: u8 = 0x2f;

/// Size of the chunk header: signature plus one 32-bit word
pub const VP8L_HEADER_SIZE: usize = 5;

/// Parsed VP8L chunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vp8lHeader {
    /// Image width (1..=16384)
    pub width: u32,
    /// Image height (1..=16384)
    pub height: u32,
    /// Encoder hint that some pixel is not fully opaque
    pub alpha_used: bool,
    /// Format version, always 0
    pub version: u8,
}

impl Vp8lHeader {
    /// Parse the header at the start of a VP8L chunk
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < VP8L_HEADER_SIZE {
            return Err(Vp8lError::InvalidHeader(format!(
                "{} bytes, need {}",
                data.len(),
                VP8L_HEADER_SIZE
            )));
        }

        if data[0] != VP8L_SIGNATURE {
            return Err(Vp8lError::InvalidSignature(data[0]));
        }

        let bits = LittleEndian::read_u32(&data[1..VP8L_HEADER_SIZE]);
        let version = ((bits >> 29) & 7) as u8;
        if version != 0 {
            return Err(Vp8lError::UnsupportedVersion(version));
        }

        Ok(Self {
            width: (bits & 0x3fff) + 1,
            height: ((bits >> 14) & 0x3fff) + 1,
            alpha_used: (bits >> 28) & 1 != 0,
            version,
        })
    }
}

/// VP8L decoder
pub struct Vp8lDecoder<'a> {
    header: Vp8lHeader,
    payload: &'a [u8],
    config: Vp8lDecoderConfig,
}

impl<'a> Vp8lDecoder<'a> {
    /// Create a new VP8L decoder over a complete chunk
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = Vp8lHeader::parse(data)?;

        Ok(Self {
            header,
            payload: &data[VP8L_HEADER_SIZE..],
            config: Vp8lDecoderConfig::default(),
        })
    }

    /// Replace the decoder configuration
    pub fn with_config(mut self, config: Vp8lDecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the largest accepted dimensions
    pub fn max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.config.max_width = width;
        self.config.max_height = height;
        self
    }

    /// Enable or disable the combined literal table
    pub fn packed_tables(mut self, enabled: bool) -> Self {
        self.config.use_packed_tables = enabled;
        self
    }

    /// Parsed chunk header
    pub fn header(&self) -> &Vp8lHeader {
        &self.header
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.header.width, self.header.height)
    }

    /// Check if alpha channel is used
    pub fn has_alpha(&self) -> bool {
        self.header.alpha_used
    }

    /// Decode to ARGB pixels, one `u32` per pixel in row-major order
    pub fn decode_argb(&self) -> Result<Vec<u32>> {
        LosslessDecoder::new(
            self.payload,
            self.header.width,
            self.header.height,
            self.config.clone(),
        )?
        .decode()
    }

    /// Decode the VP8L image to an RGBA image
    pub fn decode(&self) -> Result<RgbaImage> {
        let pixels = self.decode_argb()?;
        argb_to_rgba_image(&pixels, self.header.width, self.header.height)
    }
}

/// Convert ARGB pixels to an `RgbaImage`
pub fn argb_to_rgba_image(pixels: &[u32], width: u32, height: u32) -> Result<RgbaImage> {
    let rgba: Vec<u8> = pixels
        .iter()
        .flat_map(|&pixel| {
            let [b, g, r, a] = pixel.to_le_bytes();
            [r, g, b, a]
        })
        .collect();
    let actual = rgba.len();

    RgbaImage::from_raw(width, height, rgba).ok_or(Vp8lError::BufferTooSmall {
        expected: width as usize * height as usize * 4,
        actual,
    })
}

/// Decode a headerless lossless stream holding an alpha plane
///
/// The alpha values are carried in the green channel. Filtering applied
/// on top of the plane is left to the caller.
pub fn decode_alpha_plane(payload: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let pixels =
        LosslessDecoder::new(payload, width, height, Vp8lDecoderConfig::default())?.decode()?;
    Ok(pixels.iter().map(|&pixel| (pixel >> 8) as u8).collect())
}
