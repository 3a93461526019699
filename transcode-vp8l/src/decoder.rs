//! Lossless image reconstruction
//!
//! The decoder reads an image stream in this order:
//!
//! 1. transforms, each possibly carrying a sub-image of parameters
//! 2. the color cache size
//! 3. the meta-Huffman image (main image only) and the Huffman groups
//! 4. the entropy-coded pixels: literals, backward references and cache hits
//!
//! and finally undoes the transforms on the reconstructed buffer.
//! Sub-images (transform data, the meta-Huffman image, the palette) use the
//! same machinery without transforms or a meta-Huffman image of their own.

use crate::bitreader::BitReader;
use crate::color_cache::ColorCache;
use crate::error::{Result, Vp8lError};
use crate::htree_group::{PackedCode, ALPHA, BLUE, DIST, GREEN, RED};
use crate::meta_huffman::{HuffmanMetadata, MetaHuffmanImage};
use crate::tables::{
    DISTANCE_MAP, MAX_COLOR_CACHE_BITS, MAX_DIMENSION, NUM_LENGTH_CODES, NUM_LITERAL_CODES,
    NUM_PLANE_CODES,
};
use crate::transform::{expand_palette, subsample_size, Transform, TransformPipeline, TransformType};

/// Decoder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vp8lDecoderConfig {
    /// Largest accepted image width
    pub max_width: u32,
    /// Largest accepted image height
    pub max_height: u32,
    /// Use the combined literal table for groups with short codes
    pub use_packed_tables: bool,
}

impl Default for Vp8lDecoderConfig {
    fn default() -> Self {
        Self {
            max_width: MAX_DIMENSION,
            max_height: MAX_DIMENSION,
            use_packed_tables: true,
        }
    }
}

/// What the container layer hands to the lossless decoder
#[derive(Debug, Clone, Copy)]
pub struct LosslessInput<'a> {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Entropy-coded image stream, without the VP8L chunk header
    pub payload: &'a [u8],
    /// Color cache bits the container expects the main image to declare
    pub color_cache_bits: Option<u8>,
}

/// Decode a lossless image stream into `width * height` ARGB pixels
pub fn decode_lossless(input: &LosslessInput<'_>, config: &Vp8lDecoderConfig) -> Result<Vec<u32>> {
    let mut decoder =
        LosslessDecoder::new(input.payload, input.width, input.height, config.clone())?;
    if let Some(bits) = input.color_cache_bits {
        decoder = decoder.with_expected_color_cache_bits(bits);
    }
    decoder.decode()
}

/// Reconstructs one lossless image from its entropy-coded stream
pub struct LosslessDecoder<'a> {
    br: BitReader<'a>,
    width: usize,
    height: usize,
    config: Vp8lDecoderConfig,
    expected_cache_bits: Option<u8>,
}

impl<'a> LosslessDecoder<'a> {
    /// Create a decoder for a `width` x `height` image
    pub fn new(payload: &'a [u8], width: u32, height: u32, config: Vp8lDecoderConfig) -> Result<Self> {
        if width == 0 || height == 0 || width > config.max_width || height > config.max_height {
            return Err(Vp8lError::InvalidDimensions { width, height });
        }

        Ok(Self {
            br: BitReader::new(payload),
            width: width as usize,
            height: height as usize,
            config,
            expected_cache_bits: None,
        })
    }

    /// Require the main image to declare this many color cache bits
    pub fn with_expected_color_cache_bits(mut self, bits: u8) -> Self {
        self.expected_cache_bits = Some(bits);
        self
    }

    /// Decode the main image
    pub fn decode(self) -> Result<Vec<u32>> {
        self.decode_with_bits_consumed().map(|(pixels, _)| pixels)
    }

    /// Decode the main image, also returning how many payload bits it used
    pub fn decode_with_bits_consumed(mut self) -> Result<(Vec<u32>, u64)> {
        let pixels = self.decode_main_image()?;
        Ok((pixels, self.br.bits_consumed()))
    }

    fn decode_main_image(&mut self) -> Result<Vec<u32>> {
        let total = self.width * self.height;

        let mut xsize = self.width;
        let mut transforms = TransformPipeline::new();
        while self.br.read_bit() {
            let transform = self.read_transform(&mut xsize, &transforms)?;
            transforms.push(transform)?;
        }

        let cache_bits = self.read_color_cache_bits()?;
        if let Some(expected) = self.expected_cache_bits {
            if cache_bits != u32::from(expected) {
                return Err(Vp8lError::ColorCacheMismatch {
                    expected,
                    actual: (cache_bits > 0).then_some(cache_bits),
                });
            }
        }
        if self.br.is_end_of_stream() {
            return Err(Vp8lError::truncated(0, total));
        }

        let codes = self.read_huffman_codes(xsize, self.height, cache_bits, true)?;
        let mut pixels = self.decode_image_data(xsize, self.height, &codes, cache_bits)?;
        transforms.apply_inverse(&mut pixels, self.height)?;

        tracing::debug!(
            width = self.width,
            height = self.height,
            pixels = pixels.len(),
            transforms = transforms.len(),
            bits = self.br.bits_consumed(),
            "Decoded VP8L image"
        );

        Ok(pixels)
    }

    /// Decode a headerless sub-image: color cache and one group, no transforms
    fn decode_sub_image(&mut self, xsize: usize, ysize: usize) -> Result<Vec<u32>> {
        let cache_bits = self.read_color_cache_bits()?;
        let codes = self.read_huffman_codes(xsize, ysize, cache_bits, false)?;
        self.decode_image_data(xsize, ysize, &codes, cache_bits)
    }

    fn read_color_cache_bits(&mut self) -> Result<u32> {
        if !self.br.read_bit() {
            return Ok(0);
        }

        let bits = self.br.read_bits(4);
        if !(1..=MAX_COLOR_CACHE_BITS).contains(&bits) {
            return Err(Vp8lError::InvalidColorCacheBits(bits));
        }
        tracing::debug!(bits, "Color cache enabled");
        Ok(bits)
    }

    fn read_transform(
        &mut self,
        xsize: &mut usize,
        declared: &TransformPipeline,
    ) -> Result<Transform> {
        let transform_type = TransformType::from_bits(self.br.read_bits(2));
        if declared.contains(transform_type) {
            return Err(Vp8lError::InvalidTransform(format!(
                "{:?} transform declared twice",
                transform_type
            )));
        }

        let transform = match transform_type {
            TransformType::Predictor | TransformType::CrossColor => {
                let bits = self.br.read_bits(3) + 2;
                let data = self.decode_sub_image(
                    subsample_size(*xsize, bits),
                    subsample_size(self.height, bits),
                )?;
                tracing::debug!(?transform_type, bits, xsize = *xsize, "Read transform");

                if transform_type == TransformType::Predictor {
                    Transform::Predictor {
                        bits,
                        xsize: *xsize,
                        modes: data,
                    }
                } else {
                    Transform::CrossColor {
                        bits,
                        xsize: *xsize,
                        multipliers: data,
                    }
                }
            }
            TransformType::SubtractGreen => {
                tracing::debug!(?transform_type, "Read transform");
                Transform::SubtractGreen
            }
            TransformType::ColorIndexing => {
                let num_colors = self.br.read_bits(8) as usize + 1;
                let bits = match num_colors {
                    0..=2 => 3,
                    3..=4 => 2,
                    5..=16 => 1,
                    _ => 0,
                };
                let deltas = self.decode_sub_image(num_colors, 1)?;
                tracing::debug!(?transform_type, num_colors, bits, "Read transform");

                let transform = Transform::ColorIndexing {
                    bits,
                    xsize: *xsize,
                    palette: expand_palette(&deltas, bits),
                };
                *xsize = subsample_size(*xsize, bits);
                transform
            }
        };

        Ok(transform)
    }

    fn read_huffman_codes(
        &mut self,
        xsize: usize,
        ysize: usize,
        cache_bits: u32,
        allow_meta_image: bool,
    ) -> Result<HuffmanMetadata> {
        let meta_image = if allow_meta_image && self.br.read_bit() {
            let bits = self.br.read_bits(3) + 2;
            let meta_xsize = subsample_size(xsize, bits);
            let entropy_image = self.decode_sub_image(meta_xsize, subsample_size(ysize, bits))?;
            Some(MetaHuffmanImage::from_entropy_image(
                bits,
                meta_xsize,
                &entropy_image,
            ))
        } else {
            None
        };

        let codes = HuffmanMetadata::read(
            &mut self.br,
            meta_image,
            cache_bits,
            self.config.use_packed_tables,
        );
        // Codes read from an exhausted stream are all-zero and look malformed
        if self.br.is_end_of_stream() {
            tracing::debug!(xsize, ysize, "Stream ended inside Huffman codes");
            return Err(Vp8lError::truncated(0, xsize * ysize));
        }
        codes
    }

    /// Entropy-decode `width * height` pixels
    fn decode_image_data(
        &mut self,
        width: usize,
        height: usize,
        codes: &HuffmanMetadata,
        cache_bits: u32,
    ) -> Result<Vec<u32>> {
        let total = width * height;
        let mut data = vec![0u32; total];

        let mut cache = match cache_bits {
            0 => None,
            bits => Some(ColorCache::new(bits)?),
        };
        let len_code_limit = (NUM_LITERAL_CODES + NUM_LENGTH_CODES) as u32;
        let cache_limit = len_code_limit + cache.as_ref().map_or(0, |c| c.size() as u32);

        let br = &mut self.br;
        let arena = codes.arena();
        let mask = codes.column_mask();
        let mut group = codes.group(codes.group_index(0, 0));
        let mut last_cached = 0;
        let (mut col, mut row, mut pos) = (0usize, 0usize, 0usize);

        while pos < total {
            if col & mask == 0 {
                group = codes.group(codes.group_index(col, row));
            }

            if group.is_trivial_code {
                data[pos] = group.literal_arb;
            } else {
                br.refill();
                let code = if group.use_packed_table {
                    match group.read_packed(br) {
                        PackedCode::Literal { argb, .. } => {
                            if br.is_end_of_stream() {
                                break;
                            }
                            data[pos] = argb;
                            None
                        }
                        PackedCode::Deferred { symbol, .. } => Some(u32::from(symbol)),
                    }
                } else {
                    Some(group.read_symbol(arena, GREEN, br))
                };

                if let Some(code) = code {
                    if br.is_end_of_stream() {
                        break;
                    }

                    if code < NUM_LITERAL_CODES as u32 {
                        if group.is_trivial_literal {
                            data[pos] = group.literal_arb | (code << 8);
                        } else {
                            let red = group.read_symbol(arena, RED, br);
                            br.refill();
                            let blue = group.read_symbol(arena, BLUE, br);
                            let alpha = group.read_symbol(arena, ALPHA, br);
                            if br.is_end_of_stream() {
                                break;
                            }
                            data[pos] = (alpha << 24) | (red << 16) | (code << 8) | blue;
                        }
                    } else if code < len_code_limit {
                        let length = get_copy_distance(code - NUM_LITERAL_CODES as u32, br) as usize;
                        let dist_symbol = group.read_symbol(arena, DIST, br);
                        br.refill();
                        let dist_code = get_copy_distance(dist_symbol, br);
                        let dist = plane_code_to_distance(width, dist_code);
                        if br.is_end_of_stream() {
                            break;
                        }
                        if dist > pos || length > total - pos {
                            return Err(Vp8lError::InvalidBackwardReference {
                                position: pos,
                                distance: dist,
                                length,
                            });
                        }

                        copy_block(&mut data, pos, dist, length);
                        pos += length;
                        col += length;
                        while col >= width {
                            col -= width;
                            row += 1;
                        }
                        if pos < total && col & mask != 0 {
                            group = codes.group(codes.group_index(col, row));
                        }
                        if let Some(cache) = cache.as_mut() {
                            cache.insert_all(&data[last_cached..pos]);
                            last_cached = pos;
                        }
                        continue;
                    } else if code < cache_limit {
                        // Without a cache, cache_limit equals len_code_limit
                        if let Some(cache) = cache.as_mut() {
                            cache.insert_all(&data[last_cached..pos]);
                            last_cached = pos;
                            data[pos] = cache.lookup((code - len_code_limit) as usize);
                        }
                    } else {
                        return Err(Vp8lError::InvalidSymbol(code));
                    }
                }
            }

            // Advance by one pixel
            pos += 1;
            col += 1;
            if col >= width {
                col = 0;
                row += 1;
                if let Some(cache) = cache.as_mut() {
                    cache.insert_all(&data[last_cached..pos]);
                    last_cached = pos;
                }
            }
        }

        if pos < total {
            tracing::debug!(decoded = pos, expected = total, "Bitstream truncated");
            return Err(Vp8lError::truncated(pos, total));
        }

        Ok(data)
    }
}

/// Length or distance value of a prefix symbol, reading its extra bits
#[inline]
fn get_copy_distance(symbol: u32, br: &mut BitReader<'_>) -> u32 {
    if symbol < 4 {
        return symbol + 1;
    }
    let extra_bits = (symbol - 2) >> 1;
    let offset = (2 + (symbol & 1)) << extra_bits;
    offset + br.read_bits(extra_bits) + 1
}

/// Linear pixel distance of a plane code for rows of `xsize` pixels
#[inline]
fn plane_code_to_distance(xsize: usize, plane_code: u32) -> usize {
    if plane_code > NUM_PLANE_CODES {
        return (plane_code - NUM_PLANE_CODES) as usize;
    }

    let (dx, dy) = DISTANCE_MAP[(plane_code - 1) as usize];
    let dist = i64::from(dx) + i64::from(dy) * xsize as i64;
    if dist >= 1 {
        dist as usize
    } else {
        1
    }
}

/// Copy `length` pixels from `dist` back, repeating the source when it
/// overlaps the destination
#[inline]
fn copy_block(data: &mut [u32], pos: usize, dist: usize, length: usize) {
    let src = pos - dist;
    if dist >= length {
        data.copy_within(src..src + length, pos);
    } else {
        for i in 0..length {
            data[pos + i] = data[src + i];
        }
    }
}
