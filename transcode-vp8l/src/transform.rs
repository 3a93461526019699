//! VP8L transform operations
//!
//! VP8L supports four types of transforms:
//! 1. Predictor transform
//! 2. Cross-color transform
//! 3. Subtract green transform
//! 4. Color indexing transform
//!
//! The encoder applies them in stream order; the decoder undoes them in
//! reverse order on the reconstructed ARGB buffer.

use crate::error::{Result, Vp8lError};
use crate::tables::{ARGB_BLACK, NUM_TRANSFORMS};

/// Transform tag as written in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformType {
    Predictor = 0,
    CrossColor = 1,
    SubtractGreen = 2,
    ColorIndexing = 3,
}

impl TransformType {
    /// Decode the 2-bit transform tag
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => TransformType::Predictor,
            1 => TransformType::CrossColor,
            2 => TransformType::SubtractGreen,
            _ => TransformType::ColorIndexing,
        }
    }
}

/// A transform with the parameters needed to undo it
///
/// `xsize` is the image width the transform was applied at, before any
/// color indexing transform declared after it narrowed the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Per-tile spatial prediction; the mode sits in the green byte of `modes`
    Predictor {
        bits: u32,
        xsize: usize,
        modes: Vec<u32>,
    },
    /// Per-tile red/blue correction from green and red
    CrossColor {
        bits: u32,
        xsize: usize,
        multipliers: Vec<u32>,
    },
    /// Green was subtracted from red and blue
    SubtractGreen,
    /// Pixels are palette indices, `2^(3 - bits)` bits each, bundled into
    /// the green byte
    ColorIndexing {
        bits: u32,
        xsize: usize,
        palette: Vec<u32>,
    },
}

impl Transform {
    /// Tag of this transform
    pub fn transform_type(&self) -> TransformType {
        match self {
            Transform::Predictor { .. } => TransformType::Predictor,
            Transform::CrossColor { .. } => TransformType::CrossColor,
            Transform::SubtractGreen => TransformType::SubtractGreen,
            Transform::ColorIndexing { .. } => TransformType::ColorIndexing,
        }
    }

    /// Undo this transform on a buffer of `height` rows
    ///
    /// Color indexing widens the buffer to `xsize`; the other transforms
    /// work in place.
    pub fn apply_inverse(&self, pixels: &mut Vec<u32>, height: usize) -> Result<()> {
        match self {
            Transform::Predictor { bits, xsize, modes } => {
                check_tile_data(*bits, *xsize, height, modes)?;
                check_buffer(pixels, *xsize * height)?;
                inverse_predictor(pixels, *xsize, height, *bits, modes);
            }
            Transform::CrossColor {
                bits,
                xsize,
                multipliers,
            } => {
                check_tile_data(*bits, *xsize, height, multipliers)?;
                check_buffer(pixels, *xsize * height)?;
                inverse_cross_color(pixels, *xsize, height, *bits, multipliers);
            }
            Transform::SubtractGreen => add_green_to_blue_and_red(pixels),
            Transform::ColorIndexing {
                bits,
                xsize,
                palette,
            } => {
                if *bits > 3 || palette.len() < 1usize << (8 >> *bits) {
                    return Err(Vp8lError::InvalidTransform(format!(
                        "color indexing with {} bits and {} palette entries",
                        bits,
                        palette.len()
                    )));
                }
                check_buffer(pixels, subsample_size(*xsize, *bits) * height)?;
                inverse_color_indexing(pixels, *xsize, height, *bits, palette);
            }
        }
        Ok(())
    }
}

fn check_tile_data(bits: u32, xsize: usize, height: usize, data: &[u32]) -> Result<()> {
    if !(2..=9).contains(&bits) {
        return Err(Vp8lError::InvalidTransform(format!(
            "tile bits {} outside 2..=9",
            bits
        )));
    }
    let expected = subsample_size(xsize, bits) * subsample_size(height, bits);
    if data.len() < expected {
        return Err(Vp8lError::InvalidTransform(format!(
            "{} tile entries, expected {}",
            data.len(),
            expected
        )));
    }
    Ok(())
}

fn check_buffer(pixels: &[u32], expected: usize) -> Result<()> {
    if pixels.len() != expected {
        return Err(Vp8lError::BufferTooSmall {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Ordered transforms of one image, undone last-to-first
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    transforms: Vec<Transform>,
}

impl TransformPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transform of this type was already declared
    pub fn contains(&self, transform_type: TransformType) -> bool {
        self.transforms
            .iter()
            .any(|t| t.transform_type() == transform_type)
    }

    /// Append a transform in stream order
    pub fn push(&mut self, transform: Transform) -> Result<()> {
        if self.transforms.len() >= NUM_TRANSFORMS {
            return Err(Vp8lError::InvalidTransform(format!(
                "more than {} transforms",
                NUM_TRANSFORMS
            )));
        }
        if self.contains(transform.transform_type()) {
            return Err(Vp8lError::InvalidTransform(format!(
                "{:?} transform declared twice",
                transform.transform_type()
            )));
        }
        self.transforms.push(transform);
        Ok(())
    }

    /// Number of transforms
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether no transform was declared
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Transforms in stream order
    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.transforms.iter()
    }

    /// Undo every transform, last declared first
    pub fn apply_inverse(&self, pixels: &mut Vec<u32>, height: usize) -> Result<()> {
        for transform in self.transforms.iter().rev() {
            transform.apply_inverse(pixels, height)?;
        }
        Ok(())
    }
}

/// Number of `2^bits` blocks needed to cover `size`
#[inline]
pub fn subsample_size(size: usize, bits: u32) -> usize {
    (size + (1 << bits) - 1) >> bits
}

/// Undo the delta coding of a palette and pad it to `2^(8 >> bits)` entries
///
/// Entries past the transmitted colors stay transparent black, so any
/// index a bundled pixel can hold maps to a color.
pub fn expand_palette(deltas: &[u32], bits: u32) -> Vec<u32> {
    let mut palette = vec![0u32; (1usize << (8 >> bits)).max(deltas.len())];
    let mut prev = 0u32;
    for (entry, &delta) in palette.iter_mut().zip(deltas) {
        prev = add_pixels(delta, prev);
        *entry = prev;
    }
    palette
}

/// Undo the subtract green transform
pub fn add_green_to_blue_and_red(pixels: &mut [u32]) {
    for pixel in pixels.iter_mut() {
        let green = (*pixel >> 8) & 0xff;
        let red_blue = (*pixel & 0x00ff00ff).wrapping_add((green << 16) | green);
        *pixel = (*pixel & 0xff00ff00) | (red_blue & 0x00ff00ff);
    }
}

fn inverse_predictor(pixels: &mut [u32], xsize: usize, height: usize, bits: u32, modes: &[u32]) {
    if xsize == 0 || height == 0 {
        return;
    }

    // First row: black for the first pixel, left for the rest
    pixels[0] = add_pixels(pixels[0], ARGB_BLACK);
    for x in 1..xsize {
        pixels[x] = add_pixels(pixels[x], pixels[x - 1]);
    }

    let tiles_per_row = subsample_size(xsize, bits);
    for y in 1..height {
        let row = y * xsize;
        let mode_row = &modes[(y >> bits) * tiles_per_row..];

        // First column: top
        pixels[row] = add_pixels(pixels[row], pixels[row - xsize]);

        for x in 1..xsize {
            let i = row + x;
            let mode = (mode_row[x >> bits] >> 8) & 0xf;
            // The top-right of the last column is the first pixel of this row
            let predicted = predict(
                mode,
                pixels[i - 1],
                pixels[i - xsize],
                pixels[i - xsize - 1],
                pixels[i - xsize + 1],
            );
            pixels[i] = add_pixels(pixels[i], predicted);
        }
    }
}

/// Predict a pixel from its decoded neighbours
fn predict(mode: u32, left: u32, top: u32, top_left: u32, top_right: u32) -> u32 {
    match mode {
        1 => left,
        2 => top,
        3 => top_right,
        4 => top_left,
        5 => average2(average2(left, top_right), top),
        6 => average2(left, top_left),
        7 => average2(left, top),
        8 => average2(top_left, top),
        9 => average2(top, top_right),
        10 => average2(average2(left, top_left), average2(top, top_right)),
        11 => select(left, top, top_left),
        12 => clamp_add_subtract_full(left, top, top_left),
        13 => clamp_add_subtract_half(average2(left, top), top_left),
        // 0, and 14/15 which behave like 0
        _ => ARGB_BLACK,
    }
}

/// Add two pixels channel by channel, modulo 256
#[inline]
fn add_pixels(a: u32, b: u32) -> u32 {
    let alpha_green = (a & 0xff00ff00).wrapping_add(b & 0xff00ff00);
    let red_blue = (a & 0x00ff00ff).wrapping_add(b & 0x00ff00ff);
    (alpha_green & 0xff00ff00) | (red_blue & 0x00ff00ff)
}

/// Channel-wise floor average of two pixels
#[inline]
fn average2(a: u32, b: u32) -> u32 {
    (((a ^ b) & 0xfefefefe) >> 1) + (a & b)
}

#[inline]
fn channel(pixel: u32, shift: u32) -> i32 {
    ((pixel >> shift) & 0xff) as i32
}

/// Left or top, whichever is closer to the gradient estimate `L + T - TL`
fn select(left: u32, top: u32, top_left: u32) -> u32 {
    let (mut to_left, mut to_top) = (0, 0);
    for shift in [0, 8, 16, 24] {
        let tl = channel(top_left, shift);
        to_left += (channel(top, shift) - tl).abs();
        to_top += (channel(left, shift) - tl).abs();
    }

    if to_left < to_top {
        left
    } else {
        top
    }
}

fn clamp_add_subtract_full(a: u32, b: u32, c: u32) -> u32 {
    [0, 8, 16, 24].iter().fold(0, |acc, &shift| {
        let value = channel(a, shift) + channel(b, shift) - channel(c, shift);
        acc | (clamp_byte(value) << shift)
    })
}

fn clamp_add_subtract_half(avg: u32, c: u32) -> u32 {
    [0, 8, 16, 24].iter().fold(0, |acc, &shift| {
        let a = channel(avg, shift);
        let value = a + (a - channel(c, shift)) / 2;
        acc | (clamp_byte(value) << shift)
    })
}

/// Clamp value to byte range
#[inline]
fn clamp_byte(value: i32) -> u32 {
    value.clamp(0, 255) as u32
}

/// Signed multipliers of one cross-color tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Multipliers {
    green_to_red: i8,
    green_to_blue: i8,
    red_to_blue: i8,
}

impl Multipliers {
    fn from_code(code: u32) -> Self {
        Self {
            green_to_red: code as u8 as i8,
            green_to_blue: (code >> 8) as u8 as i8,
            red_to_blue: (code >> 16) as u8 as i8,
        }
    }
}

#[inline]
fn color_transform_delta(t: i8, c: i8) -> i32 {
    (i32::from(t) * i32::from(c)) >> 5
}

fn transform_color_inverse(m: Multipliers, argb: u32) -> u32 {
    let green = (argb >> 8) as u8 as i8;
    let mut red = ((argb >> 16) & 0xff) as i32;
    let mut blue = (argb & 0xff) as i32;

    red = (red + color_transform_delta(m.green_to_red, green)) & 0xff;
    blue += color_transform_delta(m.green_to_blue, green);
    blue += color_transform_delta(m.red_to_blue, red as u8 as i8);
    blue &= 0xff;

    (argb & 0xff00ff00) | ((red as u32) << 16) | blue as u32
}

fn inverse_cross_color(
    pixels: &mut [u32],
    xsize: usize,
    height: usize,
    bits: u32,
    multipliers: &[u32],
) {
    if xsize == 0 {
        return;
    }

    let tiles_per_row = subsample_size(xsize, bits);
    for (y, row) in pixels.chunks_exact_mut(xsize).take(height).enumerate() {
        let code_row = &multipliers[(y >> bits) * tiles_per_row..];
        for (x, pixel) in row.iter_mut().enumerate() {
            let m = Multipliers::from_code(code_row[x >> bits]);
            *pixel = transform_color_inverse(m, *pixel);
        }
    }
}

/// Replace palette indices by colors, unbundling packed indices
fn inverse_color_indexing(
    pixels: &mut Vec<u32>,
    xsize: usize,
    height: usize,
    bits: u32,
    palette: &[u32],
) {
    if bits == 0 {
        for pixel in pixels.iter_mut() {
            *pixel = palette[((*pixel >> 8) & 0xff) as usize];
        }
        return;
    }

    let bits_per_pixel = 8 >> bits;
    let count_mask = (1 << bits) - 1;
    let index_mask = (1 << bits_per_pixel) - 1;
    let packed_xsize = subsample_size(xsize, bits);

    let mut out = Vec::with_capacity(xsize * height);
    for packed_row in pixels.chunks_exact(packed_xsize).take(height) {
        let mut packed = 0u32;
        for x in 0..xsize {
            if x & count_mask == 0 {
                packed = (packed_row[x >> bits] >> 8) & 0xff;
            }
            out.push(palette[(packed & index_mask) as usize]);
            packed >>= bits_per_pixel;
        }
    }
    *pixels = out;
}
