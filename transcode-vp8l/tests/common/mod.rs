//! Test-only VP8L encoder
//!
//! Produces streams for the decoder to reproduce bit-exactly. Every code is
//! flat: each used symbol gets a length of floor or ceil of log2 of the number
//! of used symbols. That needs no entropy model and still reaches simple
//! codes, normal codes with run-length instructions, second-level tables,
//! color cache hits, backward references, meta-Huffman groups and all four
//! transforms.

#![allow(dead_code)]

use transcode_vp8l::tables::{
    CODE_LENGTH_CODE_ORDER, COLOR_CACHE_HASH_MUL, DISTANCE_MAP, NUM_DISTANCE_CODES,
    NUM_LENGTH_CODES, NUM_LITERAL_CODES,
};

const ARGB_BLACK: u32 = 0xff00_0000;
const MAX_COPY_LENGTH: usize = 4096;
const MIN_COPY_LENGTH: usize = 3;

/// VP8L bit writer
#[derive(Debug, Default)]
pub struct Vp8lBitWriter {
    buffer: Vec<u8>,
    bits: u64,
    bit_count: u32,
    total_bits: u64,
}

impl Vp8lBitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `num_bits` of `value`, least significant first
    pub fn write_bits(&mut self, value: u32, num_bits: u32) {
        if num_bits == 0 {
            return;
        }
        let value = if num_bits < 32 {
            value & ((1 << num_bits) - 1)
        } else {
            value
        };
        self.bits |= u64::from(value) << self.bit_count;
        self.bit_count += num_bits;
        self.total_bits += u64::from(num_bits);

        while self.bit_count >= 8 {
            self.buffer.push((self.bits & 0xFF) as u8);
            self.bits >>= 8;
            self.bit_count -= 8;
        }
    }

    /// Append a canonical Huffman code, most significant bit first
    pub fn write_code(&mut self, code: u32, len: u8) {
        for i in (0..u32::from(len)).rev() {
            self.write_bits((code >> i) & 1, 1);
        }
    }

    /// Bits written so far
    pub fn bit_len(&self) -> u64 {
        self.total_bits
    }

    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.buffer.push((self.bits & 0xFF) as u8);
        }
        self.buffer
    }
}

/// Transform applied by the encoder, in stream order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardTransform {
    SubtractGreen,
    Predictor { bits: u32 },
    CrossColor { bits: u32 },
    ColorIndexing,
}

/// What the encoder is allowed to use
#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    pub transforms: Vec<ForwardTransform>,
    /// 0 disables the color cache
    pub cache_bits: u32,
    pub backward_refs: bool,
    /// Tile bits and number of groups of a meta-Huffman image
    pub meta: Option<(u32, usize)>,
    /// Varies predictor modes, cross-color multipliers and group layout
    pub seed: u32,
    /// Predictor modes cycle through `0..n`; all 16 when unset
    pub predictor_mode_count: Option<u32>,
}

/// Encode a headerless lossless stream
pub fn encode_stream(argb: &[u32], width: u32, height: u32, options: &EncoderOptions) -> Vec<u8> {
    assert_eq!(argb.len(), width as usize * height as usize);
    let height = height as usize;
    let mut w = Vp8lBitWriter::new();
    let mut pixels = argb.to_vec();
    let mut xsize = width as usize;

    for transform in &options.transforms {
        w.write_bits(1, 1);
        match *transform {
            ForwardTransform::Predictor { bits } => {
                w.write_bits(0, 2);
                w.write_bits(bits - 2, 3);
                let modes = predictor_modes(
                    xsize,
                    height,
                    bits,
                    options.seed,
                    options.predictor_mode_count.unwrap_or(16),
                );
                write_sub_image(&mut w, &modes, subsample(xsize, bits));
                pixels = forward_predictor(&pixels, xsize, height, bits, &modes);
            }
            ForwardTransform::CrossColor { bits } => {
                w.write_bits(1, 2);
                w.write_bits(bits - 2, 3);
                let codes = cross_color_codes(xsize, height, bits, options.seed);
                write_sub_image(&mut w, &codes, subsample(xsize, bits));
                forward_cross_color(&mut pixels, xsize, bits, &codes);
            }
            ForwardTransform::SubtractGreen => {
                w.write_bits(2, 2);
                for pixel in pixels.iter_mut() {
                    *pixel = subtract_green(*pixel);
                }
            }
            ForwardTransform::ColorIndexing => {
                w.write_bits(3, 2);
                let palette = collect_palette(&pixels);
                assert!(palette.len() <= 256, "too many colors to index");
                w.write_bits(palette.len() as u32 - 1, 8);
                let deltas: Vec<u32> = palette
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| if i == 0 { c } else { sub_pixels(c, palette[i - 1]) })
                    .collect();
                write_sub_image(&mut w, &deltas, deltas.len());

                let bits = match palette.len() {
                    0..=2 => 3,
                    3..=4 => 2,
                    5..=16 => 1,
                    _ => 0,
                };
                pixels = bundle_indices(&pixels, xsize, bits, &palette);
                xsize = subsample(xsize, bits);
            }
        }
    }
    w.write_bits(0, 1);

    if options.cache_bits > 0 {
        w.write_bits(1, 1);
        w.write_bits(options.cache_bits, 4);
    } else {
        w.write_bits(0, 1);
    }

    let groups = match options.meta {
        Some((bits, num_groups)) => {
            w.write_bits(1, 1);
            w.write_bits(bits - 2, 3);
            let tiles_x = subsample(xsize, bits);
            let tiles_y = subsample(height, bits);
            let entropy: Vec<u32> = (0..tiles_x * tiles_y)
                .map(|tile| {
                    let group = (tile + options.seed as usize) % num_groups.max(1);
                    ARGB_BLACK | ((group as u32) << 8)
                })
                .collect();
            write_sub_image(&mut w, &entropy, tiles_x);

            (0..pixels.len())
                .map(|i| {
                    let (x, y) = (i % xsize, i / xsize);
                    ((entropy[(y >> bits) * tiles_x + (x >> bits)] >> 8) & 0xffff) as usize
                })
                .collect()
        }
        None => {
            w.write_bits(0, 1);
            vec![0; pixels.len()]
        }
    };

    write_entropy_coded(
        &mut w,
        &pixels,
        xsize,
        options.cache_bits,
        options.backward_refs,
        &groups,
    );
    w.finish()
}

/// Encode a complete VP8L chunk: header plus stream
pub fn encode_chunk(argb: &[u32], width: u32, height: u32, options: &EncoderOptions) -> Vec<u8> {
    let alpha_used = argb.iter().any(|&p| p >> 24 != 0xff);
    let bits = (width - 1) | ((height - 1) << 14) | (u32::from(alpha_used) << 28);
    let mut chunk = vec![0x2f];
    chunk.extend_from_slice(&bits.to_le_bytes());
    chunk.extend(encode_stream(argb, width, height, options));
    chunk
}

/// Sub-image: no color cache, a single group, literals only
fn write_sub_image(w: &mut Vp8lBitWriter, pixels: &[u32], xsize: usize) {
    w.write_bits(0, 1);
    write_entropy_coded(w, pixels, xsize, 0, false, &vec![0; pixels.len()]);
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Literal(u32),
    Cache(usize),
    Copy { length: usize, dist_code: u32 },
}

impl Token {
    fn len(&self) -> usize {
        match self {
            Token::Copy { length, .. } => *length,
            _ => 1,
        }
    }
}

fn write_entropy_coded(
    w: &mut Vp8lBitWriter,
    pixels: &[u32],
    xsize: usize,
    cache_bits: u32,
    backward_refs: bool,
    groups: &[usize],
) {
    let tokens = tokenize(pixels, xsize, cache_bits, backward_refs);
    let num_groups = groups.iter().copied().max().map_or(1, |g| g + 1);
    let green_size = NUM_LITERAL_CODES
        + NUM_LENGTH_CODES
        + if cache_bits > 0 { 1 << cache_bits } else { 0 };
    let sizes = [green_size, 256, 256, 256, NUM_DISTANCE_CODES];

    let mut histograms: Vec<Vec<Vec<u32>>> = (0..num_groups)
        .map(|_| sizes.iter().map(|&n| vec![0u32; n]).collect())
        .collect();
    let mut pos = 0;
    for token in &tokens {
        let hist = &mut histograms[groups[pos]];
        match *token {
            Token::Literal(argb) => {
                hist[0][((argb >> 8) & 0xff) as usize] += 1;
                hist[1][((argb >> 16) & 0xff) as usize] += 1;
                hist[2][(argb & 0xff) as usize] += 1;
                hist[3][(argb >> 24) as usize] += 1;
            }
            Token::Cache(index) => hist[0][NUM_LITERAL_CODES + NUM_LENGTH_CODES + index] += 1,
            Token::Copy { length, dist_code } => {
                hist[0][NUM_LITERAL_CODES + prefix_encode(length as u32).0 as usize] += 1;
                hist[4][prefix_encode(dist_code).0 as usize] += 1;
            }
        }
        pos += token.len();
    }

    let codes: Vec<Vec<PrefixCode>> = histograms
        .iter()
        .map(|group| group.iter().map(|hist| write_prefix_code(w, hist)).collect())
        .collect();

    let mut pos = 0;
    for token in &tokens {
        let group = &codes[groups[pos]];
        match *token {
            Token::Literal(argb) => {
                group[0].write_symbol(w, ((argb >> 8) & 0xff) as usize);
                group[1].write_symbol(w, ((argb >> 16) & 0xff) as usize);
                group[2].write_symbol(w, (argb & 0xff) as usize);
                group[3].write_symbol(w, (argb >> 24) as usize);
            }
            Token::Cache(index) => {
                group[0].write_symbol(w, NUM_LITERAL_CODES + NUM_LENGTH_CODES + index)
            }
            Token::Copy { length, dist_code } => {
                let (symbol, nbits, extra) = prefix_encode(length as u32);
                group[0].write_symbol(w, NUM_LITERAL_CODES + symbol as usize);
                w.write_bits(extra, nbits);
                let (symbol, nbits, extra) = prefix_encode(dist_code);
                group[4].write_symbol(w, symbol as usize);
                w.write_bits(extra, nbits);
            }
        }
        pos += token.len();
    }
}

fn tokenize(pixels: &[u32], xsize: usize, cache_bits: u32, backward_refs: bool) -> Vec<Token> {
    let mut cache = (cache_bits > 0).then(|| vec![0u32; 1 << cache_bits]);
    let hash = |color: u32| (COLOR_CACHE_HASH_MUL.wrapping_mul(color) >> (32 - cache_bits)) as usize;

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < pixels.len() {
        if backward_refs {
            let mut best: Option<(usize, usize)> = None;
            for dist in [1, xsize, xsize + 1, 2, 3 * xsize] {
                if dist == 0 || dist > i {
                    continue;
                }
                let mut length = 0;
                while i + length < pixels.len()
                    && length < MAX_COPY_LENGTH
                    && pixels[i + length] == pixels[i + length - dist]
                {
                    length += 1;
                }
                if length >= MIN_COPY_LENGTH && best.map_or(true, |(l, _)| length > l) {
                    best = Some((length, dist));
                }
            }

            if let Some((length, dist)) = best {
                tokens.push(Token::Copy {
                    length,
                    dist_code: plane_code(dist, xsize),
                });
                if let Some(cache) = cache.as_mut() {
                    for &p in &pixels[i..i + length] {
                        cache[hash(p)] = p;
                    }
                }
                i += length;
                continue;
            }
        }

        let p = pixels[i];
        match cache.as_mut() {
            Some(cache) => {
                let index = hash(p);
                if cache[index] == p {
                    tokens.push(Token::Cache(index));
                } else {
                    tokens.push(Token::Literal(p));
                }
                cache[index] = p;
            }
            None => tokens.push(Token::Literal(p)),
        }
        i += 1;
    }
    tokens
}

/// Distance code for a linear distance: a 2D neighbourhood code when one
/// matches, otherwise the distance offset past the 120 plane codes
fn plane_code(dist: usize, xsize: usize) -> u32 {
    for (i, &(dx, dy)) in DISTANCE_MAP.iter().enumerate() {
        let d = i64::from(dx) + i64::from(dy) * xsize as i64;
        if d.max(1) as usize == dist {
            return i as u32 + 1;
        }
    }
    dist as u32 + DISTANCE_MAP.len() as u32
}

/// Prefix symbol, extra bit count and extra bits of a length or distance
fn prefix_encode(value: u32) -> (u32, u32, u32) {
    if value <= 4 {
        return (value - 1, 0, 0);
    }
    let d = value - 1;
    let high = 31 - d.leading_zeros();
    let second = (d >> (high - 1)) & 1;
    let nbits = high - 1;
    (2 * high + second, nbits, d & ((1 << nbits) - 1))
}

struct PrefixCode {
    lengths: Vec<u8>,
    codes: Vec<u32>,
    single: bool,
}

impl PrefixCode {
    fn write_symbol(&self, w: &mut Vp8lBitWriter, symbol: usize) {
        assert!(self.lengths[symbol] > 0, "symbol {symbol} has no code");
        if !self.single {
            w.write_code(self.codes[symbol], self.lengths[symbol]);
        }
    }
}

/// Flat code lengths over the used symbols; symbol 0 stands in when none is used
pub fn flat_lengths(counts: &[u32]) -> Vec<u8> {
    let used: Vec<usize> = counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(|(s, _)| s)
        .collect();
    let mut lengths = vec![0u8; counts.len()];
    match used.len() {
        0 => lengths[0] = 1,
        1 => lengths[used[0]] = 1,
        n => {
            let k = usize::BITS - (n - 1).leading_zeros();
            let short = (1usize << k) - n;
            for (i, &s) in used.iter().enumerate() {
                lengths[s] = if i < short { (k - 1) as u8 } else { k as u8 };
            }
        }
    }
    lengths
}

/// Canonical codes for the given lengths
pub fn canonical_codes(lengths: &[u8]) -> Vec<u32> {
    let mut bl_count = [0u32; 16];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }
    let mut next_code = [0u32; 16];
    let mut code = 0;
    for bits in 1..16 {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }
    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                0
            } else {
                let code = next_code[len as usize];
                next_code[len as usize] += 1;
                code
            }
        })
        .collect()
}

fn write_prefix_code(w: &mut Vp8lBitWriter, counts: &[u32]) -> PrefixCode {
    let lengths = flat_lengths(counts);
    let used: Vec<usize> = (0..lengths.len()).filter(|&s| lengths[s] > 0).collect();

    if used.len() <= 2 && used.iter().all(|&s| s < 256) {
        w.write_bits(1, 1);
        w.write_bits(used.len() as u32 - 1, 1);
        if used.len() == 1 && used[0] < 2 {
            w.write_bits(0, 1);
            w.write_bits(used[0] as u32, 1);
        } else {
            w.write_bits(1, 1);
            w.write_bits(used[0] as u32, 8);
        }
        if used.len() == 2 {
            w.write_bits(used[1] as u32, 8);
        }
    } else {
        w.write_bits(0, 1);
        write_code_lengths(w, &lengths);
    }

    PrefixCode {
        codes: canonical_codes(&lengths),
        single: used.len() == 1,
        lengths,
    }
}

/// Code-length instructions: (symbol, extra bit count, extra bits)
fn tokenize_lengths(lengths: &[u8]) -> Vec<(usize, u32, u32)> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < lengths.len() {
        let len = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == len).count();
        let mut left = run;
        if len == 0 {
            while left > 0 {
                if left >= 11 {
                    let r = left.min(138);
                    tokens.push((18, 7, (r - 11) as u32));
                    left -= r;
                } else if left >= 3 {
                    let r = left.min(10);
                    tokens.push((17, 3, (r - 3) as u32));
                    left -= r;
                } else {
                    tokens.push((0, 0, 0));
                    left -= 1;
                }
            }
        } else {
            tokens.push((len as usize, 0, 0));
            left -= 1;
            while left > 0 {
                if left >= 3 {
                    let r = left.min(6);
                    tokens.push((16, 2, (r - 3) as u32));
                    left -= r;
                } else {
                    tokens.push((len as usize, 0, 0));
                    left -= 1;
                }
            }
        }
        i += run;
    }
    tokens
}

fn write_code_lengths(w: &mut Vp8lBitWriter, lengths: &[u8]) {
    let all_tokens = tokenize_lengths(lengths);
    let mut end = all_tokens.len();
    while end > 0 && matches!(all_tokens[end - 1].0, 0 | 17 | 18) {
        end -= 1;
    }
    let use_max_symbol = end < all_tokens.len() && end >= 2;
    let tokens = if use_max_symbol {
        &all_tokens[..end]
    } else {
        &all_tokens[..]
    };

    let mut counts = [0u32; 19];
    for &(symbol, _, _) in tokens {
        counts[symbol] += 1;
    }
    let cl_lengths = flat_lengths(&counts);
    let cl_codes = canonical_codes(&cl_lengths);
    let single = cl_lengths.iter().filter(|&&l| l > 0).count() == 1;

    let num_codes = CODE_LENGTH_CODE_ORDER
        .iter()
        .rposition(|&s| cl_lengths[s] > 0)
        .map_or(4, |i| (i + 1).max(4));
    w.write_bits(num_codes as u32 - 4, 4);
    for &symbol in &CODE_LENGTH_CODE_ORDER[..num_codes] {
        w.write_bits(u32::from(cl_lengths[symbol]), 3);
    }

    if use_max_symbol {
        w.write_bits(1, 1);
        let value = (end - 2) as u32;
        let mut k = 0;
        while value >= 1 << (2 + 2 * k) {
            k += 1;
        }
        w.write_bits(k, 3);
        w.write_bits(value, 2 + 2 * k);
    } else {
        w.write_bits(0, 1);
    }

    for &(symbol, nbits, extra) in tokens {
        if !single {
            w.write_code(cl_codes[symbol], cl_lengths[symbol]);
        }
        w.write_bits(extra, nbits);
    }
}

pub fn subsample(size: usize, bits: u32) -> usize {
    (size + (1 << bits) - 1) >> bits
}

fn add_pixels(a: u32, b: u32) -> u32 {
    let (a, b) = (a.to_le_bytes(), b.to_le_bytes());
    u32::from_le_bytes([
        a[0].wrapping_add(b[0]),
        a[1].wrapping_add(b[1]),
        a[2].wrapping_add(b[2]),
        a[3].wrapping_add(b[3]),
    ])
}

fn sub_pixels(a: u32, b: u32) -> u32 {
    let (a, b) = (a.to_le_bytes(), b.to_le_bytes());
    u32::from_le_bytes([
        a[0].wrapping_sub(b[0]),
        a[1].wrapping_sub(b[1]),
        a[2].wrapping_sub(b[2]),
        a[3].wrapping_sub(b[3]),
    ])
}

fn subtract_green(argb: u32) -> u32 {
    let [b, g, r, a] = argb.to_le_bytes();
    u32::from_le_bytes([b.wrapping_sub(g), g, r.wrapping_sub(g), a])
}

fn predictor_modes(xsize: usize, height: usize, bits: u32, seed: u32, count: u32) -> Vec<u32> {
    let tiles = subsample(xsize, bits) * subsample(height, bits);
    (0..tiles as u32)
        .map(|tile| ARGB_BLACK | ((tile.wrapping_add(seed) % count) << 8))
        .collect()
}

fn average2(a: u32, b: u32) -> u32 {
    let (a, b) = (a.to_le_bytes(), b.to_le_bytes());
    let avg = |i: usize| ((u16::from(a[i]) + u16::from(b[i])) / 2) as u8;
    u32::from_le_bytes([avg(0), avg(1), avg(2), avg(3)])
}

fn per_channel(f: impl Fn(i32, i32, i32) -> i32, a: u32, b: u32, c: u32) -> u32 {
    let (a, b, c) = (a.to_le_bytes(), b.to_le_bytes(), c.to_le_bytes());
    let ch = |i: usize| f(i32::from(a[i]), i32::from(b[i]), i32::from(c[i])).clamp(0, 255) as u8;
    u32::from_le_bytes([ch(0), ch(1), ch(2), ch(3)])
}

fn select(left: u32, top: u32, top_left: u32) -> u32 {
    let (l, t, tl) = (left.to_le_bytes(), top.to_le_bytes(), top_left.to_le_bytes());
    let dist = |p: [u8; 4]| -> i32 {
        (0..4)
            .map(|i| (i32::from(p[i]) - i32::from(tl[i])).abs())
            .sum()
    };
    // Estimate minus left is top minus top-left
    if dist(t) < dist(l) {
        left
    } else {
        top
    }
}

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
        12 => per_channel(|a, b, c| a + b - c, left, top, top_left),
        13 => per_channel(|a, _, c| a + (a - c) / 2, average2(left, top), 0, top_left),
        _ => ARGB_BLACK,
    }
}

fn forward_predictor(pixels: &[u32], xsize: usize, height: usize, bits: u32, modes: &[u32]) -> Vec<u32> {
    let tiles_x = subsample(xsize, bits);
    let mut out = vec![0u32; pixels.len()];
    for y in 0..height {
        for x in 0..xsize {
            let i = y * xsize + x;
            let predicted = if y == 0 {
                if x == 0 {
                    ARGB_BLACK
                } else {
                    pixels[i - 1]
                }
            } else if x == 0 {
                pixels[i - xsize]
            } else {
                let mode = (modes[(y >> bits) * tiles_x + (x >> bits)] >> 8) & 0xf;
                predict(
                    mode,
                    pixels[i - 1],
                    pixels[i - xsize],
                    pixels[i - xsize - 1],
                    pixels[i - xsize + 1],
                )
            };
            out[i] = sub_pixels(pixels[i], predicted);
        }
    }
    out
}

fn cross_color_codes(xsize: usize, height: usize, bits: u32, seed: u32) -> Vec<u32> {
    let tiles = subsample(xsize, bits) * subsample(height, bits);
    (0..tiles as u32)
        .map(|tile| {
            let t = tile.wrapping_add(seed);
            let green_to_red = t.wrapping_mul(37) & 0xff;
            let green_to_blue = t.wrapping_mul(101) & 0xff;
            let red_to_blue = t.wrapping_mul(59) & 0xff;
            ARGB_BLACK | (red_to_blue << 16) | (green_to_blue << 8) | green_to_red
        })
        .collect()
}

fn color_delta(multiplier: u8, color: u8) -> i32 {
    (i32::from(multiplier as i8) * i32::from(color as i8)) >> 5
}

fn forward_cross_color(pixels: &mut [u32], xsize: usize, bits: u32, codes: &[u32]) {
    let tiles_x = subsample(xsize, bits);
    for (i, pixel) in pixels.iter_mut().enumerate() {
        let (x, y) = (i % xsize, i / xsize);
        let [green_to_red, green_to_blue, red_to_blue, _] =
            codes[(y >> bits) * tiles_x + (x >> bits)].to_le_bytes();
        let [b, g, r, a] = pixel.to_le_bytes();

        let new_red = i32::from(r) - color_delta(green_to_red, g);
        let new_blue = i32::from(b) - color_delta(green_to_blue, g) - color_delta(red_to_blue, r);
        *pixel = u32::from_le_bytes([new_blue as u8, g, new_red as u8, a]);
    }
}

fn collect_palette(pixels: &[u32]) -> Vec<u32> {
    let mut palette = Vec::new();
    for &p in pixels {
        if !palette.contains(&p) {
            palette.push(p);
        }
    }
    palette
}

fn bundle_indices(pixels: &[u32], xsize: usize, bits: u32, palette: &[u32]) -> Vec<u32> {
    let packed_x = subsample(xsize, bits);
    let bits_per_pixel = 8 >> bits;
    let height = pixels.len() / xsize;
    let mut packed = vec![0u32; packed_x * height];
    for (i, &p) in pixels.iter().enumerate() {
        let (x, y) = (i % xsize, i / xsize);
        let index = palette.iter().position(|&c| c == p).unwrap_or(0) as u32;
        let shift = (x & ((1 << bits) - 1)) as u32 * bits_per_pixel;
        packed[y * packed_x + (x >> bits)] |= index << (8 + shift);
    }
    for p in packed.iter_mut() {
        *p |= ARGB_BLACK;
    }
    packed
}

/// Horizontal and vertical ramps with a varying alpha
pub fn gradient(width: u32, height: u32) -> Vec<u32> {
    let (dx, dy) = ((width - 1).max(1), (height - 1).max(1));
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = x * 255 / dx;
            let g = y * 255 / dy;
            let b = ((x + y) * 7) & 0xff;
            let a = 0xff - ((x ^ y) & 0x3f);
            pixels.push((a << 24) | (r << 16) | (g << 8) | b);
        }
    }
    pixels
}

/// Pixels drawn from a few colors in small blocks, like flat artwork
pub fn blocky(width: u32, height: u32, colors: &[u32]) -> Vec<u32> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x / 3 + (y / 2) * 5) as usize))
        .map(|i| colors[i % colors.len()])
        .collect()
}

/// Two alternating colors, so copies overlap their own source
pub fn periodic(width: u32, height: u32) -> Vec<u32> {
    (0..width * height)
        .map(|i| 0xff000010 | ((i % 2) * 0x00ff0000))
        .collect()
}

/// Deterministic pseudo-random pixels
pub fn noise(width: u32, height: u32, seed: u32) -> Vec<u32> {
    let mut state = seed | 1;
    (0..width * height)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        })
        .collect()
}
