#![no_main]

//! Fuzz target for VP8L lossless decoding.
//!
//! Tests chunk header parsing, headerless stream decoding with a declared
//! color cache size, and the packed literal table against the plain path.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use transcode_vp8l::{decode_lossless, LosslessInput, Vp8lDecoder, Vp8lDecoderConfig};

#[derive(Arbitrary, Debug)]
struct Vp8lInput {
    data: Vec<u8>,
    width: u16,
    height: u16,
    color_cache_bits: Option<u8>,
    test_mode: Vp8lTestMode,
}

#[derive(Arbitrary, Debug)]
enum Vp8lTestMode {
    /// Parse a full chunk and decode it
    Chunk,
    /// Decode a headerless stream
    Stream,
    /// Compare packed and plain table decoding
    PackedTables,
}

const MAX_DIMENSION: u32 = 512;

fuzz_target!(|input: Vp8lInput| {
    // Limit input size
    if input.data.len() > 1024 * 1024 {
        return;
    }

    let width = u32::from(input.width) % MAX_DIMENSION + 1;
    let height = u32::from(input.height) % MAX_DIMENSION + 1;

    match input.test_mode {
        Vp8lTestMode::Chunk => {
            if let Ok(decoder) = Vp8lDecoder::new(&input.data) {
                let _ = decoder.header();
                let decoder = decoder.max_dimensions(MAX_DIMENSION, MAX_DIMENSION);
                if let Ok(image) = decoder.decode() {
                    let (w, h) = decoder.dimensions();
                    assert_eq!(image.dimensions(), (w, h));
                }
            }
        }
        Vp8lTestMode::Stream => {
            let stream = LosslessInput {
                width,
                height,
                payload: &input.data,
                color_cache_bits: input.color_cache_bits,
            };
            if let Ok(pixels) = decode_lossless(&stream, &Vp8lDecoderConfig::default()) {
                assert_eq!(pixels.len(), (width * height) as usize);
            }
        }
        Vp8lTestMode::PackedTables => {
            let stream = LosslessInput {
                width,
                height,
                payload: &input.data,
                color_cache_bits: None,
            };
            let packed = decode_lossless(&stream, &Vp8lDecoderConfig::default());
            let plain = decode_lossless(
                &stream,
                &Vp8lDecoderConfig {
                    use_packed_tables: false,
                    ..Default::default()
                },
            );
            // Both paths must agree on success and on the pixels produced
            match (packed, plain) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(_), Err(_)) => {}
                (a, b) => panic!("packed {:?} != plain {:?}", a.is_ok(), b.is_ok()),
            }
        }
    }
});
