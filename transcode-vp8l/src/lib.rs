//! # transcode-vp8l
//!
//! A decoder for VP8L, the lossless bitstream of WebP.
//!
//! ## Features
//!
//! - Canonical Huffman codes with two-level lookup tables
//! - Meta-Huffman images selecting a code group per tile
//! - LZ77 backward references with 2D distance codes
//! - Color cache
//! - Predictor, cross-color, subtract-green and color indexing transforms
//!
//! ## Decoding Example
//!
//! ```rust,no_run
//! use transcode_vp8l::Vp8lDecoder;
//!
//! let chunk = std::fs::read("image.vp8l").unwrap();
//! let decoder = Vp8lDecoder::new(&chunk).unwrap();
//! let image = decoder.decode().unwrap();
//! println!("{}x{}", image.width(), image.height());
//! ```
//!
//! ## Headerless Streams
//!
//! When the container already knows the dimensions, the entropy-coded stream
//! can be decoded directly:
//!
//! ```rust,no_run
//! use transcode_vp8l::{decode_lossless, LosslessInput, Vp8lDecoderConfig};
//!
//! # let payload: Vec<u8> = Vec::new();
//! let input = LosslessInput {
//!     width: 64,
//!     height: 64,
//!     payload: &payload,
//!     color_cache_bits: None,
//! };
//! let argb = decode_lossless(&input, &Vp8lDecoderConfig::default()).unwrap();
//! assert_eq!(argb.len(), 64 * 64);
//! ```

pub mod bitreader;
pub mod code_lengths;
pub mod color_cache;
pub mod decoder;
pub mod error;
pub mod htree_group;
pub mod huffman;
pub mod meta_huffman;
pub mod tables;
pub mod transform;
pub mod vp8l;


pub use decoder::{decode_lossless, LosslessDecoder, LosslessInput, Vp8lDecoderConfig};
pub use error::{Result, Vp8lError};
pub use transform::{Transform, TransformPipeline, TransformType};
pub use vp8l::{decode_alpha_plane, Vp8lDecoder, Vp8lHeader};
