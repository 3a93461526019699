//! Color cache
//!
//! A small hash table of recently emitted ARGB colors. The decoder inserts
//! every pixel it produces, in order, and a cache symbol in the stream names
//! a slot directly instead of spelling the color out.

use crate::error::{Result, Vp8lError};
use crate::tables::{COLOR_CACHE_HASH_MUL, MAX_COLOR_CACHE_BITS};

/// Color cache of `2^cache_bits` slots
#[derive(Debug, Clone)]
pub struct ColorCache {
    colors: Vec<u32>,
    hash_shift: u32,
    cache_bits: u32,
}

impl ColorCache {
    /// Create an empty cache
    ///
    /// `cache_bits` must be in `1..=11`.
    pub fn new(cache_bits: u32) -> Result<Self> {
        if !(1..=MAX_COLOR_CACHE_BITS).contains(&cache_bits) {
            return Err(Vp8lError::InvalidColorCacheBits(cache_bits));
        }

        Ok(Self {
            colors: vec![0u32; 1 << cache_bits],
            hash_shift: 32 - cache_bits,
            cache_bits,
        })
    }

    /// Number of index bits
    #[inline]
    pub fn bits(&self) -> u32 {
        self.cache_bits
    }

    /// Number of slots
    #[inline]
    pub fn size(&self) -> usize {
        self.colors.len()
    }

    /// Slot a color hashes to
    #[inline]
    pub fn hash_index(&self, color: u32) -> usize {
        (COLOR_CACHE_HASH_MUL.wrapping_mul(color) >> self.hash_shift) as usize
    }

    /// Store a color, overwriting whatever shared its slot
    #[inline]
    pub fn insert(&mut self, color: u32) {
        let index = self.hash_index(color);
        self.colors[index] = color;
    }

    /// Color stored in slot `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`size`](Self::size).
    #[inline]
    pub fn lookup(&self, index: usize) -> u32 {
        self.colors[index]
    }

    /// Insert every color of `pixels` in order
    pub fn insert_all(&mut self, pixels: &[u32]) {
        for &color in pixels {
            self.insert(color);
        }
    }
}
