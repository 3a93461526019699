//! Huffman tree groups
//!
//! A group holds the five codes used for one region of the image: green
//! (plus backward-reference lengths and color cache indices), red, blue,
//! alpha and distance. The tables live in a shared arena; the group keeps
//! their offsets and a few facts derived from them that let the decoder skip
//! table walks.

use crate::bitreader::BitReader;
use crate::code_lengths::read_code_lengths;
use crate::error::Result;
use crate::huffman::{build_huffman_table, read_symbol, HuffmanCode};
use crate::tables::{
    ALPHABET_SIZE, HUFFMAN_PACKED_BITS, HUFFMAN_PACKED_TABLE_SIZE, HUFFMAN_TABLE_BITS,
    NUM_LITERAL_CODES,
};

/// Green, length and color cache code
pub const GREEN: usize = 0;
/// Red code
pub const RED: usize = 1;
/// Blue code
pub const BLUE: usize = 2;
/// Alpha code
pub const ALPHA: usize = 3;
/// Distance code
pub const DIST: usize = 4;

/// Number of codes in a group
pub const CODES_PER_GROUP: usize = 5;

/// Entry of the combined literal table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedCode {
    /// A whole literal pixel decoded by one lookup
    Literal {
        /// Bits consumed by all four channel codes together
        bits: u8,
        /// The decoded pixel
        argb: u32,
    },
    /// The green code is a length or cache symbol; only it has been consumed
    Deferred {
        /// Bits consumed by the green code
        bits: u8,
        /// The green alphabet symbol
        symbol: u16,
    },
}

impl PackedCode {
    #[inline]
    fn bits(self) -> u32 {
        match self {
            PackedCode::Literal { bits, .. } | PackedCode::Deferred { bits, .. } => u32::from(bits),
        }
    }
}

/// The five Huffman codes of one meta-Huffman region
#[derive(Debug, Clone)]
pub struct HTreeGroup {
    /// Arena offset of each table
    tables: [usize; CODES_PER_GROUP],
    /// Red, blue and alpha each have a single zero-length code
    pub is_trivial_literal: bool,
    /// Additionally green has a single zero-length literal code
    pub is_trivial_code: bool,
    /// Fixed channels of a trivial literal; the whole pixel for a trivial code
    pub literal_arb: u32,
    /// All literal codes fit the combined table
    pub use_packed_table: bool,
    packed_table: Vec<PackedCode>,
}

impl HTreeGroup {
    /// Read the five codes of a group from the stream
    ///
    /// A non-zero `color_cache_bits` extends the green alphabet by the cache
    /// size. `allow_packed` enables the combined literal table.
    pub fn read(
        br: &mut BitReader<'_>,
        arena: &mut Vec<HuffmanCode>,
        color_cache_bits: u32,
        allow_packed: bool,
    ) -> Result<Self> {
        let mut code_lengths: [Vec<u8>; CODES_PER_GROUP] = Default::default();
        for (kind, lengths) in code_lengths.iter_mut().enumerate() {
            *lengths = read_code_lengths(br, alphabet_size(kind, color_cache_bits))?;
        }
        Self::build(arena, &code_lengths, allow_packed)
    }

    /// Build a group from the code lengths of its five codes
    pub fn build(
        arena: &mut Vec<HuffmanCode>,
        code_lengths: &[Vec<u8>; CODES_PER_GROUP],
        allow_packed: bool,
    ) -> Result<Self> {
        let mut tables = [0usize; CODES_PER_GROUP];
        let mut max_bits = 0u32;
        for (kind, lengths) in code_lengths.iter().enumerate() {
            tables[kind] = arena.len();
            build_huffman_table(arena, HUFFMAN_TABLE_BITS, lengths)?;
            if kind != DIST {
                max_bits += u32::from(lengths.iter().copied().max().unwrap_or(0));
            }
        }

        let mut group = Self {
            tables,
            is_trivial_literal: false,
            is_trivial_code: false,
            literal_arb: 0,
            use_packed_table: false,
            packed_table: Vec::new(),
        };

        let root = |kind: usize| arena[tables[kind]];
        group.is_trivial_literal = [RED, BLUE, ALPHA].iter().all(|&kind| root(kind).bits == 0);
        if group.is_trivial_literal {
            let red = u32::from(root(RED).value);
            let blue = u32::from(root(BLUE).value);
            let alpha = u32::from(root(ALPHA).value);
            group.literal_arb = (alpha << 24) | (red << 16) | blue;

            let green = root(GREEN);
            if green.bits == 0 && usize::from(green.value) < NUM_LITERAL_CODES {
                group.is_trivial_code = true;
                group.literal_arb |= u32::from(green.value) << 8;
            }
        }

        group.use_packed_table =
            allow_packed && !group.is_trivial_code && max_bits < HUFFMAN_PACKED_BITS;
        if group.use_packed_table {
            group.packed_table = group.build_packed_table(arena);
        }

        tracing::trace!(
            trivial_literal = group.is_trivial_literal,
            trivial_code = group.is_trivial_code,
            packed = group.use_packed_table,
            "Built Huffman tree group"
        );

        Ok(group)
    }

    /// The table of one code; indices are relative to the returned slice
    #[inline]
    pub fn table<'a>(&self, arena: &'a [HuffmanCode], kind: usize) -> &'a [HuffmanCode] {
        &arena[self.tables[kind]..]
    }

    /// Decode one symbol of the given code
    #[inline]
    pub fn read_symbol(&self, arena: &[HuffmanCode], kind: usize, br: &mut BitReader<'_>) -> u32 {
        read_symbol(self.table(arena, kind), HUFFMAN_TABLE_BITS, br)
    }

    /// Decode through the combined literal table
    ///
    /// Only valid when `use_packed_table` is set.
    #[inline]
    pub fn read_packed(&self, br: &mut BitReader<'_>) -> PackedCode {
        let index = br.peek_bits() as usize & (HUFFMAN_PACKED_TABLE_SIZE - 1);
        let code = self.packed_table[index];
        br.advance(code.bits());
        code
    }

    /// The combined literal table, empty unless `use_packed_table` is set
    pub fn packed_table(&self) -> &[PackedCode] {
        &self.packed_table
    }

    /// Every literal code is short enough that one window of
    /// `HUFFMAN_PACKED_BITS` holds the green, red, blue and alpha codes back
    /// to back, so all four lookups can be done ahead of time.
    fn build_packed_table(&self, arena: &[HuffmanCode]) -> Vec<PackedCode> {
        (0..HUFFMAN_PACKED_TABLE_SIZE)
            .map(|window| {
                let green = self.table(arena, GREEN)[window];
                if usize::from(green.value) >= NUM_LITERAL_CODES {
                    return PackedCode::Deferred {
                        bits: green.bits,
                        symbol: green.value,
                    };
                }

                let mut bits = 0u32;
                let mut argb = 0u32;
                for (kind, shift) in [(GREEN, 8), (RED, 16), (BLUE, 0), (ALPHA, 24)] {
                    let code = self.table(arena, kind)[window >> bits];
                    argb |= u32::from(code.value) << shift;
                    bits += u32::from(code.bits);
                }
                PackedCode::Literal {
                    bits: bits as u8,
                    argb,
                }
            })
            .collect()
    }
}

/// Alphabet size of one code of a group
#[inline]
pub fn alphabet_size(kind: usize, color_cache_bits: u32) -> usize {
    if kind == GREEN && color_cache_bits > 0 {
        ALPHABET_SIZE[kind] + (1 << color_cache_bits)
    } else {
        ALPHABET_SIZE[kind]
    }
}
