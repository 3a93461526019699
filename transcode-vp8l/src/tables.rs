//! Static lookup tables and format constants for VP8L

/// Number of literal green values
pub const NUM_LITERAL_CODES: usize = 256;

/// Number of backward-reference length prefix codes
pub const NUM_LENGTH_CODES: usize = 24;

/// Number of backward-reference distance prefix codes
pub const NUM_DISTANCE_CODES: usize = 40;

/// Alphabet sizes of the five Huffman codes in a group, before the color
/// cache extends the green alphabet
pub const ALPHABET_SIZE: [usize; 5] = [
    NUM_LITERAL_CODES + NUM_LENGTH_CODES,
    NUM_LITERAL_CODES,
    NUM_LITERAL_CODES,
    NUM_LITERAL_CODES,
    NUM_DISTANCE_CODES,
];

/// Root table width for the five main Huffman codes
pub const HUFFMAN_TABLE_BITS: u32 = 8;

/// Root table width for the code-length code
pub const LENGTHS_TABLE_BITS: u32 = 7;

/// Longest code length the format allows
pub const MAX_ALLOWED_CODE_LENGTH: usize = 15;

/// Size of the code-length code alphabet
pub const NUM_CODE_LENGTH_CODES: usize = 19;

/// Transmission order of the code-length code lengths
pub const CODE_LENGTH_CODE_ORDER: [usize; NUM_CODE_LENGTH_CODES] = [
    17, 18, 0, 1, 2, 3, 4, 5, 16, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// First code-length symbol that is a repeat instruction rather than a length
pub const CODE_LENGTH_LITERALS: u32 = 16;

/// Length repeated by symbol 16 before any non-zero length was seen
pub const DEFAULT_CODE_LENGTH: u8 = 8;

/// Extra bits read by repeat symbols 16, 17, 18
pub const CODE_LENGTH_EXTRA_BITS: [u32; 3] = [2, 3, 7];

/// Base repeat counts of repeat symbols 16, 17, 18
pub const CODE_LENGTH_REPEAT_OFFSETS: [usize; 3] = [3, 3, 11];

/// Largest permitted color cache bit count
pub const MAX_COLOR_CACHE_BITS: u32 = 11;

/// Multiplier of the color cache hash
pub const COLOR_CACHE_HASH_MUL: u32 = 0x1e35a7bd;

/// Window width of the combined literal table
pub const HUFFMAN_PACKED_BITS: u32 = 6;

/// Number of entries in the combined literal table
pub const HUFFMAN_PACKED_TABLE_SIZE: usize = 1 << HUFFMAN_PACKED_BITS;

/// Largest number of transforms one image may declare
pub const NUM_TRANSFORMS: usize = 4;

/// Opaque black, the predictor of the top-left pixel
pub const ARGB_BLACK: u32 = 0xff00_0000;

/// Width and height limit encoded in the 14-bit VP8L header fields
pub const MAX_DIMENSION: u32 = 1 << 14;

/// 2D neighbourhood offsets `(dx, dy)` for plane codes 1..=120
///
/// The linear distance is `dx + dy * xsize`, clamped to at least 1.
pub static DISTANCE_MAP: [(i8, i8); 120] = [
    (0, 1), (1, 0), (1, 1), (-1, 1), (0, 2), (2, 0), (1, 2), (-1, 2),
    (2, 1), (-2, 1), (2, 2), (-2, 2), (0, 3), (3, 0), (1, 3), (-1, 3),
    (3, 1), (-3, 1), (2, 3), (-2, 3), (3, 2), (-3, 2), (0, 4), (4, 0),
    (1, 4), (-1, 4), (4, 1), (-4, 1), (3, 3), (-3, 3), (2, 4), (-2, 4),
    (4, 2), (-4, 2), (0, 5), (3, 4), (-3, 4), (4, 3), (-4, 3), (5, 0),
    (1, 5), (-1, 5), (5, 1), (-5, 1), (2, 5), (-2, 5), (5, 2), (-5, 2),
    (4, 4), (-4, 4), (3, 5), (-3, 5), (5, 3), (-5, 3), (0, 6), (6, 0),
    (1, 6), (-1, 6), (6, 1), (-6, 1), (2, 6), (-2, 6), (6, 2), (-6, 2),
    (4, 5), (-4, 5), (5, 4), (-5, 4), (3, 6), (-3, 6), (6, 3), (-6, 3),
    (0, 7), (7, 0), (1, 7), (-1, 7), (5, 5), (-5, 5), (7, 1), (-7, 1),
    (4, 6), (-4, 6), (6, 4), (-6, 4), (2, 7), (-2, 7), (7, 2), (-7, 2),
    (3, 7), (-3, 7), (7, 3), (-7, 3), (5, 6), (-5, 6), (6, 5), (-6, 5),
    (8, 0), (4, 7), (-4, 7), (7, 4), (-7, 4), (8, 1), (8, 2), (6, 6),
    (-6, 6), (8, 3), (5, 7), (-5, 7), (7, 5), (-7, 5), (8, 4), (6, 7),
    (-6, 7), (7, 6), (-7, 6), (8, 5), (7, 7), (-7, 7), (8, 6), (8, 7),
];

/// Number of entries in [`DISTANCE_MAP`]
pub const NUM_PLANE_CODES: u32 = DISTANCE_MAP.len() as u32;
