//! Canonical Huffman lookup tables
//!
//! A table is a root level of `2^root_bits` entries indexed by the next
//! `root_bits` stream bits. Codes longer than the root width resolve through
//! a second-level table that lives in the same flat array, after the root.
//! Every table of an image is appended to one shared arena and addressed by
//! offset, so a root entry links to its second level by a relative index
//! rather than a pointer.

use crate::bitreader::BitReader;
use crate::error::{Result, Vp8lError};
use crate::tables::MAX_ALLOWED_CODE_LENGTH;

/// A single lookup table entry
///
/// In a root table, `bits` larger than the root width marks a link: `value`
/// is then the distance from this entry to its second-level table and
/// `bits - root_bits` is that table's index width. Otherwise `bits` is the
/// number of stream bits the code occupies and `value` the decoded symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanCode {
    /// Bits consumed by this entry
    pub bits: u8,
    /// Symbol, or link offset for root entries
    pub value: u16,
}

/// Build a canonical Huffman table from per-symbol code lengths
///
/// The table is appended to `arena`. Returns the number of entries written,
/// which is `2^root_bits` plus the size of every second-level table. On
/// failure the arena is left as it was and the code is reported malformed:
/// a length above 15, no symbol at all, or an over-subscribed code
/// (`Σ 2^-len > 1`). Incomplete codes are accepted.
pub fn build_huffman_table(
    arena: &mut Vec<HuffmanCode>,
    root_bits: u32,
    code_lengths: &[u8],
) -> Result<usize> {
    let start = arena.len();
    let result = fill_table(arena, start, root_bits as usize, code_lengths);
    if result.is_err() {
        arena.truncate(start);
    }
    result
}

fn fill_table(
    arena: &mut Vec<HuffmanCode>,
    start: usize,
    root_bits: usize,
    code_lengths: &[u8],
) -> Result<usize> {
    let mut counts = [0usize; MAX_ALLOWED_CODE_LENGTH + 1];
    for &len in code_lengths {
        let len = usize::from(len);
        if len > MAX_ALLOWED_CODE_LENGTH {
            return Err(Vp8lError::MalformedHuffmanTable(format!(
                "code length {} exceeds {}",
                len, MAX_ALLOWED_CODE_LENGTH
            )));
        }
        counts[len] += 1;
    }

    if counts[0] == code_lengths.len() {
        return Err(Vp8lError::MalformedHuffmanTable(
            "all code lengths are zero".into(),
        ));
    }

    let mut offsets = [0usize; MAX_ALLOWED_CODE_LENGTH + 1];
    for len in 1..MAX_ALLOWED_CODE_LENGTH {
        if counts[len] > 1 << len {
            return Err(oversubscribed(len));
        }
        offsets[len + 1] = offsets[len] + counts[len];
    }

    // Symbols sorted by code length, by symbol order within one length
    let mut sorted = vec![0u16; code_lengths.len()];
    for (symbol, &len) in code_lengths.iter().enumerate() {
        if len > 0 {
            let len = usize::from(len);
            sorted[offsets[len]] = symbol as u16;
            offsets[len] += 1;
        }
    }

    let root_size = 1usize << root_bits;
    arena.resize(start + root_size, HuffmanCode::default());

    if offsets[MAX_ALLOWED_CODE_LENGTH] == 1 {
        let code = HuffmanCode {
            bits: 0,
            value: sorted[0],
        };
        replicate_value(&mut arena[start..], 1, root_size, code);
        return Ok(root_size);
    }

    let mut total_size = root_size;
    let mask = root_size - 1;
    let mut key = 0usize;
    let mut num_open = 1isize;
    let mut symbol = 0usize;

    let mut step = 2;
    for len in 1..=root_bits {
        num_open = (num_open << 1) - counts[len] as isize;
        if num_open < 0 {
            return Err(oversubscribed(len));
        }
        for _ in 0..counts[len] {
            let code = HuffmanCode {
                bits: len as u8,
                value: sorted[symbol],
            };
            symbol += 1;
            replicate_value(&mut arena[start + key..], step, root_size, code);
            key = get_next_key(key, len);
        }
        step <<= 1;
    }

    let mut table_offset = start;
    let mut table_size = root_size;
    let mut low = usize::MAX;

    let mut step = 2;
    for len in root_bits + 1..=MAX_ALLOWED_CODE_LENGTH {
        num_open = (num_open << 1) - counts[len] as isize;
        if num_open < 0 {
            return Err(oversubscribed(len));
        }
        while counts[len] > 0 {
            if key & mask != low {
                table_offset += table_size;
                let table_bits = next_table_bit_size(&counts, len, root_bits);
                table_size = 1 << table_bits;
                total_size += table_size;
                arena.resize(start + total_size, HuffmanCode::default());

                low = key & mask;
                arena[start + low] = HuffmanCode {
                    bits: (table_bits + root_bits) as u8,
                    value: (table_offset - start - low) as u16,
                };
            }

            let code = HuffmanCode {
                bits: (len - root_bits) as u8,
                value: sorted[symbol],
            };
            symbol += 1;
            replicate_value(
                &mut arena[table_offset + (key >> root_bits)..],
                step,
                table_size,
                code,
            );
            key = get_next_key(key, len);
            counts[len] -= 1;
        }
        step <<= 1;
    }

    Ok(total_size)
}

fn oversubscribed(len: usize) -> Vp8lError {
    Vp8lError::MalformedHuffmanTable(format!("over-subscribed code at length {}", len))
}

/// Next `len`-bit key in bit-reversed counting order
///
/// Codes are read least-significant bit first, so consecutive canonical
/// codes sit at bit-reversed table positions.
#[inline]
fn get_next_key(key: usize, len: usize) -> usize {
    let mut step = 1 << (len - 1);
    while key & step != 0 {
        step >>= 1;
    }
    if step != 0 {
        (key & (step - 1)) + step
    } else {
        key
    }
}

/// Store `code` at `table[0]`, `table[step]`, ... below `end`
#[inline]
fn replicate_value(table: &mut [HuffmanCode], step: usize, mut end: usize, code: HuffmanCode) {
    loop {
        end -= step;
        table[end] = code;
        if end == 0 {
            break;
        }
    }
}

/// Index width of the second-level table that starts at code length `len`
fn next_table_bit_size(
    counts: &[usize; MAX_ALLOWED_CODE_LENGTH + 1],
    mut len: usize,
    root_bits: usize,
) -> usize {
    let mut left = 1isize << (len - root_bits);
    while len < MAX_ALLOWED_CODE_LENGTH {
        left -= counts[len] as isize;
        if left <= 0 {
            break;
        }
        len += 1;
        left <<= 1;
    }
    len - root_bits
}

/// Decode one symbol with a table built for `root_bits`
///
/// The reader must hold at least 15 prefetched bits, so callers `refill`
/// beforehand.
#[inline]
pub fn read_symbol(table: &[HuffmanCode], root_bits: u32, br: &mut BitReader<'_>) -> u32 {
    let window = br.peek_bits() as usize;
    let mut index = window & ((1 << root_bits) - 1);
    let mut entry = table[index];

    let bits = u32::from(entry.bits);
    if bits > root_bits {
        br.advance(root_bits);
        let sub_bits = bits - root_bits;
        index += usize::from(entry.value) + ((window >> root_bits) & ((1 << sub_bits) - 1));
        entry = table[index];
    }

    br.advance(u32::from(entry.bits));
    u32::from(entry.value)
}
