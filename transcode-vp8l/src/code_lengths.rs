//! Code-length decoding for one Huffman code
//!
//! Each of the five codes of a group is transmitted as an array of code
//! lengths, in one of two forms:
//!
//! - simple: one or two symbols of length 1, everything else absent
//! - normal: the lengths are themselves Huffman coded with a 19-symbol
//!   code-length code, where 16, 17 and 18 are run-length instructions

use crate::bitreader::BitReader;
use crate::error::{Result, Vp8lError};
use crate::huffman::{build_huffman_table, read_symbol};
use crate::tables::{
    CODE_LENGTH_CODE_ORDER, CODE_LENGTH_EXTRA_BITS, CODE_LENGTH_LITERALS,
    CODE_LENGTH_REPEAT_OFFSETS, DEFAULT_CODE_LENGTH, LENGTHS_TABLE_BITS, NUM_CODE_LENGTH_CODES,
};

/// Read the code-length array of a code over `alphabet_size` symbols
///
/// Running out of data is not reported here: the reader's end-of-stream flag
/// is left for the caller to check once the whole group has been read.
pub fn read_code_lengths(br: &mut BitReader<'_>, alphabet_size: usize) -> Result<Vec<u8>> {
    if br.read_bit() {
        read_simple_code_lengths(br, alphabet_size)
    } else {
        read_normal_code_lengths(br, alphabet_size)
    }
}

fn read_simple_code_lengths(br: &mut BitReader<'_>, alphabet_size: usize) -> Result<Vec<u8>> {
    let mut code_lengths = vec![0u8; alphabet_size];

    let num_symbols = br.read_bits(1) + 1;
    let first_symbol_bits = if br.read_bit() { 8 } else { 1 };
    let mut symbols = [br.read_bits(first_symbol_bits), 0];
    if num_symbols == 2 {
        symbols[1] = br.read_bits(8);
    }

    for &symbol in &symbols[..num_symbols as usize] {
        let slot = code_lengths.get_mut(symbol as usize).ok_or_else(|| {
            Vp8lError::MalformedHuffmanTable(format!(
                "simple code symbol {} outside alphabet of {}",
                symbol, alphabet_size
            ))
        })?;
        *slot = 1;
    }

    Ok(code_lengths)
}

fn read_normal_code_lengths(br: &mut BitReader<'_>, alphabet_size: usize) -> Result<Vec<u8>> {
    let num_codes = br.read_bits(4) as usize + 4;
    if num_codes > NUM_CODE_LENGTH_CODES {
        return Err(Vp8lError::MalformedHuffmanTable(format!(
            "{} code length codes, at most {} allowed",
            num_codes, NUM_CODE_LENGTH_CODES
        )));
    }

    let mut code_length_code_lengths = [0u8; NUM_CODE_LENGTH_CODES];
    for &symbol in &CODE_LENGTH_CODE_ORDER[..num_codes] {
        code_length_code_lengths[symbol] = br.read_bits(3) as u8;
    }

    decode_code_lengths(br, &code_length_code_lengths, alphabet_size)
}

/// Decode code lengths using the code-length code given by its own lengths
fn decode_code_lengths(
    br: &mut BitReader<'_>,
    code_length_code_lengths: &[u8; NUM_CODE_LENGTH_CODES],
    alphabet_size: usize,
) -> Result<Vec<u8>> {
    let mut table = Vec::new();
    build_huffman_table(&mut table, LENGTHS_TABLE_BITS, code_length_code_lengths)?;

    let mut max_symbol = if br.read_bit() {
        let length_nbits = 2 + 2 * br.read_bits(3);
        let max_symbol = 2 + br.read_bits(length_nbits) as usize;
        if max_symbol > alphabet_size {
            return Err(Vp8lError::MalformedHuffmanTable(format!(
                "max symbol {} exceeds alphabet of {}",
                max_symbol, alphabet_size
            )));
        }
        max_symbol
    } else {
        alphabet_size
    };

    let mut code_lengths = vec![0u8; alphabet_size];
    let mut prev_code_len = DEFAULT_CODE_LENGTH;
    let mut symbol = 0;

    while symbol < alphabet_size && max_symbol > 0 {
        max_symbol -= 1;
        if br.is_end_of_stream() {
            break;
        }

        br.refill();
        let code_len = read_symbol(&table, LENGTHS_TABLE_BITS, br);
        if code_len < CODE_LENGTH_LITERALS {
            code_lengths[symbol] = code_len as u8;
            symbol += 1;
            if code_len != 0 {
                prev_code_len = code_len as u8;
            }
            continue;
        }

        let slot = (code_len - CODE_LENGTH_LITERALS) as usize;
        let repeat = br.read_bits(CODE_LENGTH_EXTRA_BITS[slot]) as usize
            + CODE_LENGTH_REPEAT_OFFSETS[slot];
        if symbol + repeat > alphabet_size {
            return Err(Vp8lError::RepeatOverrun {
                position: symbol,
                repeat,
                alphabet_size,
            });
        }

        let value = if slot == 0 { prev_code_len } else { 0 };
        code_lengths[symbol..symbol + repeat].fill(value);
        symbol += repeat;
    }

    Ok(code_lengths)
}
