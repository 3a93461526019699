//! Prefetching bit reader for the VP8L bitstream
//!
//! VP8L delivers bits least-significant first. The reader keeps a 64-bit
//! window of upcoming bits so a Huffman lookup can peek at the next symbol
//! before it knows how many bits that symbol occupies.
//!
//! Running off the end of the data never fails a read: the reader raises a
//! sticky end-of-stream flag and returns zeros from then on. The decoder
//! checks the flag after each symbol and turns it into a truncation error.

use byteorder::{ByteOrder, LittleEndian};

/// Width of the prefetch window in bits
const LBITS: u32 = 64;

/// Once this many bits of the window are consumed, `refill` pulls in more bytes
const WBITS: u32 = 32;

/// Largest bit count a single `read_bits` call accepts
pub const MAX_NUM_BIT_READ: u32 = 24;

const BIT_MASK: [u32; MAX_NUM_BIT_READ as usize + 1] = [
    0x000000, 0x000001, 0x000003, 0x000007, 0x00000f, 0x00001f, 0x00003f, 0x00007f, 0x0000ff,
    0x0001ff, 0x0003ff, 0x0007ff, 0x000fff, 0x001fff, 0x003fff, 0x007fff, 0x00ffff, 0x01ffff,
    0x03ffff, 0x07ffff, 0x0fffff, 0x1fffff, 0x3fffff, 0x7fffff, 0xffffff,
];

/// A bit-level reader over a fully buffered VP8L payload
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Prefetch window; bit 0 is the oldest unread bit once shifted by `bit_pos`
    value: u64,
    /// Next byte of `data` to load into the window
    pos: usize,
    /// Number of window bits already consumed
    bit_pos: u32,
    /// Total bits consumed since the start of the payload
    consumed: u64,
    eos: bool,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader and prime the window with up to 8 bytes
    pub fn new(data: &'a [u8]) -> Self {
        let primed = data.len().min(8);
        let value = if primed == 0 {
            0
        } else {
            LittleEndian::read_uint(&data[..primed], primed)
        };

        Self {
            data,
            value,
            pos: primed,
            bit_pos: 0,
            consumed: 0,
            eos: false,
        }
    }

    /// Total number of bits in the payload
    #[inline]
    pub fn total_bits(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    /// Number of bits consumed so far
    #[inline]
    pub fn bits_consumed(&self) -> u64 {
        self.consumed
    }

    /// Number of payload bits not yet consumed
    #[inline]
    pub fn bits_remaining(&self) -> u64 {
        self.total_bits().saturating_sub(self.consumed)
    }

    /// Read `n` bits (at most 24) and consume them
    ///
    /// Returns zero and raises the end-of-stream flag if the read would run
    /// past the end of the payload.
    pub fn read_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= MAX_NUM_BIT_READ, "read of {n} bits");
        if self.eos || self.consumed + u64::from(n) > self.total_bits() {
            self.set_end_of_stream();
            return 0;
        }

        let value = self.peek_bits() & BIT_MASK[n as usize];
        self.bit_pos += n;
        self.consumed += u64::from(n);
        self.shift_bytes();
        value
    }

    /// Read a single bit as a flag
    #[inline]
    pub fn read_bit(&mut self) -> bool {
        self.read_bits(1) != 0
    }

    /// The current prefetch window, without consuming anything
    ///
    /// Only the low bits that the caller is about to decode are meaningful;
    /// at least 24 are valid after a `refill`.
    #[inline]
    pub fn peek_bits(&self) -> u32 {
        if self.eos || self.bit_pos >= LBITS {
            0
        } else {
            (self.value >> self.bit_pos) as u32
        }
    }

    /// Consume `n` bits that were already inspected through `peek_bits`
    #[inline]
    pub fn advance(&mut self, n: u32) {
        if self.eos {
            return;
        }
        self.bit_pos += n;
        self.consumed += u64::from(n);
        if self.consumed > self.total_bits() {
            self.set_end_of_stream();
        }
    }

    /// Pull whole bytes into the window once half of it has been consumed
    ///
    /// Must run at least once per two Huffman symbol reads so that a peek
    /// always sees a full symbol.
    #[inline]
    pub fn refill(&mut self) {
        if self.bit_pos >= WBITS {
            self.shift_bytes();
        }
    }

    /// Whether a read has run past the end of the payload (sticky)
    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        self.eos
    }

    fn shift_bytes(&mut self) {
        while self.bit_pos >= 8 && self.pos < self.data.len() {
            self.value >>= 8;
            self.value |= u64::from(self.data[self.pos]) << (LBITS - 8);
            self.pos += 1;
            self.bit_pos -= 8;
        }
    }

    fn set_end_of_stream(&mut self) {
        self.eos = true;
        self.bit_pos = 0;
    }
}
