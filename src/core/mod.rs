//! Bit-level reading primitives shared by every segment decoder.

use crate::core::idset::BitSet;
use bitstream_io::{BigEndian, BitRead, BitReader, Numeric};
use std::io;
use std::iter::repeat_with;

pub mod base64;
pub mod idset;

pub trait FromDataReader: Sized {
    type Err;

    fn from_data_reader(r: &mut DataReader) -> Result<Self, Self::Err>;
}

/// Sequential reader over one decoded segment, most-significant-bit first,
/// continuous across byte boundaries. Each segment of a consent string gets
/// its own reader with the cursor starting at bit 0.
///
/// Reads past the end of the buffer fail with
/// [`io::ErrorKind::UnexpectedEof`], which the segment decoders surface as a
/// truncated-input error.
pub struct DataReader<'a> {
    bit_reader: BitReader<&'a [u8], BigEndian>,
    len_bits: u64,
    consumed_bits: u64,
}

impl<'a> DataReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bit_reader: BitReader::endian(bytes, BigEndian),
            len_bits: bytes.len() as u64 * 8,
            consumed_bits: 0,
        }
    }

    pub fn parse<F>(&mut self) -> Result<F, <F as FromDataReader>::Err>
    where
        F: FromDataReader,
    {
        FromDataReader::from_data_reader(self)
    }

    pub fn read_bool(&mut self) -> io::Result<bool> {
        let bit = self.bit_reader.read_bit()?;
        self.consumed_bits += 1;
        Ok(bit)
    }

    pub fn read_fixed_integer<N: Numeric>(&mut self, bits: u32) -> io::Result<N> {
        let value = self.bit_reader.read(bits)?;
        self.consumed_bits += u64::from(bits);
        Ok(value)
    }

    /// Bits left before the end of the segment buffer.
    pub fn bits_remaining(&self) -> u64 {
        self.len_bits - self.consumed_bits
    }

    /// Reads `chars` groups of 6 bits, each mapped to `'A' + value`.
    /// Used for the 2-letter language and country codes.
    pub fn read_string(&mut self, chars: usize) -> io::Result<String> {
        repeat_with(|| self.read_fixed_integer::<u8>(6))
            .take(chars)
            .map(|r| r.map(|n| (n + 65) as char))
            .collect::<Result<String, _>>()
    }

    /// Reads a 36-bit timestamp in deciseconds and converts it to
    /// milliseconds since the Unix epoch.
    pub fn read_datetime_as_unix_timestamp_millis(&mut self) -> io::Result<u64> {
        Ok(self.read_fixed_integer::<u64>(36)? * 100)
    }

    /// Reads `width` single-bit flags; bit i-1 set means id i is present.
    pub fn read_fixed_bitfield(&mut self, width: u16) -> io::Result<BitSet> {
        let mut result = BitSet::with_width(width);
        for id in 1..=width {
            if self.read_bool()? {
                result.insert(id);
            }
        }

        Ok(result)
    }
}
