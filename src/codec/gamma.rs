//! Elias-gamma codes over packed bits
//!
//! A positive integer `n` with `k = floor(log2(n))` is written as `k` zero
//! bits, a terminating one bit, then the `k` bits of `n` below its leading
//! one. Codes are self-delimiting, so a sequence is a plain concatenation.
//!
//! Decoding stops quietly when the input runs out before a terminator or
//! mid-mantissa; this is how zero padding at the end of a packed stream is
//! skipped.

use super::bits::{BitReader, BitWriter};
use crate::error::{IndexError, Result};

/// Longest zero prefix that still fits a `u32`
const MAX_PREFIX: u32 = 31;

/// Number of bits the gamma code of `value` occupies (`2k + 1`)
pub fn encoded_len(value: u32) -> u32 {
    debug_assert!(value > 0);
    2 * value.ilog2() + 1
}

/// Append the gamma code of `value`
pub fn encode(value: u32, out: &mut BitWriter) -> Result<()> {
    if value == 0 {
        return Err(IndexError::InvalidValue(0));
    }
    let k = value.ilog2();
    out.write_zeros(k);
    out.write_bit(true);
    out.write_bits(value, k);
    Ok(())
}

/// Encode every value of `values`, in order, into one bit stream
pub fn encode_all<I>(values: I) -> Result<BitWriter>
where
    I: IntoIterator<Item = u32>,
{
    let mut out = BitWriter::new();
    for value in values {
        encode(value, &mut out)?;
    }
    Ok(out)
}

/// Decode a single value from `reader`
///
/// Returns `None` once no complete code remains.
pub fn decode(reader: &mut BitReader<'_>) -> Option<u32> {
    let mut k = 0u32;
    loop {
        match reader.read_bit()? {
            true => break,
            false => {
                k += 1;
                if k > MAX_PREFIX {
                    return None;
                }
            }
        }
    }
    let mantissa = reader.read_bits(k)?;
    Some((1u32 << k) | mantissa)
}

/// Iterator over the gamma-coded values of a bit stream
#[derive(Clone, Debug)]
pub struct GammaDecoder<'a> {
    reader: BitReader<'a>,
}

impl<'a> GammaDecoder<'a> {
    pub fn new(bytes: &'a [u8], bit_len: u64) -> Self {
        Self {
            reader: BitReader::new(bytes, bit_len),
        }
    }

    /// Decode all of `bytes`; trailing padding ends the sequence
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            reader: BitReader::from_bytes(bytes),
        }
    }
}

impl Iterator for GammaDecoder<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        decode(&mut self.reader)
    }
}
