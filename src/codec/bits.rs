//! MSB-first bit packing, eight logical bits per byte.
//!
//! The final byte is zero-padded. Readers built with [`BitReader::from_bytes`]
//! see the padding as trailing zero bits.

/// Append-only bit buffer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_bits(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            bit_len: 0,
        }
    }

    /// Append a single bit
    pub fn write_bit(&mut self, bit: bool) {
        let offset = (self.bit_len % 8) as u8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    /// Append `count` zero bits
    pub fn write_zeros(&mut self, count: u32) {
        for _ in 0..count {
            self.write_bit(false);
        }
    }

    /// Append the low `count` bits of `value`, most significant first
    pub fn write_bits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32);
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Number of logical bits written
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Render the logical bits as `'0'`/`'1'` symbols
    pub fn to_symbols(&self) -> String {
        render_bits(&self.bytes, self.bit_len)
    }
}

/// Render the first `bit_len` bits of `bytes` as `'0'`/`'1'` symbols
pub fn render_bits(bytes: &[u8], bit_len: u64) -> String {
    let mut reader = BitReader::new(bytes, bit_len);
    let mut out = String::with_capacity(reader.remaining() as usize);
    while let Some(bit) = reader.read_bit() {
        out.push(if bit { '1' } else { '0' });
    }
    out
}

/// Sequential reader over packed bits
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_len: u64,
    pos: u64,
}

impl<'a> BitReader<'a> {
    /// Read at most `bit_len` bits (clamped to the bytes available)
    pub fn new(bytes: &'a [u8], bit_len: u64) -> Self {
        Self {
            bytes,
            bit_len: bit_len.min(bytes.len() as u64 * 8),
            pos: 0,
        }
    }

    /// Read every bit of `bytes`, padding included
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(bytes, bytes.len() as u64 * 8)
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        if self.pos >= self.bit_len {
            return None;
        }
        let byte = self.bytes[(self.pos / 8) as usize];
        let bit = byte & (0x80 >> (self.pos % 8)) != 0;
        self.pos += 1;
        Some(bit)
    }

    /// Read `count` bits as an unsigned value, most significant first
    pub fn read_bits(&mut self, count: u32) -> Option<u32> {
        debug_assert!(count <= 32);
        if self.remaining() < u64::from(count) {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..count {
            let bit = self.read_bit()?;
            value = (value << 1) | u32::from(bit);
        }
        Some(value)
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn remaining(&self) -> u64 {
        self.bit_len - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.bit_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_msb_first() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3);
        writer.write_zeros(2);
        writer.write_bit(true);

        assert_eq!(writer.bit_len(), 6);
        assert_eq!(writer.as_bytes(), &[0b1010_0100]);
        assert_eq!(writer.to_symbols(), "101001");
    }

    #[test]
    fn test_spans_byte_boundary() {
        let mut writer = BitWriter::new();
        writer.write_bits(0x1FF, 9);
        assert_eq!(writer.as_bytes(), &[0xFF, 0x80]);

        let mut reader = BitReader::new(writer.as_bytes(), writer.bit_len());
        assert_eq!(reader.read_bits(9), Some(0x1FF));
        assert!(reader.is_exhausted());
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn test_reader_respects_bit_len() {
        let bytes = [0b1100_0000];
        let mut reader = BitReader::new(&bytes, 2);
        assert_eq!(reader.read_bits(3), None);
        assert_eq!(reader.read_bits(2), Some(0b11));

        let mut padded = BitReader::from_bytes(&bytes);
        assert_eq!(padded.read_bits(8), Some(0b1100_0000));
    }

    #[test]
    fn test_render_clamps_inflated_bit_len() {
        assert_eq!(render_bits(&[0b1010_0000], u64::MAX), "10100000");
        assert_eq!(render_bits(&[], 1 << 40), "");
    }

    #[test]
    fn test_empty_writer() {
        let writer = BitWriter::new();
        assert!(writer.is_empty());
        assert_eq!(writer.to_symbols(), "");
        assert!(BitReader::from_bytes(&[]).read_bit().is_none());
    }
}
