//! Bit-level codecs for postings compression.

mod bits;
pub mod gamma;

pub use bits::{render_bits, BitReader, BitWriter};
pub use gamma::GammaDecoder;
