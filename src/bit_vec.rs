use base64::{engine::general_purpose, Engine as _};

use crate::error::{HuffmanError, Result};

/// Growable bit string, packed MSB-first into bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVec {
    bits: Vec<u8>,
    bit_count: usize,
}

impl BitVec {
    pub fn new() -> Self {
        BitVec {
            bits: Vec::new(),
            bit_count: 0,
        }
    }

    pub fn with_capacity(bits: usize) -> Self {
        BitVec {
            bits: Vec::with_capacity(bits.div_ceil(8)),
            bit_count: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    pub fn push_bit(&mut self, bit: bool) {
        let byte_index = self.bit_count / 8; // which byte is target?
        let bit_offset = self.bit_count % 8; // which bit position is target?

        // make a new byte if needed
        if byte_index >= self.bits.len() {
            self.bits.push(0);
        }

        if bit {
            self.bits[byte_index] |= 1 << (7 - bit_offset);
        }

        self.bit_count += 1;
    }

    /// Append a whole code, first bit first.
    pub fn push_code(&mut self, code: &[bool]) {
        for &bit in code {
            self.push_bit(bit);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_count).map(move |i| self.bits[i / 8] & (1 << (7 - i % 8)) != 0)
    }

    /// Zero-padded bytes as standard base64. The bit count is not included.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.as_bytes())
    }

    /// Inverse of [`BitVec::to_base64`]: keep exactly `bit_count` leading bits.
    pub fn from_base64(encoded: &str, bit_count: usize) -> Result<Self> {
        let bytes = general_purpose::STANDARD.decode(encoded)?;
        Self::from_bytes(bytes, bit_count)
    }

    /// Rebuild from packed bytes. The byte count must match `bit_count` exactly;
    /// padding bits past `bit_count` are cleared.
    pub fn from_bytes(mut bits: Vec<u8>, bit_count: usize) -> Result<Self> {
        let expected = bit_count.div_ceil(8);
        if bits.len() != expected {
            return Err(HuffmanError::corrupt_payload(format!(
                "expected {} packed bytes for {} bits, found {}",
                expected,
                bit_count,
                bits.len()
            )));
        }
        let tail = bit_count % 8;
        if tail != 0 {
            if let Some(last) = bits.last_mut() {
                *last &= 0xFFu8 << (8 - tail);
            }
        }
        Ok(BitVec { bits, bit_count })
    }
}

impl Default for BitVec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BitVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_str_bits(s: &str) -> BitVec {
        let mut bv = BitVec::new();
        for c in s.chars() {
            bv.push_bit(c == '1');
        }
        bv
    }

    #[test]
    fn test_msb_first_packing() {
        let bv = from_str_bits("1010000011");
        assert_eq!(bv.bit_count(), 10);
        assert_eq!(bv.as_bytes(), &[0b1010_0000, 0b1100_0000]);
        assert_eq!(bv.to_string(), "1010000011");
    }

    #[test]
    fn test_base64_keeps_trailing_zero_bits() {
        // trailing zeros are real code bits, not padding
        let bv = from_str_bits("1100");
        let packed = bv.to_base64();
        assert_eq!(packed, "wA==");
        let restored = BitVec::from_base64(&packed, 4).unwrap();
        assert_eq!(restored.to_string(), "1100");

        let longer = BitVec::from_base64(&packed, 7).unwrap();
        assert_eq!(longer.to_string(), "1100000");
    }

    #[test]
    fn test_empty_round_trip() {
        let bv = BitVec::new();
        assert_eq!(bv.to_base64(), "");
        let restored = BitVec::from_base64("", 0).unwrap();
        assert_eq!(restored.bit_count(), 0);
        assert_eq!(restored.iter().count(), 0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let packed = from_str_bits("10101010").to_base64();
        assert!(matches!(
            BitVec::from_base64(&packed, 9),
            Err(HuffmanError::CorruptPayload { .. })
        ));
        assert!(matches!(
            BitVec::from_base64(&packed, 0),
            Err(HuffmanError::CorruptPayload { .. })
        ));
    }

    #[test]
    fn test_bad_base64_rejected() {
        assert!(matches!(
            BitVec::from_base64("not base64!", 8),
            Err(HuffmanError::CorruptPayload { .. })
        ));
    }

    #[test]
    fn test_padding_bits_cleared() {
        let restored = BitVec::from_bytes(vec![0b1011_1111], 3).unwrap();
        assert_eq!(restored.as_bytes(), &[0b1010_0000]);
        assert_eq!(restored.to_string(), "101");
    }
}
