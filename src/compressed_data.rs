use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use crate::bit_vec::BitVec;
use crate::error::{HuffmanError, Result};
use crate::hufftree::CodeTable;

/// Inner payload bundle: packed bits plus everything needed to unpack them.
///
/// On the wire this is compact JSON wrapped in one more base64 pass. Only the
/// exact encoding produced by [`CompressedData::serialize`] is accepted back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompressedData {
    /// Zero-padded code bits, base64
    pub bits: String,
    /// Exact unpadded length of `bits`
    pub bit_length: usize,
    pub original_size_bits: u64,
    pub compressed_size_bits: u64,
    /// Fingerprint of the code table the bits were encoded with
    pub tree_hash: u64,
    /// xxh64 over every other field
    pub checksum: u64,
}

impl CompressedData {
    pub fn new(bits: &BitVec, original_size_bits: u64, table: &CodeTable) -> Self {
        let mut data = CompressedData {
            bits: bits.to_base64(),
            bit_length: bits.bit_count(),
            original_size_bits,
            compressed_size_bits: bits.bit_count() as u64,
            tree_hash: table.fingerprint(),
            checksum: 0,
        };
        data.checksum = data.compute_checksum();
        data
    }

    fn compute_checksum(&self) -> u64 {
        let mut xxh = Xxh64::new(0);
        xxh.update(self.bits.as_bytes());
        xxh.update(&(self.bit_length as u64).to_le_bytes());
        xxh.update(&self.original_size_bits.to_le_bytes());
        xxh.update(&self.compressed_size_bits.to_le_bytes());
        xxh.update(&self.tree_hash.to_le_bytes());
        xxh.digest()
    }

    pub fn verify_checksum(&self) -> Result<()> {
        let actual = self.compute_checksum();
        if actual != self.checksum {
            return Err(HuffmanError::corrupt_payload(format!(
                "checksum mismatch: expected {:016x}, got {:016x}",
                self.checksum, actual
            )));
        }
        Ok(())
    }

    /// The decoding tree must assign the same codes as the encoding tree.
    pub fn verify_tree(&self, table: &CodeTable) -> Result<()> {
        let actual = table.fingerprint();
        if actual != self.tree_hash {
            return Err(HuffmanError::invalid_tree(format!(
                "tree does not match payload: expected {:016x}, got {:016x}",
                self.tree_hash, actual
            )));
        }
        Ok(())
    }

    /// Encode as the opaque payload string.
    pub fn serialize(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    /// Parse an opaque payload string. Structural checks only; the checksum is
    /// left to [`CompressedData::verify_checksum`].
    pub fn deserialize(payload: &str) -> Result<Self> {
        let json = general_purpose::STANDARD.decode(payload)?;
        let data: CompressedData = serde_json::from_slice(&json)?;

        // serde_json tolerates whitespace the encoder never writes
        if data.serialize()? != payload {
            return Err(HuffmanError::corrupt_payload(
                "payload is not in canonical form",
            ));
        }

        if data.compressed_size_bits != data.bit_length as u64 {
            return Err(HuffmanError::corrupt_payload(format!(
                "compressed size {} does not match bit length {}",
                data.compressed_size_bits, data.bit_length
            )));
        }
        Ok(data)
    }

    pub fn unpack_bits(&self) -> Result<BitVec> {
        BitVec::from_base64(&self.bits, self.bit_length)
    }
}
