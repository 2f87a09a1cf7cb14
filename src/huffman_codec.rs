use std::collections::BTreeMap;

use log::{debug, warn};

use crate::bit_vec::BitVec;
use crate::compressed_data::CompressedData;
use crate::config::CodecConfig;
use crate::error::{HuffmanError, Result};
use crate::hufftree::{FrequencyTable, HuffNode, HuffmanTree, NodeId, SerializedTree};

/// Everything `compress` hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    /// Opaque payload string (packed bits + metadata)
    pub payload: String,
    /// Code tree, carried separately from the payload
    pub tree: SerializedTree,
    pub original_size_bits: u64,
    pub compressed_size_bits: u64,
    /// `(original - compressed) / original * 100`; negative when the output grew
    pub compression_ratio: f64,
}

impl CompressionResult {
    /// Per-symbol codes as `0`/`1` strings.
    pub fn codes(&self) -> Result<BTreeMap<char, String>> {
        Ok(HuffmanTree::deserialize(&self.tree)?.generate_table().to_strings())
    }
}

/// Stateless Huffman text codec. Holds only its configuration, so one
/// instance can serve any number of concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct HuffmanCodec {
    config: CodecConfig,
}

impl HuffmanCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(HuffmanCodec { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn compress(&self, text: &str) -> Result<CompressionResult> {
        if text.is_empty() {
            return Err(HuffmanError::EmptyInput);
        }

        let frequencies = FrequencyTable::from_text(text);
        let tree = HuffmanTree::from_frequencies(&frequencies)?;
        let table = tree.generate_table();

        let mut bits = BitVec::with_capacity(table.encoded_bits(&frequencies) as usize);
        for symbol in text.chars() {
            let code = table.get(symbol).ok_or_else(|| {
                HuffmanError::tree_construction(format!("no code for symbol {:?}", symbol))
            })?;
            bits.push_code(code);
        }

        let original_size_bits = frequencies.total() * u64::from(self.config.bits_per_symbol);
        let compressed = CompressedData::new(&bits, original_size_bits, &table);
        let compressed_size_bits = compressed.compressed_size_bits;
        let compression_ratio = compression_ratio(original_size_bits, compressed_size_bits);

        debug!(
            "compressed {} symbols ({} distinct): {} -> {} bits ({:.2}%)",
            frequencies.total(),
            frequencies.len(),
            original_size_bits,
            compressed_size_bits,
            compression_ratio
        );

        Ok(CompressionResult {
            payload: compressed.serialize()?,
            tree: tree.serialize(),
            original_size_bits,
            compressed_size_bits,
            compression_ratio,
        })
    }

    pub fn decompress(&self, payload: &str, tree: Option<&SerializedTree>) -> Result<String> {
        let compressed = CompressedData::deserialize(payload).map_err(|e| {
            warn!("rejecting payload: {}", e);
            e
        })?;
        if self.config.verify_checksum {
            compressed.verify_checksum().map_err(|e| {
                warn!("rejecting payload: {}", e);
                e
            })?;
        }

        let tree = tree.ok_or_else(|| HuffmanError::invalid_tree("no tree supplied"))?;
        let tree = HuffmanTree::deserialize(tree)?;
        compressed.verify_tree(&tree.generate_table())?;
        let bits = compressed.unpack_bits()?;

        let text = decode_bits(&tree, &bits)?;
        debug!(
            "decompressed {} bits into {} symbols",
            bits.bit_count(),
            text.chars().count()
        );
        Ok(text)
    }
}

fn node_at(tree: &HuffmanTree, id: NodeId) -> Result<&HuffNode> {
    tree.node(id)
        .ok_or_else(|| HuffmanError::invalid_tree(format!("dangling node id {}", id)))
}

/// Walk the tree bit by bit, emitting a symbol at every leaf.
fn decode_bits(tree: &HuffmanTree, bits: &BitVec) -> Result<String> {
    // one code bit per occurrence of the only symbol
    if let HuffNode::Leaf { symbol, .. } = node_at(tree, tree.root())? {
        return Ok(std::iter::repeat(*symbol).take(bits.bit_count()).collect());
    }

    let mut result = String::new();
    let mut current = tree.root();
    for bit in bits.iter() {
        if let HuffNode::Internal { left, right, .. } = node_at(tree, current)? {
            current = if bit { *right } else { *left };
        }
        if let HuffNode::Leaf { symbol, .. } = node_at(tree, current)? {
            result.push(*symbol);
            current = tree.root();
        }
    }

    if current != tree.root() {
        return Err(HuffmanError::corrupt_payload(
            "bit stream ends in the middle of a code",
        ));
    }

    Ok(result)
}

fn compression_ratio(original_size_bits: u64, compressed_size_bits: u64) -> f64 {
    if original_size_bits == 0 {
        return 0.0;
    }
    (original_size_bits as f64 - compressed_size_bits as f64) / original_size_bits as f64 * 100.0
}

/// [`HuffmanCodec::compress`] with the default configuration.
pub fn compress(text: &str) -> Result<CompressionResult> {
    HuffmanCodec::new().compress(text)
}

/// [`HuffmanCodec::decompress`] with the default configuration.
pub fn decompress(payload: &str, tree: Option<&SerializedTree>) -> Result<String> {
    HuffmanCodec::new().decompress(payload, tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(text: &str) -> String {
        let result = compress(text).unwrap();
        decompress(&result.payload, Some(&result.tree)).unwrap()
    }

    #[test]
    fn test_abracadabra() {
        let result = compress("abracadabra").unwrap();
        assert_eq!(result.original_size_bits, 88);
        assert_eq!(result.compressed_size_bits, 23);

        let expected = (88.0 - 23.0) / 88.0 * 100.0;
        assert!((result.compression_ratio - expected).abs() < 1e-9);

        let codes = result.codes().unwrap();
        assert_eq!(codes[&'a'], "0");
        assert_eq!(codes[&'r'], "111");

        assert_eq!(decompress(&result.payload, Some(&result.tree)).unwrap(), "abracadabra");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compress("").unwrap_err(), HuffmanError::EmptyInput);
    }

    #[test]
    fn test_single_symbol() {
        let result = compress("aaaa").unwrap();
        assert_eq!(result.compressed_size_bits, 4);
        assert_eq!(result.original_size_bits, 32);
        assert_eq!(round_trip("aaaa"), "aaaa");
        assert_eq!(round_trip("z"), "z");
    }

    #[test]
    fn test_small_input_may_expand() {
        // 1 bit per symbol, 1 bit of width: nothing saved
        let codec = HuffmanCodec::with_config(CodecConfig { bits_per_symbol: 1, ..Default::default() }).unwrap();
        let result = codec.compress("ab").unwrap();
        assert_eq!(result.original_size_bits, 2);
        assert_eq!(result.compressed_size_bits, 2);
        assert_eq!(result.compression_ratio, 0.0);

        let result = codec.compress("abc").unwrap();
        assert_eq!(result.original_size_bits, 3);
        assert_eq!(result.compressed_size_bits, 5);
        assert!((result.compression_ratio - (3.0 - 5.0) / 3.0 * 100.0).abs() < 1e-9);
        assert!(result.compression_ratio < 0.0);
    }

    #[test]
    fn test_unicode_round_trip() {
        let text = "héllo wörld, 你好世界 🎉🎉";
        assert_eq!(round_trip(text), text);
        let result = compress(text).unwrap();
        assert_eq!(result.original_size_bits, text.chars().count() as u64 * 8);
    }

    #[test]
    fn test_missing_tree() {
        let result = compress("hello").unwrap();
        assert!(matches!(
            decompress(&result.payload, None),
            Err(HuffmanError::InvalidTree { .. })
        ));
    }

    #[test]
    fn test_mid_code_end_is_corrupt() {
        let tree = HuffmanTree::from_text("abracadabra").unwrap();
        let mut bits = BitVec::new();
        bits.push_code(&[false, true, true]); // "a" then a dangling "11"
        let err = decode_bits(&tree, &bits).unwrap_err();
        assert!(matches!(err, HuffmanError::CorruptPayload { .. }));
    }

    #[test]
    fn test_checksum_verification_can_be_disabled() {
        let result = compress("hello").unwrap();
        let mut inner = CompressedData::deserialize(&result.payload).unwrap();
        inner.original_size_bits += 8;
        let tampered = inner.serialize().unwrap();

        assert!(matches!(
            decompress(&tampered, Some(&result.tree)),
            Err(HuffmanError::CorruptPayload { .. })
        ));

        let lenient = HuffmanCodec::with_config(CodecConfig { verify_checksum: false, ..Default::default() }).unwrap();
        assert_eq!(lenient.decompress(&tampered, Some(&result.tree)).unwrap(), "hello");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = HuffmanCodec::with_config(CodecConfig { bits_per_symbol: 0, ..Default::default() }).unwrap_err();
        assert!(matches!(err, HuffmanError::Configuration { .. }));
    }

    #[test]
    fn test_tree_from_other_text_rejected() {
        let abra = compress("abracadabra").unwrap();
        let hello = compress("hello world").unwrap();
        let err = decompress(&abra.payload, Some(&hello.tree)).unwrap_err();
        assert!(matches!(err, HuffmanError::InvalidTree { .. }));
    }

    #[test]
    fn test_reordered_tree_still_decodes() {
        // same codes, different arena layout
        let result = compress("abc").unwrap();
        let mut tree = result.tree.clone();
        let last = tree.nodes.len() - 1;
        tree.nodes.swap(0, last);
        for node in &mut tree.nodes {
            for child in [&mut node.left, &mut node.right].into_iter().flatten() {
                if *child == 0 {
                    *child = last;
                } else if *child == last {
                    *child = 0;
                }
            }
        }
        tree.root = if tree.root == last { 0 } else { tree.root };
        assert_eq!(decompress(&result.payload, Some(&tree)).unwrap(), "abc");
    }
}
