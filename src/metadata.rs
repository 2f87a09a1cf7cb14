//! The `.huff` save record.
//!
//! Reading and writing the file is left to the caller; this module only
//! converts between a [`CompressionResult`] and the record's JSON text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::huffman_codec::{CompressionResult, HuffmanCodec};
use crate::hufftree::SerializedTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HuffFile {
    pub tree: SerializedTree,
    pub payload: String,
    pub original_size_bits: u64,
    pub compressed_size_bits: u64,
    pub created_at: DateTime<Utc>,
}

impl HuffFile {
    pub fn from_result(result: &CompressionResult) -> Self {
        Self::with_timestamp(result, Utc::now())
    }

    pub fn with_timestamp(result: &CompressionResult, created_at: DateTime<Utc>) -> Self {
        HuffFile {
            tree: result.tree.clone(),
            payload: result.payload.clone(),
            original_size_bits: result.original_size_bits,
            compressed_size_bits: result.compressed_size_bits,
            created_at,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode the stored text with `codec`.
    pub fn decompress(&self, codec: &HuffmanCodec) -> Result<String> {
        codec.decompress(&self.payload, Some(&self.tree))
    }
}
