//! # huffman_text
//!
//! Lossless Huffman coding for text. `compress` returns an opaque payload
//! string plus the code tree; `decompress` turns the pair back into the
//! original text.
//!
//! ## Quick Start
//!
//! ```rust
//! use huffman_text::{compress, decompress};
//!
//! let result = compress("abracadabra")?;
//! assert_eq!(result.original_size_bits, 88);
//! assert_eq!(result.compressed_size_bits, 23);
//!
//! let text = decompress(&result.payload, Some(&result.tree))?;
//! assert_eq!(text, "abracadabra");
//! # Ok::<(), huffman_text::HuffmanError>(())
//! ```

pub mod config;
pub mod error;
pub mod huffman_codec;
pub mod hufftree;
pub mod metadata;

// Internal modules - not part of public API
mod bit_vec;
mod compressed_data;
mod min_heap;

// Re-export main types for convenience
pub use config::CodecConfig;
pub use error::{HuffmanError, Result};
pub use huffman_codec::{compress, decompress, CompressionResult, HuffmanCodec};
pub use hufftree::{CodeTable, FrequencyTable, HuffmanTree, SerializedNode, SerializedTree};
pub use metadata::HuffFile;
