//! Error type shared by every stage of the codec.

use thiserror::Error;

/// Errors raised by compression, decompression and configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HuffmanError {
    /// Nothing to compress
    #[error("empty input: nothing to compress")]
    EmptyInput,

    /// The tree builder hit a state that non-empty input cannot produce
    #[error("tree construction failed: {message}")]
    TreeConstruction {
        /// What went wrong
        message: String,
    },

    /// The payload string could not be unwrapped, parsed or decoded
    #[error("corrupt payload: {message}")]
    CorruptPayload {
        /// What went wrong
        message: String,
    },

    /// The tree is missing or cannot be rebuilt
    #[error("invalid tree: {message}")]
    InvalidTree {
        /// What went wrong
        message: String,
    },

    /// A configuration value is out of range
    #[error("invalid configuration: {message}")]
    Configuration {
        /// What went wrong
        message: String,
    },
}

impl HuffmanError {
    pub fn tree_construction<S: Into<String>>(message: S) -> Self {
        Self::TreeConstruction { message: message.into() }
    }

    pub fn corrupt_payload<S: Into<String>>(message: S) -> Self {
        Self::CorruptPayload { message: message.into() }
    }

    pub fn invalid_tree<S: Into<String>>(message: S) -> Self {
        Self::InvalidTree { message: message.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// True for errors caused by the caller's data rather than a bug in the codec.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, HuffmanError::TreeConstruction { .. })
    }
}

impl From<base64::DecodeError> for HuffmanError {
    fn from(e: base64::DecodeError) -> Self {
        HuffmanError::corrupt_payload(format!("base64: {}", e))
    }
}

impl From<serde_json::Error> for HuffmanError {
    fn from(e: serde_json::Error) -> Self {
        HuffmanError::corrupt_payload(format!("json: {}", e))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, HuffmanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(HuffmanError::EmptyInput.to_string(), "empty input: nothing to compress");
        assert_eq!(
            HuffmanError::corrupt_payload("truncated").to_string(),
            "corrupt payload: truncated"
        );
        assert_eq!(
            HuffmanError::invalid_tree("no root").to_string(),
            "invalid tree: no root"
        );
    }

    #[test]
    fn test_json_error_maps_to_corrupt_payload() {
        let err: HuffmanError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, HuffmanError::CorruptPayload { .. }));
        assert!(err.is_input_error());
        assert!(!HuffmanError::tree_construction("x").is_input_error());
    }
}
