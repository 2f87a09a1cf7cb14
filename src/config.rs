//! Codec configuration.
//!
//! Defaults match the reference single-byte text domain. Values can also be
//! read from environment variables (`HUFFMAN_BITS_PER_SYMBOL`,
//! `HUFFMAN_VERIFY_CHECKSUM`).

use std::env;

use crate::error::{HuffmanError, Result};

const DEFAULT_ENV_PREFIX: &str = "HUFFMAN_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Width of one uncompressed symbol, used for `original_size_bits`
    pub bits_per_symbol: u32,
    /// Check the payload checksum before decoding
    pub verify_checksum: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            bits_per_symbol: 8,
            verify_checksum: true,
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=32).contains(&self.bits_per_symbol) {
            return Err(HuffmanError::configuration(format!(
                "bits_per_symbol must be between 1 and 32, got {}",
                self.bits_per_symbol
            )));
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.bits_per_symbol =
            parse_env_var(&format!("{}BITS_PER_SYMBOL", prefix), config.bits_per_symbol);
        config.verify_checksum =
            parse_env_bool(&format!("{}VERIFY_CHECKSUM", prefix), config.verify_checksum);
        config.validate()?;
        Ok(config)
    }
}

/// Parse an environment variable, falling back to `default` when unset or unparsable.
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Accepts "true", "1", "yes", "on" (case-insensitive) as true.
pub fn parse_env_bool(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .map(|s| {
            let s = s.trim().to_lowercase();
            matches!(s.as_str(), "true" | "1" | "yes" | "on")
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CodecConfig::default();
        assert_eq!(config.bits_per_symbol, 8);
        assert!(config.verify_checksum);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_width_rejected() {
        let zero = CodecConfig { bits_per_symbol: 0, ..Default::default() };
        let wide = CodecConfig { bits_per_symbol: 33, ..Default::default() };
        assert!(matches!(zero.validate(), Err(HuffmanError::Configuration { .. })));
        assert!(matches!(wide.validate(), Err(HuffmanError::Configuration { .. })));
    }

    #[test]
    fn test_from_env_with_prefix() {
        // unique prefix so parallel tests don't interfere
        env::set_var("CFGTEST_A_BITS_PER_SYMBOL", "16");
        env::set_var("CFGTEST_A_VERIFY_CHECKSUM", "off");
        let config = CodecConfig::from_env_with_prefix("CFGTEST_A_").unwrap();
        assert_eq!(config.bits_per_symbol, 16);
        assert!(!config.verify_checksum);

        env::set_var("CFGTEST_B_BITS_PER_SYMBOL", "64");
        assert!(CodecConfig::from_env_with_prefix("CFGTEST_B_").is_err());

        let untouched = CodecConfig::from_env_with_prefix("CFGTEST_UNSET_").unwrap();
        assert_eq!(untouched, CodecConfig::default());
    }

    #[test]
    fn test_unparsable_env_falls_back() {
        env::set_var("CFGTEST_C_BITS_PER_SYMBOL", "wide");
        let config = CodecConfig::from_env_with_prefix("CFGTEST_C_").unwrap();
        assert_eq!(config.bits_per_symbol, 8);
    }
}
