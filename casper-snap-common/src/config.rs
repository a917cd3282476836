//! Snap configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration.

use serde::{Deserialize, Serialize};

use crate::error::SnapError;
use crate::{COIN_TYPE, EXPLORER_URL, MESSAGE_PREFIX};

/// Runtime configuration of the snap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapConfig {
    /// SLIP-44 coin type used for key derivation.
    pub coin_type: u32,
    /// Prefix prepended to messages before signing.
    pub message_prefix: String,
    /// Block explorer search URL used for dialog links.
    pub explorer_url: String,
    /// Render nested lists in full instead of `<type>[...]`.
    pub expand_nested_lists: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            coin_type: COIN_TYPE,
            message_prefix: MESSAGE_PREFIX.to_string(),
            explorer_url: EXPLORER_URL.to_string(),
            expand_nested_lists: false,
        }
    }
}

impl SnapConfig {
    /// Parses a configuration from JSON, filling absent fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, SnapError> {
        serde_json::from_str(json)
            .map_err(|e| SnapError::MalformedInput(format!("Invalid configuration: {}", e)))
    }

    /// Returns the explorer URL for a search term.
    pub fn explorer_link(&self, term: &str) -> String {
        format!("{}{}", self.explorer_url, term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnapConfig::default();
        assert_eq!(config.coin_type, 506);
        assert_eq!(config.message_prefix, "Casper Message:\n");
        assert!(!config.expand_nested_lists);
    }

    #[test]
    fn test_partial_json() {
        let config = SnapConfig::from_json(r#"{ "expandNestedLists": true }"#).unwrap();
        assert!(config.expand_nested_lists);
        assert_eq!(config.coin_type, 506);
        assert_eq!(
            config.explorer_link("abc"),
            "https://cspr.live/search/abc"
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SnapConfig::from_json("{ coinType: }"),
            Err(SnapError::MalformedInput(_))
        ));
    }
}
