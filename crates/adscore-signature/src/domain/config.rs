//! Verification options
//!
//! # Example
//!
//! ```
//! use adscore_signature::VerifyOptions;
//!
//! let options = VerifyOptions::default().with_expiry(60).with_raw_key();
//! assert_eq!(options.expiry_seconds, Some(60));
//! assert!(!options.is_key_base64_encoded);
//! ```

use serde::{Deserialize, Serialize};

/// How the legacy v3 parser treats its decoded buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyPayloadCheck {
    /// Reject v3 payloads whose decoded buffer is non-empty.
    ///
    /// No non-empty v3 signature is ever accepted under this check.
    #[default]
    Inverted,
    /// Reject only empty buffers, the same check the v4 parser applies.
    Standard,
}

/// Recognized options of a verification call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    /// Report an otherwise valid match as expired once
    /// `signatureTime + expiry_seconds < now`. `None` disables the gate.
    pub expiry_seconds: Option<u32>,
    /// The zone key is base64 (MIME variant) and must be decoded first.
    pub is_key_base64_encoded: bool,
    /// Payload check applied by the v3 fallback parser.
    pub legacy_payload_check: LegacyPayloadCheck,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            expiry_seconds: None,
            is_key_base64_encoded: true,
            legacy_payload_check: LegacyPayloadCheck::Inverted,
        }
    }
}

impl VerifyOptions {
    pub fn with_expiry(mut self, seconds: u32) -> Self {
        self.expiry_seconds = Some(seconds);
        self
    }

    /// Use the key string's bytes as-is instead of base64-decoding it.
    pub fn with_raw_key(mut self) -> Self {
        self.is_key_base64_encoded = false;
        self
    }

    pub fn with_legacy_payload_check(mut self, check: LegacyPayloadCheck) -> Self {
        self.legacy_payload_check = check;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = VerifyOptions::default();
        assert_eq!(options.expiry_seconds, None);
        assert!(options.is_key_base64_encoded);
        assert_eq!(options.legacy_payload_check, LegacyPayloadCheck::Inverted);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let options: VerifyOptions = serde_json::from_str(r#"{"expiry_seconds": 30}"#).unwrap();
        assert_eq!(options.expiry_seconds, Some(30));
        assert!(options.is_key_base64_encoded);

        let options: VerifyOptions =
            serde_json::from_str(r#"{"legacy_payload_check": "standard"}"#).unwrap();
        assert_eq!(options.legacy_payload_check, LegacyPayloadCheck::Standard);
    }
}
