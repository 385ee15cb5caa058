//! # Signature Errors
//!
//! Error types for signature decoding and verification.
//!
//! Display strings are part of the observable contract: they become the
//! `message` of [`VerificationResult::Error`](super::entities::VerificationResult).

use thiserror::Error;

/// Errors that can occur while decoding or verifying a signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// A decode directive used an instruction letter outside `{C, c, n, N}`
    /// or carried an unusable quantifier.
    #[error("Unknown format code:{0}")]
    MalformedFormat(String),

    /// The signature (or, for v3, the decoded buffer) failed the payload check.
    #[error("invalid base64 payload")]
    InvalidPayload,

    /// The leading version byte is recognized but not handled by this parser.
    ///
    /// Only the v4 parser's instance of this error is recoverable: the
    /// dispatcher retries with the v3 layout.
    #[error("unsupported version")]
    VersionRange { found: Option<u8> },

    /// The buffer is shorter than a field declares.
    #[error("premature end of signature 0x{code:02x}")]
    PrematureEnd { code: u8 },

    /// Declared token length disagrees with the bytes actually present.
    #[error("{role} token length mismatch ({declared} / {actual})")]
    LengthMismatch {
        role: &'static str,
        declared: usize,
        actual: usize,
    },

    /// A v3 signature claims to have been issued in the future.
    #[error("invalid timestamp (future time)")]
    InvalidTimestamp { signature_time: u64, now: u64 },

    /// A candidate passed the IPv6 syntax test but could not be abbreviated.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Sign type 2 is known but not verifiable by this library.
    #[error("unsupported signature")]
    UnsupportedSignatureType,

    /// Sign type outside the known set.
    #[error("unrecognized signature")]
    UnrecognizedSignatureType(i64),

    /// A required attribute is absent from the decoded envelope.
    #[error("missing signature field: {0}")]
    MissingField(String),

    /// The zone key could not be decoded.
    #[error("invalid key encoding")]
    InvalidKey,
}

impl SignatureError {
    /// True for the single non-terminal condition that drives v4 → v3 fallback.
    pub fn is_version_range(&self) -> bool {
        matches!(self, SignatureError::VersionRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premature_end_codes_are_two_hex_digits() {
        assert_eq!(
            SignatureError::PrematureEnd { code: 1 }.to_string(),
            "premature end of signature 0x01"
        );
        assert_eq!(
            SignatureError::PrematureEnd { code: 6 }.to_string(),
            "premature end of signature 0x06"
        );
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = SignatureError::LengthMismatch {
            role: "master",
            declared: 32,
            actual: 7,
        };
        assert_eq!(err.to_string(), "master token length mismatch (32 / 7)");
    }

    #[test]
    fn test_only_version_range_is_recoverable() {
        assert!(SignatureError::VersionRange { found: Some(3) }.is_version_range());
        assert!(!SignatureError::InvalidPayload.is_version_range());
        assert!(!SignatureError::PrematureEnd { code: 1 }.is_version_range());
    }
}
