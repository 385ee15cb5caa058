//! # Text and Base64 Encoding
//!
//! Byte-exact conversions used around the parser and the HMAC step.
//!
//! - Signatures arrive base64url-encoded, padding optional.
//! - Zone keys may be MIME-style base64 (line breaks tolerated).
//! - Signed messages are hashed as Latin-1, one byte per character.

use super::errors::SignatureError;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use zeroize::Zeroizing;

/// Standard alphabet, padding optional, trailing bits tolerated.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode a base64url signature into raw bytes.
///
/// `-` and `_` are mapped to `+` and `/` before a standard decode.
///
/// # Errors
/// * `InvalidPayload` - the input is not valid base64
pub fn decode_signature(signature: &str) -> Result<Vec<u8>, SignatureError> {
    let standard: String = signature
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    LENIENT_STANDARD
        .decode(standard.as_bytes())
        .map_err(|_| SignatureError::InvalidPayload)
}

/// Decode a base64 zone key, ignoring anything outside the alphabet
/// (line breaks, spaces) the way a MIME decoder does.
///
/// # Errors
/// * `InvalidKey` - what remains is not decodable
pub fn decode_key(key: &str) -> Result<Zeroizing<Vec<u8>>, SignatureError> {
    let filtered: Zeroizing<Vec<u8>> = Zeroizing::new(
        key.bytes()
            .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
            .collect(),
    );

    LENIENT_STANDARD
        .decode(filtered.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| SignatureError::InvalidKey)
}

/// Encode text as Latin-1. Characters above U+00FF become `?`.
pub fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
