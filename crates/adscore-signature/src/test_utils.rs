//! Test utilities for signature verification.
//!
//! Builders for v4/v3 wire payloads, HMAC token minting, and a fixed clock.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use adscore_signature::test_utils::{mint_token, SignatureBuilder};
//! use adscore_signature::Verdict;
//!
//! let token = mint_token(b"key", Verdict::Ok, 100, 101, "192.0.2.1", "UA");
//! let signature = SignatureBuilder::v4()
//!     .ulong(0x00, 100)
//!     .ulong(0x01, 101)
//!     .uchar(0x81, 1)
//!     .string(0xC1, &token)
//!     .build();
//! assert!(!signature.contains('='));
//! ```

use crate::domain::entities::Verdict;
use crate::domain::verifier::{canonical_message, compute_token};
use crate::ports::outbound::TimeSource;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// A time source that returns a fixed timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTimeSource {
    now: u64,
}

impl FixedTimeSource {
    pub fn new(now: u64) -> Self {
        Self { now }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> u64 {
        self.now
    }
}

/// Assembles v4 signatures field by field.
#[derive(Debug, Clone, Default)]
pub struct SignatureBuilder {
    version: u8,
    field_count: Option<u8>,
    fields: Vec<Vec<u8>>,
}

impl SignatureBuilder {
    pub fn v4() -> Self {
        Self {
            version: 4,
            ..Self::default()
        }
    }

    /// Override the leading version byte.
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Override the declared field count (defaults to the number of fields added).
    pub fn field_count(mut self, count: u8) -> Self {
        self.field_count = Some(count);
        self
    }

    pub fn uchar(mut self, tag: u8, value: u8) -> Self {
        self.fields.push(vec![tag, value]);
        self
    }

    pub fn ushort(mut self, tag: u8, value: u16) -> Self {
        let mut field = vec![tag];
        field.extend_from_slice(&value.to_be_bytes());
        self.fields.push(field);
        self
    }

    pub fn ulong(mut self, tag: u8, value: u32) -> Self {
        let mut field = vec![tag];
        field.extend_from_slice(&value.to_be_bytes());
        self.fields.push(field);
        self
    }

    /// Length-prefixed string field. Panics if `value` exceeds `u16::MAX`.
    pub fn string(mut self, tag: u8, value: &[u8]) -> Self {
        let len = u16::try_from(value.len()).expect("string field too long");
        let mut field = vec![tag];
        field.extend_from_slice(&len.to_be_bytes());
        field.extend_from_slice(value);
        self.fields.push(field);
        self
    }

    /// Append bytes verbatim as one field entry.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.fields.push(bytes.to_vec());
        self
    }

    pub fn build_bytes(&self) -> Vec<u8> {
        let count = self
            .field_count
            .unwrap_or_else(|| u8::try_from(self.fields.len()).expect("too many fields"));
        let mut out = vec![self.version, count];
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        out
    }

    /// Base64url without padding, the form signatures are delivered in.
    pub fn build(&self) -> String {
        encode_signature(&self.build_bytes())
    }
}

/// Base64url-encode raw signature bytes.
pub fn encode_signature(raw: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(raw)
}

/// Legacy v3 layout with both tokens.
pub fn v3_bytes(
    request_time: u32,
    signature_time: u32,
    master_sign_type: u8,
    master_token: &[u8],
    customer_sign_type: u8,
    customer_token: &[u8],
) -> Vec<u8> {
    let mut out = vec![3];
    out.extend_from_slice(&request_time.to_be_bytes());
    out.extend_from_slice(&signature_time.to_be_bytes());
    out.push(master_sign_type);
    out.extend_from_slice(&(master_token.len() as u16).to_be_bytes());
    out.extend_from_slice(master_token);
    out.push(customer_sign_type);
    out.extend_from_slice(&(customer_token.len() as u16).to_be_bytes());
    out.extend_from_slice(customer_token);
    out
}

/// Token the scoring service would issue for this verdict and candidate.
///
/// `ip` must already be in signed form (RFC1924 for IPv6).
pub fn mint_token(
    key: &[u8],
    verdict: Verdict,
    request_time: u32,
    signature_time: u32,
    ip: &str,
    user_agent: &str,
) -> Vec<u8> {
    let message = canonical_message(
        verdict,
        i64::from(request_time),
        i64::from(signature_time),
        ip,
        user_agent,
    );
    compute_token(key, &message)
        .expect("HMAC accepts any key length")
        .to_vec()
}
