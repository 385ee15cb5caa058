//! # Domain Entities
//!
//! Core data structures for signature decoding and verification.

use super::errors::SignatureError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

// =============================================================================
// Field Types
// =============================================================================

/// On-wire type of a v4 signature field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 8-bit unsigned integer
    UChar,
    /// 16-bit big-endian unsigned integer
    UShort,
    /// 32-bit big-endian unsigned integer
    ULong,
    /// Length-prefixed byte string
    String,
}

impl FieldType {
    /// Lower-case type name, also used as the prefix of synthesized field names.
    pub const fn type_name(self) -> &'static str {
        match self {
            FieldType::UChar => "uchar",
            FieldType::UShort => "ushort",
            FieldType::ULong => "ulong",
            FieldType::String => "string",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Registry entry: the name a tag's value is stored under and its wire type.
///
/// `name == None` means the name is derived from the field's position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: Option<&'static str>,
    pub field_type: FieldType,
}

/// A descriptor after positional name synthesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub field_type: FieldType,
}

// =============================================================================
// Decoded Values
// =============================================================================

/// A single decoded attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedValue {
    /// Integer fields (`C`, `c`, `n`, `N` directives). Signed to hold `c`.
    Integer(i64),
    /// Raw byte strings (tokens). Never re-interpreted as UTF-8.
    Text(Vec<u8>),
}

impl DecodedValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DecodedValue::Integer(v) => Some(*v),
            DecodedValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            DecodedValue::Text(bytes) => Some(bytes),
            DecodedValue::Integer(_) => None,
        }
    }
}

/// Name → value map produced by the decoder and the parser.
pub type Attributes = BTreeMap<String, DecodedValue>;

/// Fully decoded attribute set for one signature.
///
/// Built once per parse and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureEnvelope {
    version: u8,
    attributes: Attributes,
}

impl SignatureEnvelope {
    pub(crate) fn new(version: u8, attributes: Attributes) -> Self {
        Self {
            version,
            attributes,
        }
    }

    /// Wire format version (3 or 4).
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Integer attribute, `None` if absent or not an integer.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(DecodedValue::as_integer)
    }

    /// Byte-string attribute, `None` if absent or not a string.
    pub fn text(&self, name: &str) -> Option<&[u8]> {
        self.get(name).and_then(DecodedValue::as_text)
    }

    /// Integer attribute that must be present.
    pub fn require_integer(&self, name: &str) -> Result<i64, SignatureError> {
        self.integer(name)
            .ok_or_else(|| SignatureError::MissingField(name.to_string()))
    }
}

// =============================================================================
// Roles and Verdicts
// =============================================================================

/// Selects which token and sign-type fields are authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignRole {
    Master,
    Customer,
}

impl SignRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            SignRole::Master => "master",
            SignRole::Customer => "customer",
        }
    }

    /// `masterToken` / `customerToken`
    pub fn token_key(self) -> String {
        format!("{}Token", self.as_str())
    }

    /// `masterTokenV6` / `customerTokenV6`
    pub fn token_v6_key(self) -> String {
        format!("{}TokenV6", self.as_str())
    }

    /// `masterSignType` / `customerSignType`
    pub fn sign_type_key(self) -> String {
        format!("{}SignType", self.as_str())
    }
}

impl fmt::Display for SignRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(SignRole::Master),
            "customer" => Ok(SignRole::Customer),
            other => Err(format!("unknown sign role: {other}")),
        }
    }
}

/// Outcome classification carried by a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    Junk,
    Proxy,
    Bot,
}

impl Verdict {
    /// Fixed iteration order used when reconstructing candidate messages.
    /// The first match in this order wins.
    pub const ALL: [Verdict; 4] = [Verdict::Ok, Verdict::Junk, Verdict::Proxy, Verdict::Bot];

    /// Score code embedded in the signed message.
    pub const fn code(self) -> u8 {
        match self {
            Verdict::Ok => 0,
            Verdict::Junk => 3,
            Verdict::Proxy => 6,
            Verdict::Bot => 9,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::Junk => "junk",
            Verdict::Proxy => "proxy",
            Verdict::Bot => "bot",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Verification Request/Result Types
// =============================================================================

/// Everything the engine needs for one verification call.
#[derive(Clone, Debug)]
pub struct VerificationRequest {
    /// Base64url-encoded signature as received from the client
    pub signature: String,
    /// Full user agent string of the scored request
    pub user_agent: String,
    /// Which token set to verify against
    pub role: SignRole,
    /// Raw zone key bytes (already base64-decoded if applicable)
    pub key: Zeroizing<Vec<u8>>,
    /// IPv4/IPv6 candidates, tried in order
    pub candidate_ips: Vec<String>,
    /// Optional expiry window in seconds
    pub expiry_seconds: Option<u32>,
}

/// Result of signature verification.
///
/// Serializes with a `status` tag so callers can hand it straight to JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerificationResult {
    Success {
        score: u8,
        verdict: Verdict,
        #[serde(rename = "ipAddress")]
        ip_address: String,
        #[serde(rename = "requestTime")]
        request_time: i64,
        #[serde(rename = "signatureTime")]
        signature_time: i64,
    },
    Expired {
        #[serde(rename = "requestTime")]
        request_time: i64,
        #[serde(rename = "signatureTime")]
        signature_time: i64,
    },
    Error {
        message: String,
    },
}

impl VerificationResult {
    pub fn error(message: impl Into<String>) -> Self {
        VerificationResult::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Success { .. })
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, VerificationResult::Expired { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            VerificationResult::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl From<SignatureError> for VerificationResult {
    fn from(err: SignatureError) -> Self {
        VerificationResult::error(err.to_string())
    }
}
