//! # Signature Parser
//!
//! Turns a base64url signature into a [`SignatureEnvelope`].
//!
//! ## Wire formats
//!
//! **v4** (tagged field list):
//!
//! ```text
//! version:u8 = 4 | field_count:u8 | field*
//! field := tag:u8 | value
//!   uchar  -> u8
//!   ushort -> u16 BE
//!   ulong  -> u32 BE
//!   string -> len:u16 BE | bytes[len]      (len & 0x8000 => len &= 0xFF)
//! ```
//!
//! **v3** (fixed layout):
//!
//! ```text
//! version:u8 = 3 | requestTime:u32 | signatureTime:u32
//!   | masterSignType:u8 | masterTokenLength:u16 | masterToken
//!   | customerSignType:u8 | customerTokenLength:u16 | customerToken
//! ```
//!
//! [`parse`] tries v4 first and falls back to v3 only when the v4 parser
//! reports [`SignatureError::VersionRange`].

use super::config::LegacyPayloadCheck;
use super::encoding::decode_signature;
use super::entities::{Attributes, DecodedValue, FieldType, SignatureEnvelope};
use super::errors::SignatureError;
use super::fields;
use super::unpack::unpack;
use tracing::debug;

pub const VERSION_V3: u8 = 3;
pub const VERSION_V4: u8 = 4;

/// Size of the fixed v3 header up to and including `masterTokenLength`.
const V3_HEADER_LEN: usize = 12;
/// Size of the v3 customer header (`customerSignType`, `customerTokenLength`).
const V3_CUSTOMER_HEADER_LEN: usize = 3;
/// Tag byte plus the 16-bit length of a v4 string field.
const V4_STRING_HEADER_LEN: usize = 3;
const LEGACY_LENGTH_FLAG: i64 = 0x8000;

fn take_integer(attrs: &mut Attributes, key: &str) -> Option<i64> {
    match attrs.remove(key) {
        Some(DecodedValue::Integer(v)) => Some(v),
        _ => None,
    }
}

fn advance(buf: &[u8], n: usize) -> &[u8] {
    &buf[n.min(buf.len())..]
}

/// Read `len` bytes at `offset`, returning at most what is available.
fn slice_at(buf: &[u8], offset: usize, len: usize) -> &[u8] {
    let start = offset.min(buf.len());
    let end = start.saturating_add(len).min(buf.len());
    &buf[start..end]
}

// =============================================================================
// v4
// =============================================================================

/// Parse a base64url v4 signature.
///
/// # Errors
/// * `InvalidPayload` - not base64, or decodes to nothing
/// * `VersionRange` - leading byte is not 4 (caller may retry as v3)
/// * `PrematureEnd` - a field runs past the end of the buffer
pub fn parse_v4(signature: &str) -> Result<SignatureEnvelope, SignatureError> {
    let raw = decode_signature(signature)?;
    if raw.is_empty() {
        return Err(SignatureError::InvalidPayload);
    }
    decode_v4(&raw)
}

/// Decode raw v4 bytes.
pub fn decode_v4(raw: &[u8]) -> Result<SignatureEnvelope, SignatureError> {
    let mut header = unpack("Cversion/CfieldNum", raw)?;

    let version = take_integer(&mut header, "version");
    if version != Some(i64::from(VERSION_V4)) {
        return Err(SignatureError::VersionRange {
            found: version.and_then(|v| u8::try_from(v).ok()),
        });
    }
    let field_count = take_integer(&mut header, "fieldNum")
        .ok_or(SignatureError::PrematureEnd { code: 0x01 })?;

    let mut attributes = Attributes::new();
    let mut rest = advance(raw, 2);

    for position in 0..field_count as usize {
        let tag = unpack("CfieldId", rest)?
            .get("fieldId")
            .and_then(DecodedValue::as_integer)
            .ok_or(SignatureError::PrematureEnd { code: 0x01 })?;
        let field = fields::resolve(tag as u8, position)?;

        let consumed = match field.field_type {
            FieldType::UChar => {
                let value = read_scalar(rest, "Cx/Cv", 0x02)?;
                attributes.insert(field.name, value);
                2
            }
            FieldType::UShort => {
                let value = read_scalar(rest, "Cx/nv", 0x03)?;
                attributes.insert(field.name, value);
                3
            }
            FieldType::ULong => {
                let value = read_scalar(rest, "Cx/Nv", 0x04)?;
                attributes.insert(field.name, value);
                5
            }
            FieldType::String => {
                let mut len = unpack("Cx/nl", rest)?
                    .get("l")
                    .and_then(DecodedValue::as_integer)
                    .ok_or(SignatureError::PrematureEnd { code: 0x05 })?;
                if len & LEGACY_LENGTH_FLAG != 0 {
                    len &= 0xFF;
                }
                let len = len as usize;

                let value = slice_at(rest, V4_STRING_HEADER_LEN, len);
                if value.len() != len {
                    return Err(SignatureError::PrematureEnd { code: 0x06 });
                }
                attributes.insert(field.name, DecodedValue::Text(value.to_vec()));
                V4_STRING_HEADER_LEN + len
            }
        };

        rest = advance(rest, consumed);
    }

    attributes.remove(&field_count.to_string());

    Ok(SignatureEnvelope::new(VERSION_V4, attributes))
}

fn read_scalar(buf: &[u8], format: &str, code: u8) -> Result<DecodedValue, SignatureError> {
    unpack(format, buf)?
        .remove("v")
        .ok_or(SignatureError::PrematureEnd { code })
}

// =============================================================================
// v3
// =============================================================================

/// Parse a base64url legacy v3 signature.
///
/// `now` is the current Unix time, used to reject future-dated signatures.
///
/// # Errors
/// * `InvalidPayload` - payload check failed (see [`LegacyPayloadCheck`])
/// * `VersionRange` - leading byte is not 3 (terminal at this level)
/// * `InvalidTimestamp` - `signatureTime` is in the future
/// * `LengthMismatch` - a token is shorter than its declared length
pub fn parse_v3(
    signature: &str,
    now: u64,
    check: LegacyPayloadCheck,
) -> Result<SignatureEnvelope, SignatureError> {
    let raw = decode_signature(signature)?;
    let rejected = match check {
        LegacyPayloadCheck::Inverted => !raw.is_empty(),
        LegacyPayloadCheck::Standard => raw.is_empty(),
    };
    if rejected {
        return Err(SignatureError::InvalidPayload);
    }
    decode_v3(&raw, now)
}

/// Decode raw v3 bytes.
pub fn decode_v3(raw: &[u8], now: u64) -> Result<SignatureEnvelope, SignatureError> {
    let mut attributes = unpack(
        "Cversion/NrequestTime/NsignatureTime/CmasterSignType/nmasterTokenLength",
        raw,
    )?;

    let version = take_integer(&mut attributes, "version");
    if version != Some(i64::from(VERSION_V3)) {
        return Err(SignatureError::VersionRange {
            found: version.and_then(|v| u8::try_from(v).ok()),
        });
    }

    let signature_time = attributes
        .get("signatureTime")
        .and_then(DecodedValue::as_integer)
        .ok_or(SignatureError::PrematureEnd { code: 0x01 })?;
    if signature_time as u64 > now {
        return Err(SignatureError::InvalidTimestamp {
            signature_time: signature_time as u64,
            now,
        });
    }

    let master_len = attributes
        .get("masterTokenLength")
        .and_then(DecodedValue::as_integer)
        .ok_or(SignatureError::PrematureEnd { code: 0x01 })? as usize;
    let master_token = slice_at(raw, V3_HEADER_LEN, master_len);
    if master_token.len() != master_len {
        return Err(SignatureError::LengthMismatch {
            role: "master",
            declared: master_len,
            actual: master_token.len(),
        });
    }
    attributes.insert(
        "masterToken".to_string(),
        DecodedValue::Text(master_token.to_vec()),
    );

    let rest = advance(raw, V3_HEADER_LEN + master_len);
    let mut customer = unpack("CcustomerSignType/ncustomerTokenLength", rest)?;
    let customer_len = customer
        .get("customerTokenLength")
        .and_then(DecodedValue::as_integer)
        .ok_or(SignatureError::PrematureEnd { code: 0x01 })? as usize;
    let customer_token = slice_at(rest, V3_CUSTOMER_HEADER_LEN, customer_len);
    if customer_token.len() != customer_len {
        return Err(SignatureError::LengthMismatch {
            role: "customer",
            declared: customer_len,
            actual: customer_token.len(),
        });
    }
    customer.insert(
        "customerToken".to_string(),
        DecodedValue::Text(customer_token.to_vec()),
    );

    attributes.append(&mut customer);

    Ok(SignatureEnvelope::new(VERSION_V3, attributes))
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse a signature of either supported version.
///
/// v4 is attempted first. Only a v4 `VersionRange` error triggers the v3
/// attempt; every other error is returned unchanged.
pub fn parse(
    signature: &str,
    now: u64,
    check: LegacyPayloadCheck,
) -> Result<SignatureEnvelope, SignatureError> {
    match parse_v4(signature) {
        Err(err) if err.is_version_range() => {
            debug!(?err, "not a v4 signature, retrying as v3");
            parse_v3(signature, now, check)
        }
        result => result,
    }
}
