//! # Field Registry
//!
//! Immutable table mapping one-byte v4 field tags to their name and type.
//!
//! Tags not present verbatim fall back to their type family, selected by the
//! top two bits (`tag & 0xC0`), and receive a positional name such as
//! `uchar03`.

use super::entities::{FieldDescriptor, FieldType, ResolvedField};
use super::errors::SignatureError;

/// Mask selecting the type-family bits of a tag.
pub const TYPE_FAMILY_MASK: u8 = 0xC0;

/// Well-known fields, keyed by tag.
pub const FIELD_REGISTRY: [(u8, FieldDescriptor); 9] = [
    (0x00, FieldDescriptor { name: Some("requestTime"), field_type: FieldType::ULong }),
    (0x01, FieldDescriptor { name: Some("signatureTime"), field_type: FieldType::ULong }),
    (0x40, FieldDescriptor { name: None, field_type: FieldType::UShort }),
    (0x80, FieldDescriptor { name: Some("masterSignType"), field_type: FieldType::UChar }),
    (0x81, FieldDescriptor { name: Some("customerSignType"), field_type: FieldType::UChar }),
    (0xC0, FieldDescriptor { name: Some("masterToken"), field_type: FieldType::String }),
    (0xC1, FieldDescriptor { name: Some("customerToken"), field_type: FieldType::String }),
    (0xC2, FieldDescriptor { name: Some("masterTokenV6"), field_type: FieldType::String }),
    (0xC3, FieldDescriptor { name: Some("customerTokenV6"), field_type: FieldType::String }),
];

/// Exact registry lookup.
pub fn lookup(tag: u8) -> Option<&'static FieldDescriptor> {
    FIELD_REGISTRY
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, descriptor)| descriptor)
}

/// Resolve a tag at `position` in the field list to a concrete name and type.
///
/// # Errors
/// * `MalformedFormat` - the type family of `tag` is not registered
pub fn resolve(tag: u8, position: usize) -> Result<ResolvedField, SignatureError> {
    if let Some(descriptor) = lookup(tag) {
        let name = match descriptor.name {
            Some(name) => name.to_string(),
            None => positional_name(descriptor.field_type, position),
        };
        return Ok(ResolvedField {
            name,
            field_type: descriptor.field_type,
        });
    }

    // Family fallback only borrows the type, never the base entry's name.
    let base = lookup(tag & TYPE_FAMILY_MASK)
        .ok_or_else(|| SignatureError::MalformedFormat(format!("field tag 0x{tag:02x}")))?;

    Ok(ResolvedField {
        name: positional_name(base.field_type, position),
        field_type: base.field_type,
    })
}

fn positional_name(field_type: FieldType, position: usize) -> String {
    format!("{}{:02}", field_type.type_name(), position)
}
