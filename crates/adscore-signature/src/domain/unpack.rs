//! # Binary Cursor Decoder
//!
//! Interprets a packed-field format string against a byte buffer.
//!
//! A format is a sequence of directives: one instruction letter, an optional
//! quantifier (digits, or `*` for "all remaining"), and an optional label
//! terminated by `/`.
//!
//! | Code | Meaning | Width |
//! |------|---------|-------|
//! | `C` | unsigned byte | 1 |
//! | `c` | signed byte (two's complement) | 1 |
//! | `n` | big-endian `u16` | 2 |
//! | `N` | big-endian `u32` | 4 |
//!
//! The decoder is stateless across calls. Callers slice off consumed bytes
//! themselves before the next call.
//!
//! All lengths come from untrusted input: elements are only produced for
//! bytes actually present, so a short buffer yields missing keys rather than
//! a panic or a read past the end.

use super::entities::{Attributes, DecodedValue};
use super::errors::SignatureError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quantifier {
    Count(usize),
    Rest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Instruction {
    UnsignedByte,
    SignedByte,
    Word,
    Long,
}

impl Instruction {
    fn from_code(code: char) -> Result<Self, SignatureError> {
        match code {
            'C' => Ok(Instruction::UnsignedByte),
            'c' => Ok(Instruction::SignedByte),
            'n' => Ok(Instruction::Word),
            'N' => Ok(Instruction::Long),
            other => Err(SignatureError::MalformedFormat(other.to_string())),
        }
    }

    const fn width(self) -> usize {
        match self {
            Instruction::UnsignedByte | Instruction::SignedByte => 1,
            Instruction::Word => 2,
            Instruction::Long => 4,
        }
    }

    fn read(self, chunk: &[u8]) -> i64 {
        match self {
            Instruction::UnsignedByte => i64::from(chunk[0]),
            Instruction::SignedByte => i64::from(chunk[0] as i8),
            Instruction::Word => i64::from(u16::from_be_bytes([chunk[0], chunk[1]])),
            Instruction::Long => {
                i64::from(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            }
        }
    }
}

/// One parsed format directive.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Directive {
    instruction: Instruction,
    quantifier: Quantifier,
    label: String,
}

fn parse_directives(format: &str) -> Result<Vec<Directive>, SignatureError> {
    let mut directives = Vec::new();
    let mut chars = format.chars().peekable();

    while let Some(code) = chars.next() {
        let mut quantifier = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() || c == '*' {
                quantifier.push(c);
                chars.next();
            } else {
                break;
            }
        }

        let mut label = String::new();
        while let Some(&c) = chars.peek() {
            chars.next();
            if c == '/' {
                break;
            }
            label.push(c);
        }

        let quantifier = match quantifier.as_str() {
            "" => Quantifier::Count(1),
            "*" => Quantifier::Rest,
            digits => digits
                .parse()
                .map(Quantifier::Count)
                .map_err(|_| SignatureError::MalformedFormat(format!("{code}{digits}")))?,
        };

        directives.push(Directive {
            instruction: Instruction::from_code(code)?,
            quantifier,
            label,
        });
    }

    Ok(directives)
}

/// Decode `data` according to `format`.
///
/// Multi-element directives store values under `label1`, `label2`, …;
/// single-element directives store under `label` alone.
///
/// # Errors
/// * `MalformedFormat` - unknown instruction letter or unparsable quantifier
pub fn unpack(format: &str, data: &[u8]) -> Result<Attributes, SignatureError> {
    let mut result = Attributes::new();
    let mut cursor = 0usize;

    for directive in parse_directives(format)? {
        let width = directive.instruction.width();
        let remaining = data.len().saturating_sub(cursor);

        let count = match directive.quantifier {
            Quantifier::Count(n) => n,
            Quantifier::Rest => remaining / width,
        };
        let span = count.saturating_mul(width);
        let start = cursor.min(data.len());
        let available = &data[start..start + span.min(remaining)];
        cursor = cursor.saturating_add(span);

        for (i, chunk) in available.chunks_exact(width).enumerate() {
            let key = if count > 1 {
                format!("{}{}", directive.label, i + 1)
            } else {
                directive.label.clone()
            };
            result.insert(key, DecodedValue::Integer(directive.instruction.read(chunk)));
        }
    }

    Ok(result)
}
