//! # IPv6 Helpers
//!
//! IPv6 candidates are signed in their RFC1924 form: the 128-bit address
//! written as exactly 20 base-85 digits.
//!
//! Reference: <https://tools.ietf.org/html/rfc1924>

use super::errors::SignatureError;
use std::net::Ipv6Addr;

/// RFC1924 digit alphabet, lowest value first.
const RFC1924_ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

const RFC1924_DIGITS: usize = 20;

fn parse(address: &str) -> Option<Ipv6Addr> {
    let trimmed = address
        .strip_prefix('[')
        .and_then(|a| a.strip_suffix(']'))
        .unwrap_or(address);
    trimmed.parse().ok()
}

/// True if `address` is a syntactically valid IPv6 address.
pub fn is_ipv6(address: &str) -> bool {
    parse(address).is_some()
}

/// RFC1924 abbreviation of an IPv6 address.
///
/// # Errors
/// * `InvalidAddress` - `address` is not IPv6
pub fn abbreviate(address: &str) -> Result<String, SignatureError> {
    let ip = parse(address).ok_or_else(|| SignatureError::InvalidAddress(address.to_string()))?;

    let mut value = u128::from(ip);
    let mut digits = [0u8; RFC1924_DIGITS];
    for slot in digits.iter_mut().rev() {
        *slot = RFC1924_ALPHABET[(value % 85) as usize];
        value /= 85;
    }

    Ok(digits.iter().map(|&d| char::from(d)).collect())
}
