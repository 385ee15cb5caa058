//! # Domain Layer
//!
//! Pure decoding and verification logic with no I/O dependencies.
//! Wall-clock time is passed in by the service layer.

pub mod config;
pub mod encoding;
pub mod entities;
pub mod errors;
pub mod fields;
pub mod ipv6;
pub mod parser;
pub mod unpack;
pub mod verifier;
