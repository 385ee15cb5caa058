//! # AdScore Signature Verification
//!
//! Verifies signed attestation tokens issued by a traffic-scoring service and
//! yields the verdict (`ok`, `junk`, `proxy`, `bot`) they carry.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): decoder, field registry, parser, verification engine; no I/O
//! - **Ports Layer** (`ports/`): Trait definitions for inbound/outbound interfaces
//! - **Service Layer** (`service.rs`): Wires domain logic to ports
//!
//! ## Security Notes
//!
//! - Every length in a signature is untrusted and checked before slicing
//! - Token comparison is constant-time
//! - Zone keys are wiped from memory when a request is dropped
//! - No call panics or propagates a fault: failures become `VerificationResult::Error`

pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export public API
pub use domain::config::{LegacyPayloadCheck, VerifyOptions};
pub use domain::entities::{
    DecodedValue, FieldDescriptor, FieldType, ResolvedField, SignRole, SignatureEnvelope,
    Verdict, VerificationRequest, VerificationResult,
};
pub use domain::errors::SignatureError;
pub use ports::inbound::SignatureVerificationApi;
pub use ports::outbound::{SystemTimeSource, TimeSource};
pub use service::{verify, SignatureVerificationService};
