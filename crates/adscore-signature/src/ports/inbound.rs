//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this crate.

use crate::domain::config::LegacyPayloadCheck;
use crate::domain::entities::{SignatureEnvelope, VerificationRequest, VerificationResult};
use crate::domain::errors::SignatureError;

/// Primary Signature Verification API.
///
/// Implementations hold no per-call state and must be thread-safe.
pub trait SignatureVerificationApi: Send + Sync {
    /// Decode a base64url signature of either supported version.
    ///
    /// # Errors
    /// Any terminal parse error. A v4 version-range error is never returned
    /// on its own; it triggers the v3 attempt instead.
    fn parse(
        &self,
        signature: &str,
        check: LegacyPayloadCheck,
    ) -> Result<SignatureEnvelope, SignatureError>;

    /// Parse and verify in one step.
    ///
    /// Never fails: parse errors and engine errors both come back as
    /// [`VerificationResult::Error`].
    fn verify(&self, request: &VerificationRequest, check: LegacyPayloadCheck)
        -> VerificationResult;
}
