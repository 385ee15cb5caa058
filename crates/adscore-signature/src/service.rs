//! # Signature Verification Service
//!
//! Application service layer that implements the `SignatureVerificationApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`SignatureVerificationApi`)
//! - Reads the clock through the outbound port (`TimeSource`)
//! - Delegates decoding and HMAC checks to the domain layer

use crate::domain::config::{LegacyPayloadCheck, VerifyOptions};
use crate::domain::encoding::{decode_key, latin1_bytes};
use crate::domain::entities::{
    SignRole, SignatureEnvelope, VerificationRequest, VerificationResult,
};
use crate::domain::errors::SignatureError;
use crate::domain::{parser, verifier};
use crate::ports::inbound::SignatureVerificationApi;
use crate::ports::outbound::{SystemTimeSource, TimeSource};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Signature Verification Service.
///
/// Stateless apart from the injected clock; share one instance freely
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerificationService<T: TimeSource = SystemTimeSource> {
    time: T,
}

impl<T: TimeSource> SignatureVerificationService<T> {
    pub fn new(time: T) -> Self {
        Self { time }
    }

    /// Build a request from caller-facing arguments and verify it.
    ///
    /// The key is base64-decoded first when `options.is_key_base64_encoded`
    /// is set, otherwise its characters are used as Latin-1 bytes.
    pub fn verify_signature<I, S>(
        &self,
        signature: &str,
        user_agent: &str,
        role: SignRole,
        key: &str,
        candidate_ips: I,
        options: &VerifyOptions,
    ) -> VerificationResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = match prepare_key(key, options.is_key_base64_encoded) {
            Ok(key) => key,
            Err(err) => {
                warn!(%err, "zone key rejected");
                return err.into();
            }
        };

        let request = VerificationRequest {
            signature: signature.to_string(),
            user_agent: user_agent.to_string(),
            role,
            key,
            candidate_ips: candidate_ips.into_iter().map(Into::into).collect(),
            expiry_seconds: options.expiry_seconds,
        };

        self.verify(&request, options.legacy_payload_check)
    }

    fn parse_at(
        &self,
        signature: &str,
        now: u64,
        check: LegacyPayloadCheck,
    ) -> Result<SignatureEnvelope, SignatureError> {
        let envelope = parser::parse(signature, now, check)?;
        debug!(
            version = envelope.version(),
            fields = envelope.attributes().len(),
            "signature decoded"
        );
        Ok(envelope)
    }
}

impl<T: TimeSource> SignatureVerificationApi for SignatureVerificationService<T> {
    fn parse(
        &self,
        signature: &str,
        check: LegacyPayloadCheck,
    ) -> Result<SignatureEnvelope, SignatureError> {
        self.parse_at(signature, self.time.now(), check)
    }

    fn verify(
        &self,
        request: &VerificationRequest,
        check: LegacyPayloadCheck,
    ) -> VerificationResult {
        let now = self.time.now();

        let envelope = match self.parse_at(&request.signature, now, check) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(%err, "signature rejected by parser");
                return err.into();
            }
        };

        verifier::verify_envelope(&envelope, request, now)
    }
}

fn prepare_key(key: &str, is_base64: bool) -> Result<Zeroizing<Vec<u8>>, SignatureError> {
    if is_base64 {
        decode_key(key)
    } else {
        Ok(Zeroizing::new(latin1_bytes(key)))
    }
}

/// Verify a signature against the wall clock.
///
/// This is the single public entry point; `options` carries the expiry
/// window and key encoding (see [`VerifyOptions`] for defaults).
///
/// # Example
///
/// ```
/// use adscore_signature::{verify, SignRole, VerifyOptions};
///
/// let result = verify(
///     "BAA",
///     "Mozilla/5.0",
///     SignRole::Customer,
///     "a2V5",
///     ["192.0.2.1"],
///     &VerifyOptions::default(),
/// );
/// assert_eq!(result.error_message(), Some("sign role signature mismatch"));
/// ```
pub fn verify<I, S>(
    signature: &str,
    user_agent: &str,
    role: SignRole,
    key: &str,
    candidate_ips: I,
    options: &VerifyOptions,
) -> VerificationResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SignatureVerificationService::new(SystemTimeSource).verify_signature(
        signature,
        user_agent,
        role,
        key,
        candidate_ips,
        options,
    )
}
