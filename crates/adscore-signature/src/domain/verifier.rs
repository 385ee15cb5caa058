//! # Verification Engine
//!
//! Reconstructs the canonical signed message for each (candidate IP, verdict)
//! pair and compares its HMAC-SHA256 against the role's stored token.
//!
//! ## Canonical message
//!
//! ```text
//! <verdict code>\n<requestTime>\n<signatureTime>\n<ip>\n<user agent>
//! ```
//!
//! encoded as Latin-1. IPv6 candidates are signed in RFC1924 form.
//!
//! ## Security Notes
//!
//! - Token comparison is constant-time (`subtle`)
//! - Work is bounded by the candidate count times the 4-entry verdict table

use super::encoding::latin1_bytes;
use super::entities::{SignatureEnvelope, Verdict, VerificationRequest, VerificationResult};
use super::errors::SignatureError;
use super::ipv6;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Sign type whose tokens are HMAC-SHA256 over the canonical message.
pub const SIGN_TYPE_HMAC_SHA256: i64 = 1;
/// Known sign type this library cannot verify.
pub const SIGN_TYPE_UNSUPPORTED: i64 = 2;

pub const ROLE_MISMATCH: &str = "sign role signature mismatch";
pub const NO_VERDICT: &str = "no verdict";

/// Build the message that was signed for one verdict and candidate.
pub fn canonical_message(
    verdict: Verdict,
    request_time: i64,
    signature_time: i64,
    ip: &str,
    user_agent: &str,
) -> Vec<u8> {
    latin1_bytes(&format!(
        "{}\n{}\n{}\n{}\n{}",
        verdict.code(),
        request_time,
        signature_time,
        ip,
        user_agent
    ))
}

/// HMAC-SHA256 of `message` under `key`, both raw bytes.
pub fn compute_token(key: &[u8], message: &[u8]) -> Result<[u8; 32], SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(message);

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    Ok(digest)
}

/// Constant-time digest comparison; differing lengths never match.
pub fn tokens_match(digest: &[u8], token: &[u8]) -> bool {
    bool::from(digest.ct_eq(token))
}

/// Verify a decoded envelope against the request at time `now`.
///
/// Never fails: every error is folded into [`VerificationResult::Error`].
pub fn verify_envelope(
    envelope: &SignatureEnvelope,
    request: &VerificationRequest,
    now: u64,
) -> VerificationResult {
    match try_verify(envelope, request, now) {
        Ok(result) => result,
        Err(err) => {
            debug!(%err, "verification aborted");
            err.into()
        }
    }
}

fn try_verify(
    envelope: &SignatureEnvelope,
    request: &VerificationRequest,
    now: u64,
) -> Result<VerificationResult, SignatureError> {
    let role = request.role;
    let token_key = role.token_key();
    let token_v6_key = role.token_v6_key();

    if envelope.text(&token_key).map_or(true, <[u8]>::is_empty) {
        return Ok(VerificationResult::error(ROLE_MISMATCH));
    }

    let sign_type = envelope.require_integer(&role.sign_type_key())?;

    for candidate in &request.candidate_ips {
        if candidate.is_empty() {
            continue;
        }

        let (token, ip) = if ipv6::is_ipv6(candidate) {
            let Some(token) = envelope.text(&token_v6_key) else {
                debug!(%candidate, "no IPv6 token, skipping candidate");
                continue;
            };
            (token, ipv6::abbreviate(candidate)?)
        } else {
            let Some(token) = envelope.text(&token_key) else {
                continue;
            };
            (token, candidate.clone())
        };

        for verdict in Verdict::ALL {
            match sign_type {
                SIGN_TYPE_HMAC_SHA256 => {
                    let request_time = envelope.require_integer("requestTime")?;
                    let signature_time = envelope.require_integer("signatureTime")?;

                    let message = canonical_message(
                        verdict,
                        request_time,
                        signature_time,
                        &ip,
                        &request.user_agent,
                    );
                    let digest = compute_token(&request.key, &message)?;
                    if !tokens_match(&digest, token) {
                        continue;
                    }

                    if let Some(expiry) = request.expiry_seconds {
                        let now = i64::try_from(now).unwrap_or(i64::MAX);
                        if signature_time.saturating_add(i64::from(expiry)) < now {
                            debug!(signature_time, expiry, now, "matching signature has expired");
                            return Ok(VerificationResult::Expired {
                                request_time,
                                signature_time,
                            });
                        }
                    }

                    debug!(%verdict, %ip, "signature matched");
                    return Ok(VerificationResult::Success {
                        score: verdict.code(),
                        verdict,
                        ip_address: ip,
                        request_time,
                        signature_time,
                    });
                }
                SIGN_TYPE_UNSUPPORTED => return Err(SignatureError::UnsupportedSignatureType),
                other => return Err(SignatureError::UnrecognizedSignatureType(other)),
            }
        }
    }

    Ok(VerificationResult::error(NO_VERDICT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SignRole;
    use crate::domain::parser::decode_v4;
    use crate::test_utils::{mint_token, SignatureBuilder};
    use zeroize::Zeroizing;

    const KEY: &[u8] = b"zone-key";
    const UA: &str = "Mozilla/5.0 (X11; Linux x86_64)";
    const REQUEST_TIME: u32 = 1_700_000_000;
    const SIGNATURE_TIME: u32 = 1_700_000_002;
    const NOW: u64 = 1_700_000_100;

    fn request(role: SignRole, ips: &[&str], expiry: Option<u32>) -> VerificationRequest {
        VerificationRequest {
            signature: String::new(),
            user_agent: UA.to_string(),
            role,
            key: Zeroizing::new(KEY.to_vec()),
            candidate_ips: ips.iter().map(|s| s.to_string()).collect(),
            expiry_seconds: expiry,
        }
    }

    fn customer_envelope(sign_type: u8, token: &[u8], token_v6: Option<&[u8]>) -> SignatureEnvelope {
        let mut builder = SignatureBuilder::v4()
            .ulong(0x00, REQUEST_TIME)
            .ulong(0x01, SIGNATURE_TIME)
            .uchar(0x81, sign_type)
            .string(0xC1, token);
        if let Some(v6) = token_v6 {
            builder = builder.string(0xC3, v6);
        }
        decode_v4(&builder.build_bytes()).unwrap()
    }

    fn junk_token(ip: &str) -> Vec<u8> {
        mint_token(KEY, Verdict::Junk, REQUEST_TIME, SIGNATURE_TIME, ip, UA)
    }

    #[test]
    fn test_hmac_is_deterministic_and_key_bound() {
        let a = compute_token(KEY, b"message").unwrap();
        let b = compute_token(KEY, b"message").unwrap();
        let c = compute_token(b"other", b"message").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_single_differing_byte_never_matches() {
        let digest = compute_token(KEY, b"message").unwrap();
        for i in 0..digest.len() {
            let mut forged = digest;
            forged[i] ^= 0x01;
            assert!(!tokens_match(&digest, &forged));
        }
        assert!(!tokens_match(&digest, &digest[..31]));
        assert!(tokens_match(&digest, &digest));
    }

    #[test]
    fn test_canonical_message_layout() {
        let message = canonical_message(Verdict::Proxy, 10, 11, "1.2.3.4", "UA");
        assert_eq!(message, b"6\n10\n11\n1.2.3.4\nUA".to_vec());
    }

    #[test]
    fn test_no_role_token_is_role_mismatch() {
        let env = decode_v4(&[4, 0]).unwrap();
        let result = verify_envelope(&env, &request(SignRole::Customer, &["1.2.3.4"], None), NOW);
        assert_eq!(result.error_message(), Some(ROLE_MISMATCH));
    }

    #[test]
    fn test_empty_role_token_is_role_mismatch() {
        let env = customer_envelope(1, b"", None);
        let result = verify_envelope(&env, &request(SignRole::Customer, &["1.2.3.4"], None), NOW);
        assert_eq!(result.error_message(), Some(ROLE_MISMATCH));
    }

    #[test]
    fn test_junk_verdict_ipv4() {
        let env = customer_envelope(1, &junk_token("10.0.0.1"), None);
        let result = verify_envelope(&env, &request(SignRole::Customer, &["10.0.0.1"], None), NOW);

        assert_eq!(
            result,
            VerificationResult::Success {
                score: 3,
                verdict: Verdict::Junk,
                ip_address: "10.0.0.1".into(),
                request_time: i64::from(REQUEST_TIME),
                signature_time: i64::from(SIGNATURE_TIME),
            }
        );
    }

    #[test]
    fn test_every_verdict_is_recognized() {
        for verdict in Verdict::ALL {
            let token = mint_token(KEY, verdict, REQUEST_TIME, SIGNATURE_TIME, "10.0.0.1", UA);
            let env = customer_envelope(1, &token, None);
            let result =
                verify_envelope(&env, &request(SignRole::Customer, &["10.0.0.1"], None), NOW);
            match result {
                VerificationResult::Success { score, verdict: v, .. } => {
                    assert_eq!(v, verdict);
                    assert_eq!(score, verdict.code());
                }
                other => panic!("expected success, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_first_matching_candidate_wins() {
        let env = customer_envelope(1, &junk_token("10.0.0.2"), None);
        let req = request(SignRole::Customer, &["", "10.0.0.1", "10.0.0.2", "10.0.0.3"], None);

        match verify_envelope(&env, &req, NOW) {
            VerificationResult::Success { ip_address, .. } => assert_eq!(ip_address, "10.0.0.2"),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_user_agent_or_key_yields_no_verdict() {
        let env = customer_envelope(1, &junk_token("10.0.0.1"), None);

        let mut req = request(SignRole::Customer, &["10.0.0.1"], None);
        req.user_agent = "curl/8.0".into();
        assert_eq!(verify_envelope(&env, &req, NOW).error_message(), Some(NO_VERDICT));

        let mut req = request(SignRole::Customer, &["10.0.0.1"], None);
        req.key = Zeroizing::new(b"wrong".to_vec());
        assert_eq!(verify_envelope(&env, &req, NOW).error_message(), Some(NO_VERDICT));
    }

    #[test]
    fn test_role_selects_token_set() {
        let env = customer_envelope(1, &junk_token("10.0.0.1"), None);
        let result = verify_envelope(&env, &request(SignRole::Master, &["10.0.0.1"], None), NOW);
        assert_eq!(result.error_message(), Some(ROLE_MISMATCH));
    }

    #[test]
    fn test_ipv6_uses_v6_token_and_abbreviated_address() {
        let abbreviated = ipv6::abbreviate("2001:db8::1").unwrap();
        let env = customer_envelope(1, b"ipv4-token", Some(&junk_token(&abbreviated)));

        match verify_envelope(&env, &request(SignRole::Customer, &["2001:db8::1"], None), NOW) {
            VerificationResult::Success { ip_address, verdict, .. } => {
                assert_eq!(ip_address, abbreviated);
                assert_eq!(verdict, Verdict::Junk);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_ipv6_without_v6_token_is_skipped() {
        let env = customer_envelope(1, &junk_token("10.0.0.1"), None);
        let req = request(SignRole::Customer, &["2001:db8::1", "10.0.0.1"], None);
        assert!(verify_envelope(&env, &req, NOW).is_success());

        let req = request(SignRole::Customer, &["2001:db8::1"], None);
        assert_eq!(verify_envelope(&env, &req, NOW).error_message(), Some(NO_VERDICT));
    }

    #[test]
    fn test_sign_type_two_is_unsupported() {
        let env = customer_envelope(2, b"token", None);
        let result = verify_envelope(&env, &request(SignRole::Customer, &["10.0.0.1"], None), NOW);
        assert_eq!(result.error_message(), Some("unsupported signature"));
    }

    #[test]
    fn test_unknown_sign_type_is_unrecognized() {
        let env = customer_envelope(7, b"token", None);
        let result = verify_envelope(&env, &request(SignRole::Customer, &["10.0.0.1"], None), NOW);
        assert_eq!(result.error_message(), Some("unrecognized signature"));
    }

    #[test]
    fn test_sign_type_not_checked_without_usable_candidate() {
        let env = customer_envelope(2, b"token", None);
        let result = verify_envelope(&env, &request(SignRole::Customer, &[""], None), NOW);
        assert_eq!(result.error_message(), Some(NO_VERDICT));
    }

    #[test]
    fn test_missing_sign_type_is_an_error() {
        let raw = SignatureBuilder::v4().string(0xC1, b"token").build_bytes();
        let env = decode_v4(&raw).unwrap();
        let result = verify_envelope(&env, &request(SignRole::Customer, &["10.0.0.1"], None), NOW);
        assert_eq!(
            result.error_message(),
            Some("missing signature field: customerSignType")
        );
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let env = customer_envelope(1, &junk_token("10.0.0.1"), None);
        let exact = (NOW - u64::from(SIGNATURE_TIME)) as u32;

        let req = request(SignRole::Customer, &["10.0.0.1"], Some(exact));
        assert!(verify_envelope(&env, &req, NOW).is_success());

        let req = request(SignRole::Customer, &["10.0.0.1"], Some(exact - 1));
        assert_eq!(
            verify_envelope(&env, &req, NOW),
            VerificationResult::Expired {
                request_time: i64::from(REQUEST_TIME),
                signature_time: i64::from(SIGNATURE_TIME),
            }
        );
    }

    #[test]
    fn test_expiry_only_applies_to_matches() {
        let env = customer_envelope(1, &junk_token("10.0.0.1"), None);
        let req = request(SignRole::Customer, &["10.0.0.9"], Some(0));
        assert_eq!(verify_envelope(&env, &req, NOW).error_message(), Some(NO_VERDICT));
    }

    #[test]
    fn test_idempotent_under_fixed_clock() {
        let env = customer_envelope(1, &junk_token("10.0.0.1"), None);
        let req = request(SignRole::Customer, &["10.0.0.1"], Some(10));
        let first = verify_envelope(&env, &req, NOW);
        for _ in 0..5 {
            assert_eq!(verify_envelope(&env, &req, NOW), first);
        }
    }
}
