//! Fuzz target for the full verify call.
//!
//! ## Running
//!
//! ```bash
//! cd crates/adscore-signature
//! cargo +nightly fuzz run fuzz_verify
//! ```

#![no_main]

use adscore_signature::{
    LegacyPayloadCheck, SignRole, SignatureVerificationService, TimeSource, VerificationResult,
    VerifyOptions,
};
use libfuzzer_sys::fuzz_target;

struct Frozen(u64);

impl TimeSource for Frozen {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Fuzz input structure for verification.
#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    signature: String,
    user_agent: String,
    master: bool,
    key: String,
    raw_key: bool,
    candidate_ips: Vec<String>,
    expiry: Option<u32>,
    standard_v3: bool,
    now: u64,
}

fuzz_target!(|input: FuzzInput| {
    let service = SignatureVerificationService::new(Frozen(input.now));
    let role = if input.master {
        SignRole::Master
    } else {
        SignRole::Customer
    };

    let mut options = VerifyOptions::default();
    options.expiry_seconds = input.expiry;
    options.is_key_base64_encoded = !input.raw_key;
    if input.standard_v3 {
        options.legacy_payload_check = LegacyPayloadCheck::Standard;
    }

    // Verify - this should NEVER panic, regardless of input
    let result = service.verify_signature(
        &input.signature,
        &input.user_agent,
        role,
        &input.key,
        input.candidate_ips.iter().cloned(),
        &options,
    );

    // Deterministic under a fixed clock
    let again = service.verify_signature(
        &input.signature,
        &input.user_agent,
        role,
        &input.key,
        input.candidate_ips.iter().cloned(),
        &options,
    );
    assert_eq!(result, again);

    // A match is always reported against a non-empty candidate
    if let VerificationResult::Success { ip_address, .. } = &result {
        assert!(!ip_address.is_empty());
    }
});
