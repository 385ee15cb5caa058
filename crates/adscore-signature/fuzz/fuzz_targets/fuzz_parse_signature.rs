//! Fuzz target for the signature decoder.
//!
//! Feeds raw bytes straight into both wire-format decoders. Every declared
//! length comes from the input, so this exercises the bounds checks.
//!
//! ## Running
//!
//! ```bash
//! cd crates/adscore-signature
//! cargo +nightly fuzz run fuzz_parse_signature
//! ```

#![no_main]

use adscore_signature::domain::parser::{decode_v3, decode_v4};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must never panic, regardless of input
    let v4 = decode_v4(data);

    // Deterministic
    assert_eq!(v4, decode_v4(data));

    // A successful v4 parse always reports version 4
    if let Ok(envelope) = &v4 {
        assert_eq!(envelope.version(), 4);
    }

    if let Ok(envelope) = decode_v3(data, u64::from(u32::MAX)) {
        assert_eq!(envelope.version(), 3);
    }
});
