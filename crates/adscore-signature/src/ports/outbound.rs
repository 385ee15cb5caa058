//! # Outbound Ports (Driven Ports / SPI)
//!
//! Dependencies the verification service needs from its environment.

/// Source of the current Unix time, in seconds.
///
/// Injected so expiry and future-timestamp checks can run against a fixed
/// clock in tests.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            // Clock before the epoch: report 0 rather than panic
            .unwrap_or(0)
    }
}
