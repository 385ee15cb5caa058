//! adscore-verify: verify an AdScore signature from the command line.
//!
//! Prints the verification result as JSON on stdout.
//!
//! ## Exit status
//!
//! | Code | Result |
//! |------|--------|
//! | 0 | success |
//! | 1 | expired |
//! | 2 | error |

use std::process::ExitCode;

use adscore_signature::{
    LegacyPayloadCheck, SignRole, SignatureVerificationService, SystemTimeSource,
    VerificationResult, VerifyOptions,
};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Verify an AdScore signature against candidate IP addresses
#[derive(Parser, Debug)]
#[command(name = "adscore-verify")]
#[command(about = "Verify an AdScore signature and print the verdict as JSON")]
struct Args {
    /// Base64url-encoded signature
    #[arg(short, long)]
    signature: String,

    /// Full user agent string of the scored request
    #[arg(short, long)]
    user_agent: String,

    /// Sign role: "customer" for AdScore customers, "master" otherwise
    #[arg(short, long, default_value = "customer")]
    role: SignRole,

    /// Zone key (base64 unless --raw-key)
    #[arg(short, long, env = "ADSCORE_KEY", hide_env_values = true)]
    key: String,

    /// Candidate IPv4/IPv6 addresses, tried in order
    #[arg(short, long = "ip", required = true, num_args = 1..)]
    ips: Vec<String>,

    /// Report matches older than this many seconds as expired
    #[arg(short, long)]
    expiry: Option<u32>,

    /// Treat the key as raw text instead of base64
    #[arg(long)]
    raw_key: bool,

    /// Accept non-empty v3 payloads (rejected by default)
    #[arg(long)]
    standard_v3_check: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn options(&self) -> VerifyOptions {
        let mut options = VerifyOptions::default();
        if let Some(expiry) = self.expiry {
            options = options.with_expiry(expiry);
        }
        if self.raw_key {
            options = options.with_raw_key();
        }
        if self.standard_v3_check {
            options = options.with_legacy_payload_check(LegacyPayloadCheck::Standard);
        }
        options
    }
}

fn exit_status(result: &VerificationResult) -> u8 {
    match result {
        VerificationResult::Success { .. } => 0,
        VerificationResult::Expired { .. } => 1,
        VerificationResult::Error { .. } => 2,
    }
}

fn render(result: &VerificationResult, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    };
    json.context("failed to serialize verification result")
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: &Args) -> Result<u8> {
    let service = SignatureVerificationService::new(SystemTimeSource);
    let result = service.verify_signature(
        &args.signature,
        &args.user_agent,
        args.role,
        &args.key,
        args.ips.iter().cloned(),
        &args.options(),
    );
    debug!(?result, "verification finished");

    println!("{}", render(&result, args.pretty)?);
    Ok(exit_status(&result))
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
