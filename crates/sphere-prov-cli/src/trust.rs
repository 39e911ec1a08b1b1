//! # Trust-Anchor Subcommand

use std::io::Write;

use anyhow::Result;
use clap::Args;

use sphere_prov_core::{trust_anchor_fingerprint, DIGICERT_GLOBAL_ROOT_CA};

/// Arguments for `sphere-prov trust-anchor`.
#[derive(Args, Debug)]
pub struct TrustAnchorArgs {
    /// Print the SHA-256 fingerprint instead of the PEM.
    #[arg(long)]
    pub fingerprint: bool,
}

/// Execute the trust-anchor subcommand.
pub fn run_trust_anchor(args: &TrustAnchorArgs, out: &mut impl Write) -> Result<u8> {
    if args.fingerprint {
        writeln!(out, "{}", trust_anchor_fingerprint())?;
    } else {
        // The PEM already ends in CRLF.
        out.write_all(DIGICERT_GLOBAL_ROOT_CA.as_bytes())?;
    }
    Ok(0)
}
