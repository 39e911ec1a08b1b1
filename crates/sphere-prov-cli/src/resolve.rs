//! # Resolve Subcommand
//!
//! Prints the regional profile a scope identifier selects.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use sphere_prov_core::{resolve_region, ProvisioningReturn, ProvisioningError, ScopeId};

/// Arguments for `sphere-prov resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// DPS scope identifier (e.g. "0ne00ABCDEF").
    pub scope_id: String,
}

/// Execute the resolve subcommand.
///
/// Exit code 0 with the profile as JSON, or 1 with the encoded
/// invalid-parameter result for an unusable scope.
pub fn run_resolve(args: &ResolveArgs, out: &mut impl Write) -> Result<u8> {
    let resolved = ScopeId::new(args.scope_id.as_str())
        .and_then(|scope| resolve_region(&scope).map(|profile| (scope, profile)));

    match resolved {
        Ok((scope, profile)) => {
            tracing::debug!(
                scope_prefix = scope.prefix(),
                region = %profile.region,
                "scope resolved"
            );
            let json = serde_json::to_string_pretty(profile).context("failed to encode profile")?;
            writeln!(out, "{json}")?;
            Ok(0)
        }
        Err(e) => {
            let encoded = ProvisioningReturn::from(&ProvisioningError::from(e.clone()));
            writeln!(out, "FAIL: {e} ({encoded})")?;
            Ok(1)
        }
    }
}
