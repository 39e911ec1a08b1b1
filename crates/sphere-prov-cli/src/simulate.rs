//! # Simulate Subcommand
//!
//! Runs the full provisioning flow against the scripted platform and prints
//! a JSON document with the encoded result, the session report and every
//! collaborator call in order. Polling pauses are virtual.
//!
//! Without a scope argument the scope and timeout are read from
//! `SPHERE_DPS_SCOPE_ID` and `SPHERE_DPS_TIMEOUT_MS`.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use sphere_prov_client::sim::{
    scripted, PlatformEvent, ProbeScript, RegistrationScript, Script, DEFAULT_HUB_URI,
};
use sphere_prov_client::{ProvisioningConfig, SessionReport};
use sphere_prov_core::{ProvDeviceError, ProvisioningReturn};

/// Arguments for `sphere-prov simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// DPS scope identifier. Falls back to `SPHERE_DPS_SCOPE_ID`.
    pub scope_id: Option<String>,

    /// Registration timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u32>,

    /// Tick on which the service answers.
    #[arg(long, default_value_t = 1)]
    pub assign_after: u32,

    /// Hub URI the service assigns.
    #[arg(long, default_value = DEFAULT_HUB_URI)]
    pub hub_uri: String,

    /// Fail the registration with this DPS result code instead of assigning.
    #[arg(long, conflicts_with = "never_assign")]
    pub fail_with: Option<ProvDeviceError>,

    /// The service never answers; the run times out.
    #[arg(long)]
    pub never_assign: bool,

    /// Network readiness probe reports not ready.
    #[arg(long)]
    pub network_down: bool,

    /// Device-auth readiness probe reports not ready.
    #[arg(long)]
    pub device_auth_down: bool,
}

impl SimulateArgs {
    fn config(&self) -> Result<(String, u32)> {
        match &self.scope_id {
            Some(scope) => Ok((
                scope.clone(),
                self.timeout_ms
                    .unwrap_or(sphere_prov_client::config::DEFAULT_TIMEOUT_MS),
            )),
            None => {
                let config = ProvisioningConfig::from_env()
                    .context("no scope argument and no usable environment configuration")?;
                Ok((
                    config.scope_id.as_str().to_owned(),
                    self.timeout_ms.unwrap_or(config.timeout_ms),
                ))
            }
        }
    }

    fn script(&self) -> Script {
        let registration = if self.never_assign {
            RegistrationScript::Never
        } else if let Some(code) = self.fail_with {
            RegistrationScript::FailAfter {
                ticks: self.assign_after,
                code,
            }
        } else {
            RegistrationScript::AssignAfter {
                ticks: self.assign_after,
                hub_uri: self.hub_uri.clone(),
            }
        };
        let mut script = Script {
            registration,
            ..Script::default()
        };
        if self.network_down {
            script = script.with_network(ProbeScript::NotReady);
        }
        if self.device_auth_down {
            script = script.with_device_auth(ProbeScript::NotReady);
        }
        script
    }
}

#[derive(Serialize)]
struct SimulationOutput<'a> {
    result: ProvisioningReturn,
    error: Option<String>,
    hub_uri: Option<&'a str>,
    report: &'a SessionReport,
    events: &'a [PlatformEvent],
}

/// Execute the simulate subcommand. Exit code 0 on a successful
/// provisioning, 1 otherwise.
pub fn run_simulate(args: &SimulateArgs, out: &mut impl Write) -> Result<u8> {
    let (scope_id, timeout_ms) = args.config()?;
    let (mut provisioner, journal) = scripted(args.script());

    let (result, report) = provisioner.provision_with_report(&scope_id, timeout_ms);
    let encoded = ProvisioningReturn::from_result(&result);
    let error = result.as_ref().err().map(ToString::to_string);
    let hub = result.ok();

    // Snapshot before the hub client drops so the journal ends at provisioning.
    let events = journal.events();
    let output = SimulationOutput {
        result: encoded,
        error,
        hub_uri: hub.as_ref().map(|h| h.hub_uri()),
        report: &report,
        events: &events,
    };
    let json = serde_json::to_string_pretty(&output).context("failed to encode simulation")?;
    writeln!(out, "{json}")?;

    tracing::info!(result = %encoded, ticks = report.ticks(), "simulation finished");
    Ok(if encoded.is_ok() { 0 } else { 1 })
}
