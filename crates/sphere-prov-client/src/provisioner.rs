//! # Provisioning Orchestration
//!
//! [`Provisioner::provision`] runs one complete provisioning attempt:
//!
//! 1. Validate the scope and resolve its regional profile. Nothing is
//!    probed or acquired for a rejected scope.
//! 2. Gate on network, then device-auth readiness.
//! 3. Initialize the attest subsystem under an [`AttestGuard`].
//! 4. Open, configure and register a DPS session, then poll it.
//! 5. Hand the assignment off to a new hub client.
//!
//! The guard is the first resource acquired and the last released. The DPS
//! client is gone before the hub client exists. On success the hub client
//! is the only resource that survives the call.

use sphere_prov_core::{
    resolve_region, ProvisioningError, ProvisioningReturn, ScopeId, SecureDeviceType,
};

use crate::attest::AttestGuard;
use crate::config::ProvisioningConfig;
use crate::handoff::hand_off;
use crate::platform::{AttestSubsystem, DpsTransport, HubTransport, ReadinessProbe};
use crate::polling::{Pacer, PollBudget, ThreadPacer};
use crate::preflight::check_readiness;
use crate::session::{DpsSession, SessionPhase, SessionReport};

/// Owns the collaborators for provisioning calls.
///
/// Reusable: every call acquires and releases its own resources, so
/// repeated calls each produce an independent hub client.
#[derive(Debug)]
pub struct Provisioner<R, A, D, H, P = ThreadPacer> {
    probe: R,
    attest: A,
    dps: D,
    hub: H,
    pacer: P,
}

impl<R, A, D, H> Provisioner<R, A, D, H, ThreadPacer>
where
    R: ReadinessProbe,
    A: AttestSubsystem,
    D: DpsTransport,
    H: HubTransport,
{
    /// A provisioner that sleeps the calling thread between polls.
    pub fn new(probe: R, attest: A, dps: D, hub: H) -> Self {
        Self {
            probe,
            attest,
            dps,
            hub,
            pacer: ThreadPacer,
        }
    }
}

impl<R, A, D, H, P> Provisioner<R, A, D, H, P>
where
    R: ReadinessProbe,
    A: AttestSubsystem,
    D: DpsTransport,
    H: HubTransport,
    P: Pacer,
{
    /// Replace the pause between polls.
    pub fn with_pacer<Q: Pacer>(self, pacer: Q) -> Provisioner<R, A, D, H, Q> {
        Provisioner {
            probe: self.probe,
            attest: self.attest,
            dps: self.dps,
            hub: self.hub,
            pacer,
        }
    }

    /// The attest subsystem.
    pub fn attest(&self) -> &A {
        &self.attest
    }

    /// Provision the device and return a configured hub client.
    ///
    /// `scope_id` must start with `0ne` (global) or `0cn` (China).
    /// `timeout_ms` bounds registration polling in 100 ms ticks; values
    /// below one tick still poll once.
    ///
    /// # Errors
    ///
    /// Every failure is a [`ProvisioningError`]; encode it with
    /// [`ProvisioningReturn::from`] for the wire form. No client handle is
    /// returned or leaked on failure.
    pub fn provision(
        &mut self,
        scope_id: &str,
        timeout_ms: u32,
    ) -> Result<H::Client, ProvisioningError> {
        self.provision_with_report(scope_id, timeout_ms).0
    }

    /// [`Self::provision`] with the configuration's scope and timeout.
    pub fn provision_configured(
        &mut self,
        config: &ProvisioningConfig,
    ) -> Result<H::Client, ProvisioningError> {
        self.provision(config.scope_id.as_str(), config.timeout_ms)
    }

    /// [`Self::provision`], also returning the phases visited and the
    /// number of polling ticks.
    pub fn provision_with_report(
        &mut self,
        scope_id: &str,
        timeout_ms: u32,
    ) -> (Result<H::Client, ProvisioningError>, SessionReport) {
        let mut report = SessionReport::new();
        let result = self.run(scope_id, timeout_ms, &mut report);
        let encoded = ProvisioningReturn::from_result(&result);
        report.set_result(encoded);
        match &result {
            Ok(_) => tracing::info!(ticks = report.ticks(), "provisioning complete"),
            Err(e) => {
                tracing::debug!(result = %encoded, error = %e, "provisioning did not complete")
            }
        }
        (result, report)
    }

    fn run(
        &mut self,
        scope_id: &str,
        timeout_ms: u32,
        report: &mut SessionReport,
    ) -> Result<H::Client, ProvisioningError> {
        let scope = ScopeId::new(scope_id)?;
        let profile = resolve_region(&scope).map_err(|e| {
            tracing::error!(scope_prefix = scope.prefix(), "unknown DPS scope prefix");
            ProvisioningError::from(e)
        })?;
        tracing::debug!(
            scope_prefix = profile.scope_prefix,
            endpoint = profile.endpoint,
            timeout_ms,
            "starting provisioning"
        );

        check_readiness(&mut self.probe)?;

        let _attest = AttestGuard::init(&mut self.attest, SecureDeviceType::X509).map_err(|e| {
            tracing::error!(error = %e, "attest subsystem init failed");
            ProvisioningError::Generic {
                operation: "attest init",
                reason: e.to_string(),
            }
        })?;
        report.advance(SessionPhase::SecurityInitialized);

        let assignment = DpsSession::open(&mut self.dps, profile, &scope, report)?
            .configure(report)?
            .register(report)?
            .poll(PollBudget::from_timeout_ms(timeout_ms), &mut self.pacer, report)
            .into_assignment()?;
        tracing::info!(
            hub_uri = %assignment.hub_uri,
            hub_region = %assignment.hub_region,
            "DPS assigned IoT hub"
        );

        hand_off(&mut self.hub, assignment)
    }
}
