//! # DPS Session Typestate Machine
//!
//! One registration attempt over a DPS client handle.
//!
//! ```text
//! UNINIT ─attest init──▶ SECURITY_INITIALIZED ─open()──▶ CLIENT_CREATED
//!                                                              │
//!                                                         configure()
//!                                                              ▼
//!                                                         CONFIGURED
//!                                                              │
//!                                                         register()
//!                                                              ▼
//!                                                         REGISTERING
//!                                                              │
//!                                          ┌──────── poll() ───┼───────────┐
//!                                          ▼                   ▼           ▼
//!                                      ASSIGNED             FAILED     TIMED_OUT
//! ```
//!
//! `DpsSession<C, S>` owns the client. Each transition consumes the session;
//! a failed transition returns the error and drops the session, which drops
//! (destroys) the client. `poll()` destroys the client itself before it
//! returns the [`Settlement`], so no DPS handle outlives the polling loop.
//!
//! The first two phases belong to the caller frame (the attest guard), so
//! they are recorded in the [`SessionReport`] by the provisioner rather than
//! by a session type.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sphere_prov_core::{
    trust_anchor_fingerprint, DeviceOption, ProvDeviceError, ProvisioningError, ProvisioningReturn,
    Protocol, RegionalProfile, ScopeId,
};

use crate::context::{Assignment, RegistrationContext};
use crate::platform::{DpsClient, DpsTransport};
use crate::polling::{Pacer, PollBudget, POLL_INTERVAL};

// ── Runtime phase ────────────────────────────────────────────────────

/// Runtime name of a session phase, for reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Call entry; nothing acquired.
    Uninit,
    /// Attest subsystem initialized.
    SecurityInitialized,
    /// DPS client created.
    ClientCreated,
    /// Device id and, for the China scope, trust anchor applied.
    Configured,
    /// Registration accepted; polling.
    Registering,
    /// Service assigned a hub. Terminal.
    Assigned,
    /// Service reported a failure. Terminal.
    Failed,
    /// Budget spent without a callback. Terminal.
    TimedOut,
}

impl SessionPhase {
    /// The canonical phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninit => "UNINIT",
            Self::SecurityInitialized => "SECURITY_INITIALIZED",
            Self::ClientCreated => "CLIENT_CREATED",
            Self::Configured => "CONFIGURED",
            Self::Registering => "REGISTERING",
            Self::Assigned => "ASSIGNED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        }
    }

    /// Whether no further transitions exist.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assigned | Self::Failed | Self::TimedOut)
    }

    /// Phases reachable in one successful transition.
    pub fn valid_transitions(&self) -> &'static [SessionPhase] {
        match self {
            Self::Uninit => &[Self::SecurityInitialized],
            Self::SecurityInitialized => &[Self::ClientCreated],
            Self::ClientCreated => &[Self::Configured],
            Self::Configured => &[Self::Registering],
            Self::Registering => &[Self::Assigned, Self::Failed, Self::TimedOut],
            Self::Assigned | Self::Failed | Self::TimedOut => &[],
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Report ───────────────────────────────────────────────────────────

/// One recorded phase change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase before.
    pub from: SessionPhase,
    /// Phase after.
    pub to: SessionPhase,
    /// When it happened.
    pub at: DateTime<Utc>,
}

/// What one provisioning call went through.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    transitions: Vec<PhaseTransition>,
    ticks: u32,
    result: Option<ProvisioningReturn>,
}

impl SessionReport {
    /// An empty report at `UNINIT`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    pub fn phase(&self) -> SessionPhase {
        self.transitions
            .last()
            .map(|t| t.to)
            .unwrap_or(SessionPhase::Uninit)
    }

    /// Every phase visited, starting at `UNINIT`.
    pub fn phases(&self) -> Vec<SessionPhase> {
        std::iter::once(SessionPhase::Uninit)
            .chain(self.transitions.iter().map(|t| t.to))
            .collect()
    }

    /// Number of `do_work` ticks performed.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// The encoded result, once the call has returned.
    pub fn result(&self) -> Option<ProvisioningReturn> {
        self.result
    }

    pub(crate) fn advance(&mut self, to: SessionPhase) {
        let from = self.phase();
        debug_assert!(
            from.valid_transitions().contains(&to),
            "invalid session transition {from} -> {to}"
        );
        tracing::debug!(%from, %to, "session transition");
        self.transitions.push(PhaseTransition {
            from,
            to,
            at: Utc::now(),
        });
    }

    pub(crate) fn set_result(&mut self, result: ProvisioningReturn) {
        self.result = Some(result);
    }
}

// ── State types ──────────────────────────────────────────────────────

/// DPS client created, no options applied.
#[derive(Debug, Clone, Copy)]
pub struct ClientCreated;

/// Options applied, registration not yet started.
#[derive(Debug, Clone, Copy)]
pub struct Configured;

/// Registration accepted by the client.
#[derive(Debug, Clone, Copy)]
pub struct Registering;

/// Marker trait for session states. Sealed.
pub trait SessionState: private::Sealed + std::fmt::Debug {
    /// The runtime phase this state corresponds to.
    const PHASE: SessionPhase;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::ClientCreated {}
    impl Sealed for super::Configured {}
    impl Sealed for super::Registering {}
}

impl SessionState for ClientCreated {
    const PHASE: SessionPhase = SessionPhase::ClientCreated;
}
impl SessionState for Configured {
    const PHASE: SessionPhase = SessionPhase::Configured;
}
impl SessionState for Registering {
    const PHASE: SessionPhase = SessionPhase::Registering;
}

// ── Settlement ───────────────────────────────────────────────────────

/// How the polling loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The service assigned a hub.
    Assigned(Assignment),
    /// The service reported a failure.
    Failed(ProvDeviceError),
    /// The budget ran out before the callback fired.
    TimedOut,
}

impl Settlement {
    /// The terminal phase this settlement corresponds to.
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Assigned(_) => SessionPhase::Assigned,
            Self::Failed(_) => SessionPhase::Failed,
            Self::TimedOut => SessionPhase::TimedOut,
        }
    }

    /// The assignment, or the DPS error the settlement encodes to.
    pub fn into_assignment(self) -> Result<Assignment, ProvisioningError> {
        match self {
            Self::Assigned(assignment) => Ok(assignment),
            Self::Failed(code) => Err(ProvisioningError::ProvDevice {
                operation: "registration",
                code,
            }),
            Self::TimedOut => Err(ProvisioningError::ProvDevice {
                operation: "registration",
                code: ProvDeviceError::Timeout,
            }),
        }
    }
}

// ── The session ──────────────────────────────────────────────────────

/// A DPS registration attempt, parameterized by its phase.
///
/// ```text
/// let session = DpsSession::open(&mut dps, profile, &scope, &mut report)?;
/// // session.poll(..); // ERROR: no method named `poll` on `DpsSession<_, ClientCreated>`
/// ```
pub struct DpsSession<C: DpsClient, S: SessionState> {
    client: C,
    profile: &'static RegionalProfile,
    _state: PhantomData<S>,
}

impl<C: DpsClient, S: SessionState> DpsSession<C, S> {
    /// The current phase.
    pub fn phase(&self) -> SessionPhase {
        S::PHASE
    }

    fn advance<T: SessionState>(self, report: &mut SessionReport) -> DpsSession<C, T> {
        report.advance(T::PHASE);
        DpsSession {
            client: self.client,
            profile: self.profile,
            _state: PhantomData,
        }
    }
}

impl<C: DpsClient, S: SessionState> std::fmt::Debug for DpsSession<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DpsSession")
            .field("phase", &S::PHASE)
            .field("endpoint", &self.profile.endpoint)
            .finish_non_exhaustive()
    }
}

impl<C: DpsClient> DpsSession<C, ClientCreated> {
    /// Create the DPS client for the profile's endpoint.
    ///
    /// The scope is passed to the transport verbatim.
    pub fn open<T>(
        transport: &mut T,
        profile: &'static RegionalProfile,
        scope: &ScopeId,
        report: &mut SessionReport,
    ) -> Result<Self, ProvisioningError>
    where
        T: DpsTransport<Client = C>,
    {
        let Some(client) = transport.create(profile.endpoint, scope, Protocol::Mqtt) else {
            tracing::error!(endpoint = profile.endpoint, "DPS client create failed");
            return Err(ProvisioningError::ProvDevice {
                operation: "client create",
                code: ProvDeviceError::Error,
            });
        };
        tracing::debug!(endpoint = profile.endpoint, "DPS client created");
        report.advance(SessionPhase::ClientCreated);
        Ok(Self {
            client,
            profile,
            _state: PhantomData,
        })
    }

    /// Apply the device id, then the trust anchor if the scope selected a
    /// region that requires it.
    pub fn configure(
        mut self,
        report: &mut SessionReport,
    ) -> Result<DpsSession<C, Configured>, ProvisioningError> {
        self.client
            .set_option(DeviceOption::device_id())
            .map_err(|code| option_failed("set device id", code))?;

        if self.profile.extra_trust_required {
            self.client
                .set_option(DeviceOption::trust_anchor())
                .map_err(|code| option_failed("set trusted cert", code))?;
            tracing::debug!(
                fingerprint = %trust_anchor_fingerprint(),
                "trust anchor installed on DPS client"
            );
        }

        Ok(self.advance(report))
    }
}

fn option_failed(operation: &'static str, code: ProvDeviceError) -> ProvisioningError {
    tracing::error!(operation, %code, "DPS client set option failed");
    ProvisioningError::ProvDevice { operation, code }
}

impl<C: DpsClient> DpsSession<C, Configured> {
    /// Start registration.
    pub fn register(
        mut self,
        report: &mut SessionReport,
    ) -> Result<DpsSession<C, Registering>, ProvisioningError> {
        self.client.register_device().map_err(|code| {
            tracing::error!(%code, "DPS register device failed");
            ProvisioningError::ProvDevice {
                operation: "register device",
                code,
            }
        })?;
        Ok(self.advance(report))
    }
}

impl<C: DpsClient> DpsSession<C, Registering> {
    /// Drive `do_work` until the registration callback fires or the budget
    /// is spent, pausing [`POLL_INTERVAL`] after every tick. The DPS client
    /// is destroyed before this returns.
    pub fn poll<P: Pacer>(
        self,
        budget: PollBudget,
        pacer: &mut P,
        report: &mut SessionReport,
    ) -> Settlement {
        let Self { mut client, .. } = self;
        let mut context = RegistrationContext::new();
        let mut remaining = budget.ticks();

        loop {
            client.do_work(&mut context);
            report.ticks += 1;
            tracing::debug!(tick = report.ticks, "DPS do-work");
            pacer.pause(POLL_INTERVAL);
            remaining -= 1;
            if context.is_complete() || remaining == 0 {
                break;
            }
        }

        drop(client);

        let settlement = match context.into_outcome() {
            Some(Ok(assignment)) => Settlement::Assigned(assignment),
            Some(Err(code)) => Settlement::Failed(code),
            None => {
                tracing::error!(
                    ticks = report.ticks,
                    deadline_ms = budget.deadline().as_millis() as u64,
                    "provisioning timeout"
                );
                Settlement::TimedOut
            }
        };
        report.advance(settlement.phase());
        settlement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{scripted_dps, PlatformEvent, Script, SimPacer};

    fn prepared_report() -> SessionReport {
        let mut report = SessionReport::new();
        report.advance(SessionPhase::SecurityInitialized);
        report
    }

    fn scope(s: &str) -> ScopeId {
        ScopeId::new(s).unwrap()
    }

    #[test]
    fn phase_names_and_terminality() {
        assert_eq!(SessionPhase::SecurityInitialized.to_string(), "SECURITY_INITIALIZED");
        assert_eq!(SessionPhase::TimedOut.as_str(), "TIMED_OUT");
        assert!(SessionPhase::Assigned.is_terminal());
        assert!(SessionPhase::Failed.is_terminal());
        assert!(!SessionPhase::Registering.is_terminal());
    }

    #[test]
    fn phase_serialization_uses_canonical_names() {
        let json = serde_json::to_string(&SessionPhase::ClientCreated).unwrap();
        assert_eq!(json, "\"CLIENT_CREATED\"");
        let back: SessionPhase = serde_json::from_str("\"TIMED_OUT\"").unwrap();
        assert_eq!(back, SessionPhase::TimedOut);
    }

    #[test]
    fn valid_transitions_form_a_chain() {
        assert_eq!(
            SessionPhase::Uninit.valid_transitions(),
            &[SessionPhase::SecurityInitialized]
        );
        assert_eq!(
            SessionPhase::Registering.valid_transitions(),
            &[
                SessionPhase::Assigned,
                SessionPhase::Failed,
                SessionPhase::TimedOut
            ]
        );
        assert!(SessionPhase::TimedOut.valid_transitions().is_empty());
    }

    #[test]
    fn typestate_walk_records_every_phase() {
        let (mut dps, journal) = scripted_dps(Script::assign_after(3, "myhub.azure-devices.net"));
        let mut pacer = SimPacer::new(journal.clone());
        let mut report = prepared_report();

        let session = DpsSession::open(
            &mut dps,
            &RegionalProfile::GLOBAL,
            &scope("0ne00ABCDEF"),
            &mut report,
        )
        .unwrap();
        assert_eq!(session.phase(), SessionPhase::ClientCreated);
        let session = session.configure(&mut report).unwrap();
        assert_eq!(session.phase(), SessionPhase::Configured);
        let session = session.register(&mut report).unwrap();
        assert_eq!(session.phase(), SessionPhase::Registering);

        let settlement = session.poll(PollBudget::from_timeout_ms(30_000), &mut pacer, &mut report);
        assert_eq!(settlement.phase(), SessionPhase::Assigned);
        assert_eq!(report.ticks(), 3);
        assert_eq!(
            report.phases(),
            vec![
                SessionPhase::Uninit,
                SessionPhase::SecurityInitialized,
                SessionPhase::ClientCreated,
                SessionPhase::Configured,
                SessionPhase::Registering,
                SessionPhase::Assigned,
            ]
        );
        assert_eq!(journal.count(|e| matches!(e, PlatformEvent::DpsDestroy)), 1);
    }

    #[test]
    fn global_profile_skips_dps_trust_anchor() {
        let (mut dps, journal) = scripted_dps(Script::default());
        let mut report = prepared_report();
        DpsSession::open(
            &mut dps,
            &RegionalProfile::GLOBAL,
            &scope("0ne1"),
            &mut report,
        )
        .unwrap()
        .configure(&mut report)
        .unwrap();
        assert_eq!(journal.dps_option_keys(), vec!["SetDeviceId"]);
    }

    #[test]
    fn china_profile_applies_dps_trust_anchor_after_device_id() {
        let (mut dps, journal) = scripted_dps(Script::default());
        let mut report = prepared_report();
        DpsSession::open(
            &mut dps,
            &RegionalProfile::CHINA,
            &scope("0cn1"),
            &mut report,
        )
        .unwrap()
        .configure(&mut report)
        .unwrap();
        assert_eq!(journal.dps_option_keys(), vec!["SetDeviceId", "TrustedCerts"]);
    }

    #[test]
    fn failed_option_destroys_client() {
        let script =
            Script::default().with_dps_option_failure("TrustedCerts", ProvDeviceError::InvalidArg);
        let (mut dps, journal) = scripted_dps(script);
        let mut report = prepared_report();
        let err = DpsSession::open(
            &mut dps,
            &RegionalProfile::CHINA,
            &scope("0cn1"),
            &mut report,
        )
        .unwrap()
        .configure(&mut report)
        .unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::ProvDevice {
                operation: "set trusted cert",
                code: ProvDeviceError::InvalidArg,
            }
        );
        assert_eq!(journal.count(|e| matches!(e, PlatformEvent::DpsDestroy)), 1);
        assert_eq!(report.phase(), SessionPhase::ClientCreated);
    }

    #[test]
    fn poll_times_out_after_budget() {
        let (mut dps, journal) = scripted_dps(Script::never_assigned());
        let mut pacer = SimPacer::new(journal.clone());
        let mut report = prepared_report();
        let settlement = DpsSession::open(
            &mut dps,
            &RegionalProfile::GLOBAL,
            &scope("0ne1"),
            &mut report,
        )
        .unwrap()
        .configure(&mut report)
        .unwrap()
        .register(&mut report)
        .unwrap()
        .poll(PollBudget::from_timeout_ms(500), &mut pacer, &mut report);

        assert_eq!(settlement, Settlement::TimedOut);
        assert_eq!(report.ticks(), 5);
        assert_eq!(journal.elapsed(), std::time::Duration::from_millis(500));
        assert!(settlement.into_assignment().unwrap_err().is_timeout());
    }

    #[test]
    fn poll_reports_service_failure() {
        let (mut dps, journal) = scripted_dps(Script::fail_after(2, ProvDeviceError::Unauthorized));
        let mut pacer = SimPacer::new(journal);
        let mut report = prepared_report();
        let settlement = DpsSession::open(
            &mut dps,
            &RegionalProfile::GLOBAL,
            &scope("0ne1"),
            &mut report,
        )
        .unwrap()
        .configure(&mut report)
        .unwrap()
        .register(&mut report)
        .unwrap()
        .poll(PollBudget::from_timeout_ms(1_000), &mut pacer, &mut report);
        assert_eq!(settlement, Settlement::Failed(ProvDeviceError::Unauthorized));
        assert_eq!(report.phase(), SessionPhase::Failed);
        assert_eq!(report.ticks(), 2);
    }

    #[test]
    fn create_failure_is_generic_dps_error() {
        let (mut dps, _journal) = scripted_dps(Script::default().with_dps_create_failure());
        let mut report = prepared_report();
        let err = DpsSession::open(
            &mut dps,
            &RegionalProfile::GLOBAL,
            &scope("0ne1"),
            &mut report,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::ProvDevice {
                operation: "client create",
                code: ProvDeviceError::Error,
            }
        );
        assert_eq!(report.phase(), SessionPhase::SecurityInitialized);
    }
}
