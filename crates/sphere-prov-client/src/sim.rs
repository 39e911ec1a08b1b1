//! # Scripted Platform
//!
//! In-process implementations of every collaborator trait, driven by a
//! [`Script`] and recording each call into a shared [`Journal`]. Used by the
//! test suite and by `sphere-prov simulate` for dry runs without hardware.
//!
//! Time is virtual: [`SimPacer`] records the pause instead of sleeping, so
//! [`Journal::elapsed`] reports the wall-clock time a real device would
//! have spent polling.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use sphere_prov_core::{
    DeviceOption, IotHubClientError, ProvDeviceError, Protocol, ScopeId, SecureDeviceType,
};

use crate::platform::{
    AttestError, AttestSubsystem, DpsClient, DpsTransport, HubClient, HubTransport, ProbeError,
    ReadinessProbe, RegistrationSink,
};
use crate::polling::Pacer;
use crate::provisioner::Provisioner;

/// Hub URI assigned by [`Script::default`].
pub const DEFAULT_HUB_URI: &str = "sim-hub.azure-devices.net";

// ── Journal ──────────────────────────────────────────────────────────

/// One collaborator call as observed by the scripted platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// Network readiness probed.
    NetworkProbe,
    /// Device-auth readiness probed.
    DeviceAuthProbe,
    /// Attest subsystem initialization attempted.
    AttestInit {
        /// Requested identity kind.
        device_type: SecureDeviceType,
    },
    /// Attest subsystem torn down.
    AttestDeinit,
    /// DPS client creation attempted.
    DpsCreate {
        /// DPS endpoint requested.
        endpoint: String,
        /// Scope identifier as received.
        scope: String,
        /// Transport protocol.
        protocol: Protocol,
    },
    /// DPS option applied.
    DpsSetOption {
        /// SDK option key.
        key: &'static str,
    },
    /// DPS registration started.
    DpsRegister,
    /// DPS `do_work` tick.
    DpsDoWork {
        /// One-based tick number for this client.
        tick: u32,
    },
    /// DPS client destroyed.
    DpsDestroy,
    /// Hub client creation attempted.
    HubCreate {
        /// Assigned hub URI.
        hub_uri: String,
    },
    /// Hub option applied.
    HubSetOption {
        /// Handle of the hub client.
        handle: Uuid,
        /// SDK option key.
        key: &'static str,
    },
    /// Hub client destroyed.
    HubDestroy {
        /// Handle of the hub client.
        handle: Uuid,
    },
    /// Pacer pause.
    Pause {
        /// Pause length in milliseconds.
        ms: u64,
    },
}

/// Shared, append-only record of platform calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<PlatformEvent>>>);

impl Journal {
    /// An empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: PlatformEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<PlatformEvent> {
        self.0.borrow().clone()
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&PlatformEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }

    /// DPS option keys in the order applied.
    pub fn dps_option_keys(&self) -> Vec<&'static str> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PlatformEvent::DpsSetOption { key } => Some(*key),
                _ => None,
            })
            .collect()
    }

    /// Hub option keys in the order applied.
    pub fn hub_option_keys(&self) -> Vec<&'static str> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PlatformEvent::HubSetOption { key, .. } => Some(*key),
                _ => None,
            })
            .collect()
    }

    /// Number of `do_work` ticks recorded.
    pub fn ticks(&self) -> usize {
        self.count(|e| matches!(e, PlatformEvent::DpsDoWork { .. }))
    }

    /// Total virtual time spent in pacer pauses.
    pub fn elapsed(&self) -> Duration {
        let ms = self
            .0
            .borrow()
            .iter()
            .map(|e| match e {
                PlatformEvent::Pause { ms } => *ms,
                _ => 0,
            })
            .sum();
        Duration::from_millis(ms)
    }
}

// ── Script ───────────────────────────────────────────────────────────

/// Scripted answer of a readiness probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeScript {
    /// Reports ready.
    #[default]
    Ready,
    /// Reports not ready.
    NotReady,
    /// The probe call itself fails.
    Fails,
}

/// Scripted behavior of the registration callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationScript {
    /// The callback never fires.
    Never,
    /// The callback reports `hub_uri` on the given tick (at least the first).
    AssignAfter {
        /// Tick the callback fires on.
        ticks: u32,
        /// Hub URI handed to the callback.
        hub_uri: String,
    },
    /// The callback reports `code` on the given tick (at least the first).
    FailAfter {
        /// Tick the callback fires on.
        ticks: u32,
        /// Failure code handed to the callback.
        code: ProvDeviceError,
    },
}

/// Behavior of every scripted collaborator.
#[derive(Debug, Clone)]
pub struct Script {
    /// Network readiness.
    pub network: ProbeScript,
    /// Device-auth readiness.
    pub device_auth: ProbeScript,
    /// Whether attest init fails.
    pub attest_init_fails: bool,
    /// Whether DPS client creation fails.
    pub dps_create_fails: bool,
    /// DPS option key that fails, and with which code.
    pub dps_option_failure: Option<(&'static str, ProvDeviceError)>,
    /// Code returned by `register_device`, if it fails.
    pub register_failure: Option<ProvDeviceError>,
    /// The registration callback.
    pub registration: RegistrationScript,
    /// Whether hub client creation fails.
    pub hub_create_fails: bool,
    /// Hub option key that fails, and with which code.
    pub hub_option_failure: Option<(&'static str, IotHubClientError)>,
}

impl Default for Script {
    fn default() -> Self {
        Self::assign_after(1, DEFAULT_HUB_URI)
    }
}

impl Script {
    /// Everything ready; the service assigns `hub_uri` on tick `ticks`.
    pub fn assign_after(ticks: u32, hub_uri: impl Into<String>) -> Self {
        Self {
            network: ProbeScript::Ready,
            device_auth: ProbeScript::Ready,
            attest_init_fails: false,
            dps_create_fails: false,
            dps_option_failure: None,
            register_failure: None,
            registration: RegistrationScript::AssignAfter {
                ticks,
                hub_uri: hub_uri.into(),
            },
            hub_create_fails: false,
            hub_option_failure: None,
        }
    }

    /// Everything ready; the service fails the registration on tick `ticks`.
    pub fn fail_after(ticks: u32, code: ProvDeviceError) -> Self {
        Self {
            registration: RegistrationScript::FailAfter { ticks, code },
            ..Self::default()
        }
    }

    /// Everything ready; the service never answers.
    pub fn never_assigned() -> Self {
        Self {
            registration: RegistrationScript::Never,
            ..Self::default()
        }
    }

    /// Set the network probe answer.
    pub fn with_network(mut self, probe: ProbeScript) -> Self {
        self.network = probe;
        self
    }

    /// Set the device-auth probe answer.
    pub fn with_device_auth(mut self, probe: ProbeScript) -> Self {
        self.device_auth = probe;
        self
    }

    /// Make attest init fail.
    pub fn with_attest_init_failure(mut self) -> Self {
        self.attest_init_fails = true;
        self
    }

    /// Make DPS client creation fail.
    pub fn with_dps_create_failure(mut self) -> Self {
        self.dps_create_fails = true;
        self
    }

    /// Make the DPS option with `key` fail with `code`.
    pub fn with_dps_option_failure(mut self, key: &'static str, code: ProvDeviceError) -> Self {
        self.dps_option_failure = Some((key, code));
        self
    }

    /// Make `register_device` fail with `code`.
    pub fn with_register_failure(mut self, code: ProvDeviceError) -> Self {
        self.register_failure = Some(code);
        self
    }

    /// Make hub client creation fail.
    pub fn with_hub_create_failure(mut self) -> Self {
        self.hub_create_fails = true;
        self
    }

    /// Make the hub option with `key` fail with `code`.
    pub fn with_hub_option_failure(mut self, key: &'static str, code: IotHubClientError) -> Self {
        self.hub_option_failure = Some((key, code));
        self
    }
}

// ── Collaborators ────────────────────────────────────────────────────

/// Scripted readiness probes.
#[derive(Debug)]
pub struct SimReadiness {
    network: ProbeScript,
    device_auth: ProbeScript,
    journal: Journal,
}

fn answer(probe: ProbeScript, what: &str) -> Result<bool, ProbeError> {
    match probe {
        ProbeScript::Ready => Ok(true),
        ProbeScript::NotReady => Ok(false),
        ProbeScript::Fails => Err(ProbeError(format!("scripted {what} probe failure"))),
    }
}

impl ReadinessProbe for SimReadiness {
    fn is_network_ready(&mut self) -> Result<bool, ProbeError> {
        self.journal.push(PlatformEvent::NetworkProbe);
        answer(self.network, "network")
    }

    fn is_device_auth_ready(&mut self) -> Result<bool, ProbeError> {
        self.journal.push(PlatformEvent::DeviceAuthProbe);
        answer(self.device_auth, "device auth")
    }
}

/// Scripted attest subsystem.
#[derive(Debug)]
pub struct SimAttest {
    fails: bool,
    initialized: bool,
    journal: Journal,
}

impl SimAttest {
    /// Whether the subsystem is currently initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl AttestSubsystem for SimAttest {
    fn init(&mut self, device_type: SecureDeviceType) -> Result<(), AttestError> {
        self.journal.push(PlatformEvent::AttestInit { device_type });
        if self.fails {
            return Err(AttestError("scripted attest init failure".into()));
        }
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) {
        self.journal.push(PlatformEvent::AttestDeinit);
        self.initialized = false;
    }
}

/// Scripted DPS transport.
#[derive(Debug)]
pub struct SimDps {
    create_fails: bool,
    option_failure: Option<(&'static str, ProvDeviceError)>,
    register_failure: Option<ProvDeviceError>,
    registration: RegistrationScript,
    journal: Journal,
}

impl DpsTransport for SimDps {
    type Client = SimDpsClient;

    fn create(
        &mut self,
        endpoint: &str,
        scope: &ScopeId,
        protocol: Protocol,
    ) -> Option<SimDpsClient> {
        self.journal.push(PlatformEvent::DpsCreate {
            endpoint: endpoint.to_owned(),
            scope: scope.as_str().to_owned(),
            protocol,
        });
        if self.create_fails {
            return None;
        }
        Some(SimDpsClient {
            option_failure: self.option_failure,
            register_failure: self.register_failure,
            registration: self.registration.clone(),
            registered: false,
            tick: 0,
            journal: self.journal.clone(),
        })
    }
}

/// Scripted DPS client. Records its destruction on drop.
#[derive(Debug)]
pub struct SimDpsClient {
    option_failure: Option<(&'static str, ProvDeviceError)>,
    register_failure: Option<ProvDeviceError>,
    registration: RegistrationScript,
    registered: bool,
    tick: u32,
    journal: Journal,
}

impl DpsClient for SimDpsClient {
    fn set_option(&mut self, option: DeviceOption) -> Result<(), ProvDeviceError> {
        let key = option.key();
        self.journal.push(PlatformEvent::DpsSetOption { key });
        match self.option_failure {
            Some((failing, code)) if failing == key => Err(code),
            _ => Ok(()),
        }
    }

    fn register_device(&mut self) -> Result<(), ProvDeviceError> {
        self.journal.push(PlatformEvent::DpsRegister);
        if let Some(code) = self.register_failure {
            return Err(code);
        }
        self.registered = true;
        Ok(())
    }

    fn do_work(&mut self, sink: &mut dyn RegistrationSink) {
        self.tick += 1;
        self.journal.push(PlatformEvent::DpsDoWork { tick: self.tick });
        if !self.registered {
            return;
        }
        match &self.registration {
            RegistrationScript::AssignAfter { ticks, hub_uri } if self.tick == (*ticks).max(1) => {
                // The buffer lives only for the callback.
                let buffer = hub_uri.clone();
                sink.on_registration(Ok(&buffer));
            }
            RegistrationScript::FailAfter { ticks, code } if self.tick == (*ticks).max(1) => {
                sink.on_registration(Err(*code));
            }
            _ => {}
        }
    }
}

impl Drop for SimDpsClient {
    fn drop(&mut self) {
        self.journal.push(PlatformEvent::DpsDestroy);
    }
}

/// Scripted hub transport.
#[derive(Debug)]
pub struct SimHub {
    create_fails: bool,
    option_failure: Option<(&'static str, IotHubClientError)>,
    journal: Journal,
}

impl HubTransport for SimHub {
    type Client = SimHubClient;

    fn create_from_device_auth(
        &mut self,
        hub_uri: &str,
        _protocol: Protocol,
    ) -> Option<SimHubClient> {
        self.journal.push(PlatformEvent::HubCreate {
            hub_uri: hub_uri.to_owned(),
        });
        if self.create_fails {
            return None;
        }
        Some(SimHubClient {
            handle: Uuid::new_v4(),
            hub_uri: hub_uri.to_owned(),
            option_failure: self.option_failure,
            journal: self.journal.clone(),
        })
    }
}

/// Scripted hub client with a unique handle. Records its destruction on drop.
#[derive(Debug)]
pub struct SimHubClient {
    handle: Uuid,
    hub_uri: String,
    option_failure: Option<(&'static str, IotHubClientError)>,
    journal: Journal,
}

impl SimHubClient {
    /// Unique handle of this client.
    pub fn handle(&self) -> Uuid {
        self.handle
    }

    /// The hub this client was created for.
    pub fn hub_uri(&self) -> &str {
        &self.hub_uri
    }
}

impl HubClient for SimHubClient {
    fn set_option(&mut self, option: DeviceOption) -> Result<(), IotHubClientError> {
        let key = option.key();
        self.journal.push(PlatformEvent::HubSetOption {
            handle: self.handle,
            key,
        });
        match self.option_failure {
            Some((failing, code)) if failing == key => Err(code),
            _ => Ok(()),
        }
    }
}

impl Drop for SimHubClient {
    fn drop(&mut self) {
        self.journal.push(PlatformEvent::HubDestroy {
            handle: self.handle,
        });
    }
}

/// Virtual-time pacer.
#[derive(Debug, Clone)]
pub struct SimPacer {
    journal: Journal,
}

impl SimPacer {
    /// A pacer recording into `journal`.
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl Pacer for SimPacer {
    fn pause(&mut self, interval: Duration) {
        self.journal.push(PlatformEvent::Pause {
            ms: interval.as_millis() as u64,
        });
    }
}

// ── Constructors ─────────────────────────────────────────────────────

/// A provisioner wired entirely to scripted collaborators.
pub type SimProvisioner = Provisioner<SimReadiness, SimAttest, SimDps, SimHub, SimPacer>;

/// A scripted DPS transport and its journal.
pub fn scripted_dps(script: Script) -> (SimDps, Journal) {
    let journal = Journal::new();
    (dps(&script, &journal), journal)
}

/// A scripted hub transport and its journal.
pub fn scripted_hub(script: Script) -> (SimHub, Journal) {
    let journal = Journal::new();
    (hub(&script, &journal), journal)
}

/// A fully scripted provisioner and the journal all its collaborators share.
pub fn scripted(script: Script) -> (SimProvisioner, Journal) {
    let journal = Journal::new();
    let probe = SimReadiness {
        network: script.network,
        device_auth: script.device_auth,
        journal: journal.clone(),
    };
    let attest = SimAttest {
        fails: script.attest_init_fails,
        initialized: false,
        journal: journal.clone(),
    };
    let provisioner = Provisioner::new(
        probe,
        attest,
        dps(&script, &journal),
        hub(&script, &journal),
    )
    .with_pacer(SimPacer::new(journal.clone()));
    (provisioner, journal)
}

fn dps(script: &Script, journal: &Journal) -> SimDps {
    SimDps {
        create_fails: script.dps_create_fails,
        option_failure: script.dps_option_failure,
        register_failure: script.register_failure,
        registration: script.registration.clone(),
        journal: journal.clone(),
    }
}

fn hub(script: &Script, journal: &Journal) -> SimHub {
    SimHub {
        create_fails: script.hub_create_fails,
        option_failure: script.hub_option_failure,
        journal: journal.clone(),
    }
}
