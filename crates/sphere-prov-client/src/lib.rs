//! # sphere-prov-client — One-Shot DPS Provisioning
//!
//! Bootstraps a device into an IoT hub through the Device Provisioning
//! Service. Given a scope identifier and a timeout, [`Provisioner::provision`]
//! selects the regional DPS endpoint, gates on network and device-auth
//! readiness, registers the device with its attested X.509 identity, polls the
//! DPS client until the service assigns a hub or the budget runs out, and
//! returns a configured hub client.
//!
//! ## Architecture
//!
//! The transports, the attest subsystem and the readiness probes are
//! collaborators behind the traits in [`platform`]. Destroying a client is
//! dropping it. The attest subsystem is held by an [`AttestGuard`] that tears
//! it down on drop. Together these give exactly one release per acquired
//! resource on every return path, in reverse order of acquisition.
//!
//! | Step | Module |
//! |---|---|
//! | Scope validation, region | `sphere_prov_core::region` |
//! | Readiness probes | [`preflight`] |
//! | Attest init/teardown | [`attest`] |
//! | DPS create → configure → register → poll | [`session`], [`polling`] |
//! | Callback-shared state | [`context`] |
//! | Hub client creation and options | [`handoff`] |
//! | Orchestration | [`provisioner`] |
//!
//! ## Concurrency
//!
//! None. The DPS transport calls back into the [`RegistrationContext`]
//! synchronously from inside `do_work`, through a `&mut` borrow that ends when
//! the tick returns. Concurrent calls sharing one attest subsystem are not
//! supported.
//!
//! [`sim`] provides a scripted, journaling platform used by the test suite and
//! by the `sphere-prov simulate` command.

pub mod attest;
pub mod config;
pub mod context;
pub mod handoff;
pub mod platform;
pub mod polling;
pub mod preflight;
pub mod provisioner;
pub mod session;
pub mod sim;

pub use attest::AttestGuard;
pub use config::{ConfigError, ProvisioningConfig};
pub use context::{Assignment, RegistrationContext};
pub use platform::{
    AttestError, AttestSubsystem, DpsClient, DpsTransport, HubClient, HubTransport, ProbeError,
    ReadinessProbe, RegistrationSink,
};
pub use polling::{Pacer, PollBudget, ThreadPacer, POLL_INTERVAL};
pub use provisioner::Provisioner;
pub use session::{
    ClientCreated, Configured, DpsSession, PhaseTransition, Registering, SessionPhase,
    SessionReport, SessionState, Settlement,
};
