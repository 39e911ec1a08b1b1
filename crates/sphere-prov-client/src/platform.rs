//! # Collaborator Traits
//!
//! The provisioning core drives five external collaborators. None of them is
//! implemented here; a device build wires them to its SDK, and [`crate::sim`]
//! provides scripted implementations.
//!
//! ## Resource model
//!
//! - A DPS or hub client is destroyed by dropping it. Implementations release
//!   the underlying handle in `Drop`.
//! - The attest subsystem is process-wide. `init` and `deinit` are paired by
//!   [`crate::AttestGuard`]; callers never invoke `deinit` directly.
//! - The registration callback is the [`RegistrationSink`] handed to
//!   [`DpsClient::do_work`]. It is borrowed for the duration of one tick and
//!   must not be retained.

use sphere_prov_core::{
    DeviceOption, IotHubClientError, ProvDeviceError, Protocol, ScopeId, SecureDeviceType,
};
use thiserror::Error;

/// A readiness probe call itself failed (as opposed to reporting not-ready).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProbeError(pub String);

/// The attest subsystem could not be initialized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct AttestError(pub String);

/// Network and device-auth readiness checks.
pub trait ReadinessProbe {
    /// Whether the network is up.
    fn is_network_ready(&mut self) -> Result<bool, ProbeError>;

    /// Whether device authentication and attestation has completed.
    fn is_device_auth_ready(&mut self) -> Result<bool, ProbeError>;
}

/// The process-wide device attestation subsystem that vouches for the
/// X.509 identity used on both legs.
pub trait AttestSubsystem {
    /// Initialize for the given secure-device type.
    fn init(&mut self, device_type: SecureDeviceType) -> Result<(), AttestError>;

    /// Tear down. Called exactly once per successful `init`.
    fn deinit(&mut self);
}

/// Receiver for the DPS registration result.
pub trait RegistrationSink {
    /// Called from inside [`DpsClient::do_work`] when registration finishes.
    ///
    /// On success the argument is the assigned hub URI, borrowed from the
    /// transport's buffer for the duration of the call.
    fn on_registration(&mut self, outcome: Result<&str, ProvDeviceError>);
}

/// A DPS client handle for one registration attempt.
pub trait DpsClient {
    /// Apply a client option.
    fn set_option(&mut self, option: DeviceOption) -> Result<(), ProvDeviceError>;

    /// Start registration. The result arrives later through `do_work`.
    fn register_device(&mut self) -> Result<(), ProvDeviceError>;

    /// Advance the transport by one non-blocking tick. May invoke `sink`
    /// synchronously.
    fn do_work(&mut self, sink: &mut dyn RegistrationSink);
}

/// Factory for DPS clients.
pub trait DpsTransport {
    /// The client type produced.
    type Client: DpsClient;

    /// Create a client for `endpoint` and `scope`. `None` on failure.
    fn create(
        &mut self,
        endpoint: &str,
        scope: &ScopeId,
        protocol: Protocol,
    ) -> Option<Self::Client>;
}

/// An IoT hub client handle.
pub trait HubClient {
    /// Apply a client option.
    fn set_option(&mut self, option: DeviceOption) -> Result<(), IotHubClientError>;
}

/// Factory for hub clients authenticated with the device-attested identity.
pub trait HubTransport {
    /// The client type produced.
    type Client: HubClient;

    /// Create a client for the assigned hub. `None` on failure.
    fn create_from_device_auth(&mut self, hub_uri: &str, protocol: Protocol)
        -> Option<Self::Client>;
}
