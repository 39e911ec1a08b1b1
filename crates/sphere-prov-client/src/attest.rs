//! Scoped ownership of the attest subsystem for one provisioning call.

use sphere_prov_core::SecureDeviceType;

use crate::platform::{AttestError, AttestSubsystem};

/// Holds the attest subsystem initialized. Dropping the guard tears it down.
///
/// A guard exists only after a successful `init`, so teardown happens exactly
/// once for every initialization, on every exit path. Declare it before any
/// other resource of the call so it is released last.
pub struct AttestGuard<'a, A: AttestSubsystem> {
    attest: &'a mut A,
}

impl<'a, A: AttestSubsystem> AttestGuard<'a, A> {
    /// Initialize the subsystem and take the guard.
    pub fn init(attest: &'a mut A, device_type: SecureDeviceType) -> Result<Self, AttestError> {
        attest.init(device_type)?;
        tracing::debug!(?device_type, "attest subsystem initialized");
        Ok(Self { attest })
    }
}

impl<A: AttestSubsystem> Drop for AttestGuard<'_, A> {
    fn drop(&mut self) {
        self.attest.deinit();
        tracing::debug!("attest subsystem torn down");
    }
}

impl<A: AttestSubsystem> std::fmt::Debug for AttestGuard<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestGuard").finish_non_exhaustive()
    }
}
