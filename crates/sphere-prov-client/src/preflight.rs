//! Readiness gate run before any resource is acquired.

use sphere_prov_core::ProvisioningError;

use crate::platform::ReadinessProbe;

/// Check network readiness, then device-auth readiness.
///
/// The device-auth probe is not consulted when the network check fails.
/// A probe that itself errors maps to a generic error; a probe that reports
/// not-ready maps to the matching not-ready status.
pub fn check_readiness<R: ReadinessProbe>(probe: &mut R) -> Result<(), ProvisioningError> {
    match probe.is_network_ready() {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("network is not ready");
            return Err(ProvisioningError::NetworkNotReady);
        }
        Err(e) => {
            tracing::error!(error = %e, "network readiness probe failed");
            return Err(ProvisioningError::Generic {
                operation: "network readiness probe",
                reason: e.to_string(),
            });
        }
    }

    match probe.is_device_auth_ready() {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::warn!("device authentication is not ready");
            Err(ProvisioningError::DeviceAuthNotReady)
        }
        Err(e) => {
            tracing::error!(error = %e, "device auth readiness probe failed");
            Err(ProvisioningError::Generic {
                operation: "device auth readiness probe",
                reason: e.to_string(),
            })
        }
    }
}
