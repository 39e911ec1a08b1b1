//! # Error Hierarchy
//!
//! Structured error types for provisioning, built with `thiserror`.
//!
//! [`ProvisioningError`] is the single failure type of the `provision`
//! operation. Each variant maps to exactly one [`ProvisioningStatus`], and the
//! variants that carry a transport code map to the matching
//! [`SecondaryCode`]. Variants record the operation that failed so a log line
//! is enough to locate the failure site.

use thiserror::Error;

use crate::codes::{IotHubClientError, ProvDeviceError};
use crate::outcome::{ProvisioningStatus, SecondaryCode};

/// Top-level error type for one provisioning attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// Caller input was rejected before any side effect.
    #[error("invalid parameter: {0}")]
    InvalidParam(#[from] ValidationError),

    /// The network readiness probe reported not-ready.
    #[error("network must be ready before provisioning")]
    NetworkNotReady,

    /// The device-auth readiness probe reported not-ready.
    #[error("device authentication must be ready before provisioning")]
    DeviceAuthNotReady,

    /// A probe or the attest subsystem itself failed.
    #[error("{operation} failed: {reason}")]
    Generic {
        /// The collaborator call that failed.
        operation: &'static str,
        /// Collaborator-supplied failure description.
        reason: String,
    },

    /// A failure on the DPS leg, including the registration timeout.
    #[error("DPS {operation} failed: {code}")]
    ProvDevice {
        /// The DPS step that failed.
        operation: &'static str,
        /// The DPS-layer code.
        code: ProvDeviceError,
    },

    /// A hub option could not be applied after a successful assignment.
    #[error("IoT hub {operation} failed: {code}")]
    IotHubClient {
        /// The hub step that failed.
        operation: &'static str,
        /// The hub-client code.
        code: IotHubClientError,
    },
}

impl ProvisioningError {
    /// The primary status this error encodes to.
    pub fn status(&self) -> ProvisioningStatus {
        match self {
            Self::InvalidParam(_) => ProvisioningStatus::InvalidParam,
            Self::NetworkNotReady => ProvisioningStatus::NetworkNotReady,
            Self::DeviceAuthNotReady => ProvisioningStatus::DeviceAuthNotReady,
            Self::Generic { .. } => ProvisioningStatus::GenericError,
            Self::ProvDevice { .. } => ProvisioningStatus::ProvDeviceError,
            Self::IotHubClient { .. } => ProvisioningStatus::IotHubClientError,
        }
    }

    /// The secondary code this error encodes to.
    pub fn secondary(&self) -> SecondaryCode {
        match self {
            Self::ProvDevice { code, .. } => SecondaryCode::ProvDevice(*code),
            Self::IotHubClient { code, .. } => SecondaryCode::IotHubClient(*code),
            _ => SecondaryCode::Unused,
        }
    }

    /// Whether this is the DPS registration timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ProvDevice {
                code: ProvDeviceError::Timeout,
                ..
            }
        )
    }
}

/// Validation errors for caller-supplied values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The scope identifier is empty or whitespace.
    #[error("scope ID must be non-empty")]
    EmptyScopeId,

    /// The scope identifier contains a non-printable character.
    #[error("scope ID contains a non-printable character at byte {0}")]
    NonPrintableScopeId(usize),

    /// The scope identifier prefix names no known DPS region.
    #[error("scope ID prefix \"{0}\" is not a known DPS region (expected 0ne or 0cn)")]
    UnknownScopePrefix(String),

    /// A result code name did not match any known code.
    #[error("unknown result code: \"{0}\"")]
    UnknownResultCode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_param_display_includes_cause() {
        let err = ProvisioningError::from(ValidationError::UnknownScopePrefix("1ab".into()));
        let msg = format!("{err}");
        assert!(msg.contains("invalid parameter"));
        assert!(msg.contains("1ab"));
    }

    #[test]
    fn generic_display_names_operation() {
        let err = ProvisioningError::Generic {
            operation: "attest init",
            reason: "no identity".to_string(),
        };
        assert_eq!(format!("{err}"), "attest init failed: no identity");
    }

    #[test]
    fn prov_device_display_carries_sdk_code() {
        let err = ProvisioningError::ProvDevice {
            operation: "registration",
            code: ProvDeviceError::Timeout,
        };
        assert!(format!("{err}").contains("PROV_DEVICE_RESULT_TIMEOUT"));
        assert!(err.is_timeout());
    }

    #[test]
    fn status_mapping_is_one_to_one() {
        let cases = [
            (
                ProvisioningError::InvalidParam(ValidationError::EmptyScopeId),
                ProvisioningStatus::InvalidParam,
            ),
            (
                ProvisioningError::NetworkNotReady,
                ProvisioningStatus::NetworkNotReady,
            ),
            (
                ProvisioningError::DeviceAuthNotReady,
                ProvisioningStatus::DeviceAuthNotReady,
            ),
            (
                ProvisioningError::Generic {
                    operation: "network probe",
                    reason: "ioctl".into(),
                },
                ProvisioningStatus::GenericError,
            ),
            (
                ProvisioningError::ProvDevice {
                    operation: "create",
                    code: ProvDeviceError::Error,
                },
                ProvisioningStatus::ProvDeviceError,
            ),
            (
                ProvisioningError::IotHubClient {
                    operation: "set option",
                    code: IotHubClientError::InvalidArg,
                },
                ProvisioningStatus::IotHubClientError,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn secondary_unused_outside_transport_errors() {
        assert_eq!(
            ProvisioningError::NetworkNotReady.secondary(),
            SecondaryCode::Unused
        );
        assert_eq!(
            ProvisioningError::IotHubClient {
                operation: "set option",
                code: IotHubClientError::Error,
            }
            .secondary(),
            SecondaryCode::IotHubClient(IotHubClientError::Error)
        );
        assert!(!ProvisioningError::DeviceAuthNotReady.is_timeout());
    }

    #[test]
    fn validation_error_non_printable_reports_offset() {
        let err = ValidationError::NonPrintableScopeId(4);
        assert!(format!("{err}").contains("byte 4"));
    }
}
