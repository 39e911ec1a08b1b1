//! # Result Encoder
//!
//! Folds the outcome of one provisioning call into a `{status, secondary}`
//! pair. The secondary code is a sum type whose variant is determined by the
//! status:
//!
//! | Status | Secondary |
//! |---|---|
//! | `OK` | unused |
//! | `PROV_DEVICE_ERROR` | DPS-layer code, including `TIMEOUT` |
//! | `IOTHUB_CLIENT_ERROR` | hub-client code |
//! | anything else | unused |
//!
//! There is no public constructor that takes a status and a secondary
//! independently, so a mismatched pair cannot be built.

use serde::{Deserialize, Serialize};

use crate::codes::{IotHubClientError, ProvDeviceError};
use crate::error::ProvisioningError;

/// Primary status of a provisioning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProvisioningStatus {
    /// The hub client is live and configured.
    #[serde(rename = "AZURE_SPHERE_PROV_RESULT_OK")]
    Ok,
    /// Bad scope prefix or empty argument.
    #[serde(rename = "AZURE_SPHERE_PROV_RESULT_INVALID_PARAM")]
    InvalidParam,
    /// The network probe reported not-ready.
    #[serde(rename = "AZURE_SPHERE_PROV_RESULT_NETWORK_NOT_READY")]
    NetworkNotReady,
    /// The device-auth probe reported not-ready.
    #[serde(rename = "AZURE_SPHERE_PROV_RESULT_DEVICEAUTH_NOT_READY")]
    DeviceAuthNotReady,
    /// A probe or subsystem-init call itself failed.
    #[serde(rename = "AZURE_SPHERE_PROV_RESULT_GENERIC_ERROR")]
    GenericError,
    /// Any failure on the DPS leg.
    #[serde(rename = "AZURE_SPHERE_PROV_RESULT_PROV_DEVICE_ERROR")]
    ProvDeviceError,
    /// Hub-side option application failed after assignment.
    #[serde(rename = "AZURE_SPHERE_PROV_RESULT_IOTHUB_CLIENT_ERROR")]
    IotHubClientError,
}

impl ProvisioningStatus {
    /// The canonical status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "AZURE_SPHERE_PROV_RESULT_OK",
            Self::InvalidParam => "AZURE_SPHERE_PROV_RESULT_INVALID_PARAM",
            Self::NetworkNotReady => "AZURE_SPHERE_PROV_RESULT_NETWORK_NOT_READY",
            Self::DeviceAuthNotReady => "AZURE_SPHERE_PROV_RESULT_DEVICEAUTH_NOT_READY",
            Self::GenericError => "AZURE_SPHERE_PROV_RESULT_GENERIC_ERROR",
            Self::ProvDeviceError => "AZURE_SPHERE_PROV_RESULT_PROV_DEVICE_ERROR",
            Self::IotHubClientError => "AZURE_SPHERE_PROV_RESULT_IOTHUB_CLIENT_ERROR",
        }
    }
}

impl std::fmt::Display for ProvisioningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status-dependent secondary code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "layer", content = "code", rename_all = "snake_case")]
pub enum SecondaryCode {
    /// No secondary code for this status.
    Unused,
    /// DPS-layer code.
    ProvDevice(ProvDeviceError),
    /// Hub-client code.
    IotHubClient(IotHubClientError),
}

/// The encoded outcome of one provisioning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningReturn {
    status: ProvisioningStatus,
    secondary: SecondaryCode,
}

impl ProvisioningReturn {
    /// The encoding of a successful call.
    pub fn ok() -> Self {
        Self {
            status: ProvisioningStatus::Ok,
            secondary: SecondaryCode::Unused,
        }
    }

    /// Encode the result of a provisioning call, discarding the hub client.
    pub fn from_result<H>(result: &Result<H, ProvisioningError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => Self::from(err),
        }
    }

    /// The primary status.
    pub fn status(&self) -> ProvisioningStatus {
        self.status
    }

    /// The secondary code.
    pub fn secondary(&self) -> SecondaryCode {
        self.secondary
    }

    /// The DPS-layer code, present only when the status is `PROV_DEVICE_ERROR`.
    pub fn prov_device_error(&self) -> Option<ProvDeviceError> {
        match self.secondary {
            SecondaryCode::ProvDevice(code) => Some(code),
            _ => None,
        }
    }

    /// The hub-client code, present only when the status is `IOTHUB_CLIENT_ERROR`.
    pub fn iothub_client_error(&self) -> Option<IotHubClientError> {
        match self.secondary {
            SecondaryCode::IotHubClient(code) => Some(code),
            _ => None,
        }
    }

    /// Whether the status is `OK`.
    pub fn is_ok(&self) -> bool {
        self.status == ProvisioningStatus::Ok
    }
}

impl From<&ProvisioningError> for ProvisioningReturn {
    fn from(err: &ProvisioningError) -> Self {
        Self {
            status: err.status(),
            secondary: err.secondary(),
        }
    }
}

impl std::fmt::Display for ProvisioningReturn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.secondary {
            SecondaryCode::Unused => write!(f, "{}", self.status),
            SecondaryCode::ProvDevice(code) => write!(f, "{} ({code})", self.status),
            SecondaryCode::IotHubClient(code) => write!(f, "{} ({code})", self.status),
        }
    }
}
