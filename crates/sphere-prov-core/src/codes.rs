//! # Transport Result Codes
//!
//! The non-OK result codes reported by the two transport layers: the DPS
//! client (`PROV_DEVICE_RESULT_*`) and the IoT hub client
//! (`IOTHUB_CLIENT_*`). Success is not a variant; the collaborator traits
//! return `Result<_, ProvDeviceError>` / `Result<_, IotHubClientError>`.
//!
//! Both enums serialize to, display as, and parse from their SDK names so
//! that log lines and JSON output match what operators see in the device SDK.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A failure code from the DPS (provisioning device) layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProvDeviceError {
    /// An argument passed to the DPS client was rejected.
    #[serde(rename = "PROV_DEVICE_RESULT_INVALID_ARG")]
    InvalidArg,
    /// Reported by some transports in place of OK for an intermediate step.
    #[serde(rename = "PROV_DEVICE_RESULT_SUCCESS")]
    Success,
    /// Allocation failure inside the DPS client.
    #[serde(rename = "PROV_DEVICE_RESULT_MEMORY")]
    Memory,
    /// The service response could not be parsed.
    #[serde(rename = "PROV_DEVICE_RESULT_PARSING")]
    Parsing,
    /// Transport (MQTT/TLS) failure.
    #[serde(rename = "PROV_DEVICE_RESULT_TRANSPORT")]
    Transport,
    /// The DPS client was driven in the wrong state.
    #[serde(rename = "PROV_DEVICE_RESULT_INVALID_STATE")]
    InvalidState,
    /// Device authentication failed or the attested identity was unusable.
    #[serde(rename = "PROV_DEVICE_RESULT_DEV_AUTH_ERROR")]
    DevAuthError,
    /// Registration did not complete within the polling budget.
    #[serde(rename = "PROV_DEVICE_RESULT_TIMEOUT")]
    Timeout,
    /// A key or certificate could not be used.
    #[serde(rename = "PROV_DEVICE_RESULT_KEY_ERROR")]
    KeyError,
    /// Unspecified DPS failure.
    #[serde(rename = "PROV_DEVICE_RESULT_ERROR")]
    Error,
    /// The service accepted the registration but named no hub.
    #[serde(rename = "PROV_DEVICE_RESULT_HUB_NOT_SPECIFIED")]
    HubNotSpecified,
    /// The service rejected the device credentials.
    #[serde(rename = "PROV_DEVICE_RESULT_UNAUTHORIZED")]
    Unauthorized,
    /// The enrollment is disabled on the service.
    #[serde(rename = "PROV_DEVICE_RESULT_DISABLED")]
    Disabled,
}

impl ProvDeviceError {
    /// Every DPS failure code, in SDK declaration order.
    pub const ALL: [ProvDeviceError; 13] = [
        Self::InvalidArg,
        Self::Success,
        Self::Memory,
        Self::Parsing,
        Self::Transport,
        Self::InvalidState,
        Self::DevAuthError,
        Self::Timeout,
        Self::KeyError,
        Self::Error,
        Self::HubNotSpecified,
        Self::Unauthorized,
        Self::Disabled,
    ];

    /// The SDK name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArg => "PROV_DEVICE_RESULT_INVALID_ARG",
            Self::Success => "PROV_DEVICE_RESULT_SUCCESS",
            Self::Memory => "PROV_DEVICE_RESULT_MEMORY",
            Self::Parsing => "PROV_DEVICE_RESULT_PARSING",
            Self::Transport => "PROV_DEVICE_RESULT_TRANSPORT",
            Self::InvalidState => "PROV_DEVICE_RESULT_INVALID_STATE",
            Self::DevAuthError => "PROV_DEVICE_RESULT_DEV_AUTH_ERROR",
            Self::Timeout => "PROV_DEVICE_RESULT_TIMEOUT",
            Self::KeyError => "PROV_DEVICE_RESULT_KEY_ERROR",
            Self::Error => "PROV_DEVICE_RESULT_ERROR",
            Self::HubNotSpecified => "PROV_DEVICE_RESULT_HUB_NOT_SPECIFIED",
            Self::Unauthorized => "PROV_DEVICE_RESULT_UNAUTHORIZED",
            Self::Disabled => "PROV_DEVICE_RESULT_DISABLED",
        }
    }
}

impl std::fmt::Display for ProvDeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProvDeviceError {
    type Err = ValidationError;

    /// Accepts the full SDK name (`PROV_DEVICE_RESULT_TIMEOUT`) or the bare
    /// suffix (`TIMEOUT`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let suffix = upper.strip_prefix("PROV_DEVICE_RESULT_").unwrap_or(&upper);
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().trim_start_matches("PROV_DEVICE_RESULT_") == suffix)
            .ok_or_else(|| ValidationError::UnknownResultCode(s.to_string()))
    }
}

/// A failure code from the IoT hub client layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IotHubClientError {
    /// An argument passed to the hub client was rejected.
    #[serde(rename = "IOTHUB_CLIENT_INVALID_ARG")]
    InvalidArg,
    /// Unspecified hub client failure.
    #[serde(rename = "IOTHUB_CLIENT_ERROR")]
    Error,
    /// A value exceeded the size the hub client accepts.
    #[serde(rename = "IOTHUB_CLIENT_INVALID_SIZE")]
    InvalidSize,
    /// The hub client could not obtain the current time.
    #[serde(rename = "IOTHUB_CLIENT_INDEFINITE_TIME")]
    IndefiniteTime,
}

impl IotHubClientError {
    /// Every hub client failure code, in SDK declaration order.
    pub const ALL: [IotHubClientError; 4] = [
        Self::InvalidArg,
        Self::Error,
        Self::InvalidSize,
        Self::IndefiniteTime,
    ];

    /// The SDK name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArg => "IOTHUB_CLIENT_INVALID_ARG",
            Self::Error => "IOTHUB_CLIENT_ERROR",
            Self::InvalidSize => "IOTHUB_CLIENT_INVALID_SIZE",
            Self::IndefiniteTime => "IOTHUB_CLIENT_INDEFINITE_TIME",
        }
    }
}

impl std::fmt::Display for IotHubClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IotHubClientError {
    type Err = ValidationError;

    /// Accepts the full SDK name (`IOTHUB_CLIENT_INVALID_ARG`) or the bare
    /// suffix (`INVALID_ARG`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let suffix = upper.strip_prefix("IOTHUB_CLIENT_").unwrap_or(&upper);
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().trim_start_matches("IOTHUB_CLIENT_") == suffix)
            .ok_or_else(|| ValidationError::UnknownResultCode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prov_device_error_serializes_to_sdk_name() {
        let json = serde_json::to_string(&ProvDeviceError::Timeout).unwrap();
        assert_eq!(json, "\"PROV_DEVICE_RESULT_TIMEOUT\"");

        let back: ProvDeviceError =
            serde_json::from_str("\"PROV_DEVICE_RESULT_DEV_AUTH_ERROR\"").unwrap();
        assert_eq!(back, ProvDeviceError::DevAuthError);
    }

    #[test]
    fn prov_device_error_display_matches_serde_name() {
        for code in ProvDeviceError::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json.trim_matches('"'), code.to_string());
        }
    }

    #[test]
    fn prov_device_error_parses_full_and_short_names() {
        assert_eq!(
            "PROV_DEVICE_RESULT_UNAUTHORIZED".parse::<ProvDeviceError>().unwrap(),
            ProvDeviceError::Unauthorized
        );
        assert_eq!(
            "timeout".parse::<ProvDeviceError>().unwrap(),
            ProvDeviceError::Timeout
        );
        assert_eq!(
            "hub_not_specified".parse::<ProvDeviceError>().unwrap(),
            ProvDeviceError::HubNotSpecified
        );
    }

    #[test]
    fn prov_device_error_rejects_ok_and_unknown() {
        assert!("OK".parse::<ProvDeviceError>().is_err());
        assert!("PROV_DEVICE_RESULT_OK".parse::<ProvDeviceError>().is_err());
        let err = "BOGUS".parse::<ProvDeviceError>().unwrap_err();
        assert!(err.to_string().contains("BOGUS"));
    }

    #[test]
    fn iothub_client_error_round_trips_names() {
        for code in IotHubClientError::ALL {
            assert_eq!(code.as_str().parse::<IotHubClientError>().unwrap(), code);
        }
        assert_eq!(
            "invalid_size".parse::<IotHubClientError>().unwrap(),
            IotHubClientError::InvalidSize
        );
        assert!("IOTHUB_CLIENT_OK".parse::<IotHubClientError>().is_err());
    }

    #[test]
    fn iothub_client_error_serializes_to_sdk_name() {
        let json = serde_json::to_string(&IotHubClientError::Error).unwrap();
        assert_eq!(json, "\"IOTHUB_CLIENT_ERROR\"");
    }
}
