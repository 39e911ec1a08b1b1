//! Client options and transport selectors shared by the DPS and hub legs.

use serde::{Deserialize, Serialize};

use crate::trust::DIGICERT_GLOBAL_ROOT_CA;

/// Device id applied to both clients under the `SetDeviceId` option.
pub const DEVICE_ID: i32 = 1;

/// An option applied to a DPS or hub client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOption {
    /// `SetDeviceId` with an integer device id.
    DeviceId(i32),
    /// `TrustedCerts` with a PEM trust anchor.
    TrustedCerts(&'static str),
}

impl DeviceOption {
    /// The SDK option key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DeviceId(_) => "SetDeviceId",
            Self::TrustedCerts(_) => "TrustedCerts",
        }
    }

    /// The device id option with the fixed device id.
    pub fn device_id() -> Self {
        Self::DeviceId(DEVICE_ID)
    }

    /// The trusted-certs option carrying the compiled-in root CA.
    pub fn trust_anchor() -> Self {
        Self::TrustedCerts(DIGICERT_GLOBAL_ROOT_CA)
    }
}

/// Wire protocol for a transport leg. Both legs use MQTT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// MQTT over TLS.
    #[default]
    Mqtt,
}

/// Kind of secure identity the attest subsystem is initialized for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecureDeviceType {
    /// Device-attested X.509 client certificate.
    #[default]
    #[serde(rename = "x509")]
    X509,
}
