//! Hub client creation from a DPS assignment.

use sphere_prov_core::{
    DeviceOption, IotHubClientError, ProvDeviceError, ProvisioningError, Protocol, Region,
};

use crate::context::Assignment;
use crate::platform::{HubClient, HubTransport};

/// Create a hub client for the assigned hub and apply its options.
///
/// The device id is always applied. The trust anchor is applied only when
/// the assigned hub is in the China deployment, independently of which DPS
/// endpoint produced the assignment. On any option failure the client is
/// dropped before this returns.
pub fn hand_off<T: HubTransport>(
    transport: &mut T,
    assignment: Assignment,
) -> Result<T::Client, ProvisioningError> {
    let Assignment {
        hub_uri,
        hub_region,
    } = assignment;

    let Some(mut client) = transport.create_from_device_auth(&hub_uri, Protocol::Mqtt) else {
        tracing::error!(hub_uri = %hub_uri, "failed to create IoT hub client from device auth");
        return Err(ProvisioningError::ProvDevice {
            operation: "hub client create",
            code: ProvDeviceError::DevAuthError,
        });
    };
    tracing::debug!(hub_uri = %hub_uri, "IoT hub client created");
    drop(hub_uri);

    client
        .set_option(DeviceOption::device_id())
        .map_err(|code| option_failed("set device id", code))?;

    if hub_region == Region::China {
        client
            .set_option(DeviceOption::trust_anchor())
            .map_err(|code| option_failed("set trusted cert", code))?;
        tracing::debug!("trust anchor installed on IoT hub client");
    }

    Ok(client)
}

fn option_failed(operation: &'static str, code: IotHubClientError) -> ProvisioningError {
    tracing::error!(operation, %code, "IoT hub client set option failed");
    ProvisioningError::IotHubClient { operation, code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{scripted_hub, PlatformEvent, Script};

    fn assignment(uri: &str) -> Assignment {
        Assignment {
            hub_uri: uri.into(),
            hub_region: Region::of_hub_uri(uri),
        }
    }

    #[test]
    fn global_hub_gets_device_id_only() {
        let (mut hub, journal) = scripted_hub(Script::default());
        let client = hand_off(&mut hub, assignment("myhub.azure-devices.net")).unwrap();
        assert_eq!(client.hub_uri(), "myhub.azure-devices.net");
        assert_eq!(journal.hub_option_keys(), vec!["SetDeviceId"]);
    }

    #[test]
    fn china_hub_gets_trust_anchor() {
        let (mut hub, journal) = scripted_hub(Script::default());
        hand_off(&mut hub, assignment("myhub.azure-devices.cn")).unwrap();
        assert_eq!(journal.hub_option_keys(), vec!["SetDeviceId", "TrustedCerts"]);
    }

    #[test]
    fn create_failure_maps_to_dev_auth_error() {
        let (mut hub, journal) = scripted_hub(Script::default().with_hub_create_failure());
        let err = hand_off(&mut hub, assignment("myhub.azure-devices.net")).unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::ProvDevice {
                operation: "hub client create",
                code: ProvDeviceError::DevAuthError,
            }
        );
        assert!(journal.hub_option_keys().is_empty());
    }

    #[test]
    fn option_failure_drops_client() {
        let script =
            Script::default().with_hub_option_failure("SetDeviceId", IotHubClientError::InvalidArg);
        let (mut hub, journal) = scripted_hub(script);
        let err = hand_off(&mut hub, assignment("myhub.azure-devices.net")).unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::IotHubClient {
                operation: "set device id",
                code: IotHubClientError::InvalidArg,
            }
        );
        assert_eq!(journal.count(|e| matches!(e, PlatformEvent::HubDestroy { .. })), 1);
    }
}
