//! # Registration Context
//!
//! State shared between the polling loop and the registration callback.
//! The context is owned by the polling frame and lent to the DPS client as a
//! `&mut dyn RegistrationSink` for one `do_work` tick at a time.
//!
//! ## Invariants
//!
//! - `complete` goes false → true once, and is written after every other
//!   field.
//! - `hub_uri` is `Some` only when complete with an OK result, and is an
//!   owned copy of the transport's buffer.
//! - `hub_region` is [`Region::China`] iff `hub_uri` contains the China hub
//!   suffix.

use sphere_prov_core::{ProvDeviceError, Region};

use crate::platform::RegistrationSink;

/// A successful DPS assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Owned copy of the hub URI the service assigned.
    pub hub_uri: String,
    /// Region classified from `hub_uri`.
    pub hub_region: Region,
}

/// Callback-shared record for one registration.
#[derive(Debug)]
pub struct RegistrationContext {
    complete: bool,
    hub_uri: Option<String>,
    hub_region: Region,
    result: Result<(), ProvDeviceError>,
}

impl Default for RegistrationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationContext {
    /// A context awaiting its callback.
    pub fn new() -> Self {
        Self {
            complete: false,
            hub_uri: None,
            hub_region: Region::Global,
            result: Ok(()),
        }
    }

    /// Whether the callback has fired.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The assigned hub URI, if registration succeeded.
    pub fn hub_uri(&self) -> Option<&str> {
        self.hub_uri.as_deref()
    }

    /// Whether the assigned hub is in the China deployment.
    pub fn is_china_hub(&self) -> bool {
        self.hub_region == Region::China
    }

    /// The last reported registration result. Meaningful only once complete.
    pub fn result(&self) -> Result<(), ProvDeviceError> {
        self.result
    }

    /// Consume the context. `None` if the callback never fired.
    pub fn into_outcome(self) -> Option<Result<Assignment, ProvDeviceError>> {
        if !self.complete {
            return None;
        }
        Some(match (self.result, self.hub_uri) {
            (Ok(()), Some(hub_uri)) => Ok(Assignment {
                hub_uri,
                hub_region: self.hub_region,
            }),
            // OK without a hub URI cannot be produced through the sink.
            (Ok(()), None) => Err(ProvDeviceError::HubNotSpecified),
            (Err(code), _) => Err(code),
        })
    }
}

impl RegistrationSink for RegistrationContext {
    fn on_registration(&mut self, outcome: Result<&str, ProvDeviceError>) {
        if self.complete {
            tracing::warn!("registration callback fired again after completion; ignored");
            return;
        }
        match outcome {
            Ok(hub_uri) => {
                tracing::info!(hub_uri, "registration information received from service");
                self.hub_uri = Some(hub_uri.to_owned());
                self.hub_region = Region::of_hub_uri(hub_uri);
                self.result = Ok(());
            }
            Err(code) => {
                tracing::error!(%code, "registration failed");
                self.result = Err(code);
            }
        }
        self.complete = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_incomplete() {
        let ctx = RegistrationContext::new();
        assert!(!ctx.is_complete());
        assert_eq!(ctx.hub_uri(), None);
        assert!(!ctx.is_china_hub());
        assert_eq!(ctx.into_outcome(), None);
    }

    #[test]
    fn ok_callback_copies_uri_and_completes() {
        let mut ctx = RegistrationContext::new();
        let buffer = String::from("myhub.azure-devices.net");
        ctx.on_registration(Ok(&buffer));
        drop(buffer);

        assert!(ctx.is_complete());
        assert_eq!(ctx.hub_uri(), Some("myhub.azure-devices.net"));
        assert!(!ctx.is_china_hub());
        assert_eq!(
            ctx.into_outcome(),
            Some(Ok(Assignment {
                hub_uri: "myhub.azure-devices.net".into(),
                hub_region: Region::Global,
            }))
        );
    }

    #[test]
    fn china_suffix_sets_china_flag() {
        let mut ctx = RegistrationContext::new();
        ctx.on_registration(Ok("myhub.azure-devices.cn"));
        assert!(ctx.is_china_hub());
    }

    #[test]
    fn error_callback_records_code_without_uri() {
        let mut ctx = RegistrationContext::new();
        ctx.on_registration(Err(ProvDeviceError::Unauthorized));
        assert!(ctx.is_complete());
        assert_eq!(ctx.hub_uri(), None);
        assert_eq!(ctx.result(), Err(ProvDeviceError::Unauthorized));
        assert_eq!(ctx.into_outcome(), Some(Err(ProvDeviceError::Unauthorized)));
    }

    #[test]
    fn second_callback_is_ignored() {
        let mut ctx = RegistrationContext::new();
        ctx.on_registration(Ok("first.azure-devices.net"));
        ctx.on_registration(Err(ProvDeviceError::Transport));
        assert_eq!(ctx.result(), Ok(()));
        assert_eq!(ctx.hub_uri(), Some("first.azure-devices.net"));
    }
}
