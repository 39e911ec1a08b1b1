//! Provisioning configuration.
//!
//! The scope identifier is required. The timeout defaults to 30 seconds.
//! Override via environment variables or explicit construction.

use sphere_prov_core::{ScopeId, ValidationError};

/// Environment variable holding the DPS scope identifier.
pub const SCOPE_ID_VAR: &str = "SPHERE_DPS_SCOPE_ID";

/// Environment variable holding the registration timeout in milliseconds.
pub const TIMEOUT_MS_VAR: &str = "SPHERE_DPS_TIMEOUT_MS";

/// Registration timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u32 = 30_000;

/// Inputs to one provisioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
    /// DPS scope identifier, validated.
    pub scope_id: ScopeId,
    /// Registration timeout in milliseconds.
    pub timeout_ms: u32,
}

impl ProvisioningConfig {
    /// Configuration with the default timeout.
    pub fn new(scope_id: ScopeId) -> Self {
        Self {
            scope_id,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Override the timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPHERE_DPS_SCOPE_ID` (required)
    /// - `SPHERE_DPS_TIMEOUT_MS` (default: 30000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_scope = lookup(SCOPE_ID_VAR).ok_or(ConfigError::MissingScopeId)?;
        let scope_id = ScopeId::new(raw_scope).map_err(ConfigError::InvalidScopeId)?;

        let timeout_ms = match lookup(TIMEOUT_MS_VAR) {
            None => DEFAULT_TIMEOUT_MS,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
        };

        Ok(Self {
            scope_id,
            timeout_ms,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The scope variable is unset.
    #[error("SPHERE_DPS_SCOPE_ID environment variable is required")]
    MissingScopeId,
    /// The scope variable is set but not a usable scope identifier.
    #[error("invalid SPHERE_DPS_SCOPE_ID: {0}")]
    InvalidScopeId(ValidationError),
    /// The timeout variable is not a millisecond count.
    #[error("invalid SPHERE_DPS_TIMEOUT_MS: {0:?} is not a u32 millisecond count")]
    InvalidTimeout(String),
}
