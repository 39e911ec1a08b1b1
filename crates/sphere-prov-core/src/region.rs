//! # Region Resolver
//!
//! Maps a scope identifier to one of the two well-known DPS deployments.
//!
//! | Scope prefix | DPS endpoint | Hub suffix | Extra trust anchor |
//! |---|---|---|---|
//! | `0cn` | `global.azure-devices-provisioning.cn` | `.cn` | yes |
//! | `0ne` | `global.azure-devices-provisioning.net` | `.net` | no |
//!
//! Any other prefix is rejected. The resolver is pure.
//!
//! Two separate decisions use this table. The DPS leg selects its trust
//! anchor from the scope prefix ([`resolve_region`]) before any network
//! traffic. The hub leg selects its trust anchor from the hub URI the service
//! assigned ([`Region::of_hub_uri`]). They usually agree, but nothing here
//! assumes so.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::scope::ScopeId;

/// A DPS deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// The worldwide deployment.
    Global,
    /// The China deployment, which requires the compiled-in root CA.
    China,
}

impl Region {
    /// The constant profile for this region.
    pub fn profile(&self) -> &'static RegionalProfile {
        match self {
            Self::Global => &RegionalProfile::GLOBAL,
            Self::China => &RegionalProfile::CHINA,
        }
    }

    /// Classify an assigned hub URI by substring match on the China hub
    /// suffix.
    pub fn of_hub_uri(hub_uri: &str) -> Self {
        if hub_uri.contains(RegionalProfile::CHINA.hub_suffix) {
            Self::China
        } else {
            Self::Global
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::China => f.write_str("china"),
        }
    }
}

/// Endpoint and trust requirements of one DPS deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionalProfile {
    /// Which deployment this is.
    pub region: Region,
    /// Scope prefix that selects this deployment.
    pub scope_prefix: &'static str,
    /// DPS host name.
    pub endpoint: &'static str,
    /// Marker that hub URIs in this deployment contain.
    pub hub_suffix: &'static str,
    /// Whether the compiled-in root CA must be installed as a trust anchor.
    pub extra_trust_required: bool,
}

impl RegionalProfile {
    /// The worldwide deployment.
    pub const GLOBAL: RegionalProfile = RegionalProfile {
        region: Region::Global,
        scope_prefix: "0ne",
        endpoint: "global.azure-devices-provisioning.net",
        hub_suffix: ".net",
        extra_trust_required: false,
    };

    /// The China deployment.
    pub const CHINA: RegionalProfile = RegionalProfile {
        region: Region::China,
        scope_prefix: "0cn",
        endpoint: "global.azure-devices-provisioning.cn",
        hub_suffix: ".cn",
        extra_trust_required: true,
    };
}

/// Resolve the DPS deployment for a scope identifier.
///
/// `0cn` is checked before `0ne`; anything else is
/// [`ValidationError::UnknownScopePrefix`].
pub fn resolve_region(scope: &ScopeId) -> Result<&'static RegionalProfile, ValidationError> {
    let raw = scope.as_str();
    if raw.starts_with(RegionalProfile::CHINA.scope_prefix) {
        Ok(&RegionalProfile::CHINA)
    } else if raw.starts_with(RegionalProfile::GLOBAL.scope_prefix) {
        Ok(&RegionalProfile::GLOBAL)
    } else {
        Err(ValidationError::UnknownScopePrefix(scope.prefix().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(s: &str) -> ScopeId {
        ScopeId::new(s).unwrap()
    }

    #[test]
    fn global_prefix_resolves_to_net_endpoint() {
        let profile = resolve_region(&scope("0ne00ABCDEF")).unwrap();
        assert_eq!(profile.region, Region::Global);
        assert_eq!(profile.endpoint, "global.azure-devices-provisioning.net");
        assert_eq!(profile.hub_suffix, ".net");
        assert!(!profile.extra_trust_required);
    }

    #[test]
    fn china_prefix_resolves_to_cn_endpoint() {
        let profile = resolve_region(&scope("0cn00XYZ")).unwrap();
        assert_eq!(profile.region, Region::China);
        assert_eq!(profile.endpoint, "global.azure-devices-provisioning.cn");
        assert_eq!(profile.hub_suffix, ".cn");
        assert!(profile.extra_trust_required);
    }

    #[test]
    fn unknown_prefix_rejected_with_prefix_in_error() {
        let err = resolve_region(&scope("1ab00CDEF")).unwrap_err();
        assert_eq!(err, ValidationError::UnknownScopePrefix("1ab".into()));
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        assert!(resolve_region(&scope("0NE00ABC")).is_err());
        assert!(resolve_region(&scope("0CN00ABC")).is_err());
    }

    #[test]
    fn bare_prefix_is_enough() {
        assert_eq!(resolve_region(&scope("0ne")).unwrap().region, Region::Global);
        assert_eq!(resolve_region(&scope("0cn")).unwrap().region, Region::China);
        assert!(resolve_region(&scope("0c")).is_err());
    }

    #[test]
    fn hub_uri_classification_uses_substring() {
        assert_eq!(Region::of_hub_uri("myhub.azure-devices.cn"), Region::China);
        assert_eq!(Region::of_hub_uri("myhub.azure-devices.net"), Region::Global);
        // Substring, not suffix: a ".cn" label anywhere counts.
        assert_eq!(Region::of_hub_uri("hub.cn.example.net"), Region::China);
    }

    #[test]
    fn region_profile_lookup_matches_constants() {
        assert_eq!(Region::Global.profile(), &RegionalProfile::GLOBAL);
        assert_eq!(Region::China.profile(), &RegionalProfile::CHINA);
    }

    #[test]
    fn profile_serializes_for_diagnostics() {
        let json = serde_json::to_value(RegionalProfile::CHINA).unwrap();
        assert_eq!(json["region"], "china");
        assert_eq!(json["extra_trust_required"], true);
    }
}
