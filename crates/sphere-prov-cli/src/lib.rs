//! # sphere-prov-cli — Command-Line Front End
//!
//! Provides the `sphere-prov` binary.
//!
//! ## Subcommands
//!
//! - `sphere-prov resolve` — Regional profile for a scope identifier.
//! - `sphere-prov trust-anchor` — Print the compiled-in root CA or its fingerprint.
//! - `sphere-prov simulate` — Full provisioning run against the scripted platform.
//!
//! Handlers write to the supplied writer and return the process exit code.
//!
//! ```bash
//! sphere-prov resolve 0cn00ABCDEF
//! sphere-prov trust-anchor --fingerprint
//! sphere-prov simulate 0ne00ABCDEF --assign-after 3 --hub-uri myhub.azure-devices.net
//! SPHERE_DPS_SCOPE_ID=0ne00ABCDEF sphere-prov simulate --never-assign
//! ```

pub mod resolve;
pub mod simulate;
pub mod trust;
