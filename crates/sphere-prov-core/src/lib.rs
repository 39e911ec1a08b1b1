#![deny(missing_docs)]

//! # sphere-prov-core — Foundational Types for Sphere DPS Provisioning
//!
//! This crate defines the value types that the provisioning client is built
//! from. It performs no I/O and depends on nothing internal; the stateful
//! session, the collaborator traits and the `provision` operation live in
//! `sphere-prov-client`.
//!
//! ## Key Design Principles
//!
//! 1. **Validated scope identifiers.** [`ScopeId`] rejects empty and
//!    non-printable input at construction. Everything downstream takes a
//!    `&ScopeId`, never a bare string.
//!
//! 2. **Two regional profiles, resolved by prefix.** [`resolve_region`] maps
//!    `0cn…` to the China profile and `0ne…` to the global profile and rejects
//!    everything else. The hub leg decides its trust anchor separately, from
//!    the assigned hub URI ([`Region::of_hub_uri`]).
//!
//! 3. **Structural result encoding.** [`ProvisioningReturn`] pairs a
//!    [`ProvisioningStatus`] with a [`SecondaryCode`] whose variant is fixed by
//!    the status. A DPS code can never ride along with a hub status.
//!
//! 4. **[`ProvisioningError`] hierarchy.** Structured errors with `thiserror`;
//!    no `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sphere-prov-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.

pub mod codes;
pub mod error;
pub mod options;
pub mod outcome;
pub mod region;
pub mod scope;
pub mod trust;

// Re-export primary types at crate root for ergonomic imports.
pub use codes::{IotHubClientError, ProvDeviceError};
pub use error::{ProvisioningError, ValidationError};
pub use options::{DeviceOption, Protocol, SecureDeviceType, DEVICE_ID};
pub use outcome::{ProvisioningReturn, ProvisioningStatus, SecondaryCode};
pub use region::{resolve_region, Region, RegionalProfile};
pub use scope::ScopeId;
pub use trust::{trust_anchor_fingerprint, DIGICERT_GLOBAL_ROOT_CA};
