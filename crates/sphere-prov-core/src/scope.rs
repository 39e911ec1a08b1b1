//! # DPS Scope Identifier
//!
//! The scope identifier names a DPS instance and tenant. It is opaque to the
//! client: only its leading three characters are inspected (by the region
//! resolver), and the full string is handed verbatim to the DPS transport.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of leading characters that encode the DPS region.
pub const SCOPE_PREFIX_LEN: usize = 3;

/// A validated DPS scope identifier.
///
/// Construction rejects empty or all-whitespace input and any non-printable
/// character. The stored value is exactly what was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeId(String);

impl ScopeId {
    /// Validate and wrap a scope identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyScopeId);
        }
        if let Some((offset, _)) = raw.char_indices().find(|(_, c)| c.is_control()) {
            return Err(ValidationError::NonPrintableScopeId(offset));
        }
        Ok(Self(raw))
    }

    /// The identifier as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The region-encoding prefix: the first three characters, or the whole
    /// identifier when it is shorter.
    pub fn prefix(&self) -> &str {
        match self.0.char_indices().nth(SCOPE_PREFIX_LEN) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for ScopeId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScopeId> for String {
    fn from(value: ScopeId) -> Self {
        value.0
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_printable_identifier_verbatim() {
        let scope = ScopeId::new("0ne00ABCDEF").unwrap();
        assert_eq!(scope.as_str(), "0ne00ABCDEF");
        assert_eq!(scope.to_string(), "0ne00ABCDEF");
        assert_eq!(scope.prefix(), "0ne");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(ScopeId::new(""), Err(ValidationError::EmptyScopeId));
        assert_eq!(ScopeId::new("   "), Err(ValidationError::EmptyScopeId));
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(
            ScopeId::new("0ne\n123"),
            Err(ValidationError::NonPrintableScopeId(3))
        );
        assert!(ScopeId::new("0cn\u{0}").is_err());
    }

    #[test]
    fn short_identifier_prefix_is_whole_string() {
        let scope = ScopeId::new("0n").unwrap();
        assert_eq!(scope.prefix(), "0n");
    }

    #[test]
    fn prefix_respects_char_boundaries() {
        let scope = ScopeId::new("é0ne").unwrap();
        assert_eq!(scope.prefix(), "é0n");
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let scope: ScopeId = serde_json::from_str("\"0cn00XYZ\"").unwrap();
        assert_eq!(scope.as_str(), "0cn00XYZ");
        assert!(serde_json::from_str::<ScopeId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&scope).unwrap(), "\"0cn00XYZ\"");
    }
}
