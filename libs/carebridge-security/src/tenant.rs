use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical tenant (clinic) identifier, usually a short acronym naming the clinic database.
///
/// An empty identifier is the value single-tenant deployments resolve to and is always
/// treated as present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant identifier, trimming surrounding whitespace.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_owned())
    }

    /// The identifier used by single-tenant deployments.
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Parse an optional raw value; blank input is treated as absent.
    #[must_use]
    pub fn parse_optional(raw: Option<&str>) -> Option<Self> {
        raw.map(Self::new).filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
