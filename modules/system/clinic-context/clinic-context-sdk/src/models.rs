//! Domain models for the clinic context collaborators.

use std::collections::BTreeMap;

use carebridge_security::Principal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a successful token introspection.
#[derive(Debug, Clone)]
pub struct AuthenticatedToken {
    /// The authenticated caller. Its variant decides how the tenant is resolved.
    pub principal: Principal,
    /// Resource identifiers (audiences) the token was issued for.
    pub resource_ids: Vec<String>,
    /// Extension claims bound inside the token by its issuer.
    pub extensions: BTreeMap<String, String>,
    /// Original bearer token, for downstream forwarding.
    pub bearer_token: String,
}

impl AuthenticatedToken {
    #[must_use]
    pub fn new(principal: Principal, bearer_token: impl Into<String>) -> Self {
        Self {
            principal,
            resource_ids: Vec::new(),
            extensions: BTreeMap::new(),
            bearer_token: bearer_token.into(),
        }
    }

    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }
}

/// Type of a tenant registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryEntryKind {
    /// Names the physical database instance behind the tenant.
    Database,
    Other(String),
}

/// A tenant-scoped registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryEntry {
    pub kind: RegistryEntryKind,
    pub uuid: Uuid,
}

impl RegistryEntry {
    #[must_use]
    pub fn database(uuid: Uuid) -> Self {
        Self {
            kind: RegistryEntryKind::Database,
            uuid,
        }
    }
}

/// The entry that is authoritative for the database cross-check: the first
/// `Database`-typed entry in registry order.
#[must_use]
pub fn authoritative_database_entry(entries: &[RegistryEntry]) -> Option<&RegistryEntry> {
    entries
        .iter()
        .find(|e| e.kind == RegistryEntryKind::Database)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    const DB_A: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);
    const DB_B: Uuid = Uuid::from_u128(0x2222_2222_2222_2222_2222_2222_2222_2222);

    #[test]
    fn authoritative_entry_skips_other_kinds() {
        let entries = vec![
            RegistryEntry {
                kind: RegistryEntryKind::Other("Reporting".to_owned()),
                uuid: DB_B,
            },
            RegistryEntry::database(DB_A),
        ];

        assert_eq!(authoritative_database_entry(&entries).map(|e| e.uuid), Some(DB_A));
    }

    #[test]
    fn authoritative_entry_is_first_database_entry() {
        let entries = vec![RegistryEntry::database(DB_A), RegistryEntry::database(DB_B)];

        assert_eq!(authoritative_database_entry(&entries).map(|e| e.uuid), Some(DB_A));
    }

    #[test]
    fn no_database_entry_yields_none() {
        assert!(authoritative_database_entry(&[]).is_none());
    }
}
