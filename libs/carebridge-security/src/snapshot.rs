use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Permission and entitlement data loaded for a principal within a tenant.
///
/// Fetched once per request by the context loader. Apart from
/// [`ContextSnapshot::provider_api_enabled`], which the module gate reads, its contents
/// belong to business logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextSnapshot {
    roles: BTreeSet<String>,
    features: BTreeMap<String, bool>,
    provider_ids: Vec<String>,
    provider_api_enabled: bool,
    attributes: BTreeMap<String, serde_json::Value>,
}

impl ContextSnapshot {
    #[must_use]
    pub fn builder() -> ContextSnapshotBuilder {
        ContextSnapshotBuilder::default()
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Unknown features are disabled.
    #[must_use]
    pub fn feature_enabled(&self, feature: &str) -> bool {
        self.features.get(feature).copied().unwrap_or(false)
    }

    /// Providers the principal may act for; empty means no provider-level restriction.
    #[must_use]
    pub fn provider_ids(&self) -> &[String] {
        &self.provider_ids
    }

    /// Whether the tenant has the provider-facing REST API enabled.
    #[must_use]
    pub fn provider_api_enabled(&self) -> bool {
        self.provider_api_enabled
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

#[derive(Debug, Default)]
pub struct ContextSnapshotBuilder {
    inner: ContextSnapshot,
}

impl ContextSnapshotBuilder {
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.inner.roles.insert(role.into());
        self
    }

    #[must_use]
    pub fn feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.inner.features.insert(name.into(), enabled);
        self
    }

    #[must_use]
    pub fn provider_ids(mut self, ids: Vec<String>) -> Self {
        self.inner.provider_ids = ids;
        self
    }

    #[must_use]
    pub fn provider_api_enabled(mut self, enabled: bool) -> Self {
        self.inner.provider_api_enabled = enabled;
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inner.attributes.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> ContextSnapshot {
        self.inner
    }
}
