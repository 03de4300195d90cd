//! Credential principals.
//!
//! Every authenticated request carries exactly one [`Principal`]. The variant decides
//! which tenant-resolution rule applies, whether the registry cross-check runs, and which
//! entitlement flag the module gate consults, so consumers must `match` on it exhaustively.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// Identity fields shared by every principal shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalClaims {
    /// Stable identifier (user name, patient portal login, client id, federated subject).
    pub id: String,
    /// Tenant embedded in the token at authentication time, if any.
    pub tenant_id: Option<TenantId>,
    /// Scopes granted to the token.
    pub scopes: BTreeSet<String>,
}

impl PrincipalClaims {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<TenantId>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

/// The authenticated party making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// Clinic staff authenticated with the resource-owner grant.
    ResourceOwnerUser(PrincipalClaims),
    /// Portal patient authenticated with the resource-owner grant.
    PatientUser {
        #[serde(flatten)]
        claims: PrincipalClaims,
        patient_id: String,
    },
    /// Identity issued by a pre-trusted third party; its tenant binding is trusted as-is.
    FederatedUser(PrincipalClaims),
    /// Machine-to-machine client with no human principal.
    ClientCredential(PrincipalClaims),
}

impl Principal {
    #[must_use]
    pub fn claims(&self) -> &PrincipalClaims {
        match self {
            Self::ResourceOwnerUser(claims)
            | Self::FederatedUser(claims)
            | Self::ClientCredential(claims)
            | Self::PatientUser { claims, .. } => claims,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.claims().id
    }

    /// Tenant embedded in the token, if the issuer put one there.
    #[must_use]
    pub fn embedded_tenant(&self) -> Option<&TenantId> {
        self.claims().tenant_id.as_ref()
    }

    #[must_use]
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.claims().scopes
    }

    #[must_use]
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Self::ResourceOwnerUser(_) => PrincipalKind::ResourceOwnerUser,
            Self::PatientUser { .. } => PrincipalKind::PatientUser,
            Self::FederatedUser(_) => PrincipalKind::FederatedUser,
            Self::ClientCredential(_) => PrincipalKind::ClientCredential,
        }
    }

    /// `OAuth2` grant the token was obtained with.
    #[must_use]
    pub fn grant_type(&self) -> GrantType {
        match self {
            Self::ResourceOwnerUser(_) | Self::PatientUser { .. } => GrantType::ResourceOwner,
            Self::FederatedUser(_) => GrantType::Federated,
            Self::ClientCredential(_) => GrantType::ClientCredentials,
        }
    }

    #[must_use]
    pub fn patient_id(&self) -> Option<&str> {
        match self {
            Self::PatientUser { patient_id, .. } => Some(patient_id),
            Self::ResourceOwnerUser(_) | Self::FederatedUser(_) | Self::ClientCredential(_) => {
                None
            }
        }
    }
}

/// Field-less discriminant of [`Principal`], used for logging and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    ResourceOwnerUser,
    PatientUser,
    FederatedUser,
    ClientCredential,
}

impl PrincipalKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResourceOwnerUser => "resource_owner_user",
            Self::PatientUser => "patient_user",
            Self::FederatedUser => "federated_user",
            Self::ClientCredential => "client_credential",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `OAuth2` credential-issuance mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ResourceOwner,
    ClientCredentials,
    Federated,
}

impl GrantType {
    /// Wire label, as `OAuth2` names the grant.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResourceOwner => "password",
            Self::ClientCredentials => "client_credentials",
            Self::Federated => "urn:ietf:params:oauth:grant-type:jwt-bearer",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
