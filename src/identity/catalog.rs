//! Service catalog returned alongside an identity token.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::IdentityError;

/// Endpoint interface requested from the catalog.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Availability {
    /// Endpoint reachable from outside the cloud.
    #[default]
    Public,
    /// Endpoint reachable from inside the cloud network.
    Internal,
    /// Administrative endpoint.
    Admin,
}

impl Availability {
    /// Interface name as spelled in the catalog.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Availability {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" | "publicurl" => Ok(Self::Public),
            "internal" | "internalurl" => Ok(Self::Internal),
            "admin" | "adminurl" => Ok(Self::Admin),
            other => Err(IdentityError::InvalidAvailability {
                value: other.to_owned(),
            }),
        }
    }
}

/// One catalog entry: a service type and its endpoints.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CatalogEntry {
    /// Service type, for example `compute` or `vpc`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service name as registered by the operator.
    #[serde(default)]
    pub name: String,
    /// Endpoints registered for the service.
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// A single endpoint registered for a service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CatalogEndpoint {
    /// Interface name (`public`, `internal` or `admin`).
    pub interface: String,
    /// Region name the endpoint serves.
    #[serde(default)]
    pub region: Option<String>,
    /// Region identifier the endpoint serves.
    #[serde(default)]
    pub region_id: Option<String>,
    /// Base URL of the endpoint.
    pub url: String,
}

impl CatalogEndpoint {
    fn serves(&self, region: &str) -> bool {
        self.region.as_deref() == Some(region) || self.region_id.as_deref() == Some(region)
    }
}

/// Service catalog scoped to the authenticated project.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    /// Builds a catalog from explicit entries.
    #[must_use]
    pub const fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Returns the entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Finds the URL for `service_type` in `region` on the given interface.
    #[must_use]
    pub fn endpoint_for(
        &self,
        service_type: &str,
        region: &str,
        availability: Availability,
    ) -> Option<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.service_type == service_type)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|endpoint| {
                endpoint.interface == availability.as_str() && endpoint.serves(region)
            })
            .map(|endpoint| endpoint.url.as_str())
    }
}
