//! Resolution of the VPC v1 service endpoint.
//!
//! Clouds that register a `vpc` service in their catalog are served from
//! that entry directly. Older deployments only publish the compute (`ecs`)
//! endpoint; for those the VPC URL is derived from it by swapping the
//! service host label and the API version, which mirrors how the provider
//! lays out its regional endpoints.

use thiserror::Error;
use tracing::debug;

use crate::identity::{Availability, ProviderClient, ServiceClient};

/// Catalog type under which the VPC service is registered.
pub const VPC_SERVICE_TYPE: &str = "vpc";

/// Catalog type used as the fallback source endpoint.
pub const COMPUTE_SERVICE_TYPE: &str = "compute";

/// Options selecting which catalog endpoint to use.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EndpointOpts {
    /// Region the endpoint must serve.
    pub region: String,
    /// Interface to select.
    pub availability: Availability,
    /// Explicit VPC endpoint that bypasses catalog discovery.
    pub endpoint_override: Option<String>,
}

impl EndpointOpts {
    /// Creates options for the public interface of `region`.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Selects the interface.
    #[must_use]
    pub const fn availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Sets an explicit endpoint override.
    #[must_use]
    pub fn endpoint_override(mut self, value: Option<String>) -> Self {
        self.endpoint_override = value;
        self
    }
}

/// Errors raised while resolving a service endpoint.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EndpointError {
    /// Raised when neither the VPC nor the compute entry is present.
    #[error("no {service_type} endpoint for region {region} on the {availability} interface")]
    NotFound {
        /// Service type that was looked up last.
        service_type: String,
        /// Requested region.
        region: String,
        /// Requested interface.
        availability: Availability,
    },
}

/// Derives the VPC v1 endpoint from a compute v2 endpoint.
///
/// Replaces the first `ecs` with `vpc` and the first `v2` with `v1`.
#[must_use]
pub fn rewrite_compute_endpoint(compute_url: &str) -> String {
    compute_url.replacen("ecs", "vpc", 1).replacen("v2", "v1", 1)
}

/// Builds a [`ServiceClient`] for the VPC v1 API.
///
/// # Errors
///
/// Returns [`EndpointError::NotFound`] when the catalog contains neither a
/// `vpc` nor a `compute` endpoint matching `opts`.
pub fn new_vpc_v1(
    client: &ProviderClient,
    opts: &EndpointOpts,
) -> Result<ServiceClient, EndpointError> {
    if let Some(endpoint) = opts
        .endpoint_override
        .as_deref()
        .filter(|value| !value.trim().is_empty())
    {
        debug!(endpoint, "using configured VPC endpoint");
        return Ok(client.service_client(endpoint.trim()));
    }

    let catalog = client.catalog();
    if let Some(endpoint) = catalog.endpoint_for(VPC_SERVICE_TYPE, &opts.region, opts.availability)
    {
        debug!(endpoint, "using VPC endpoint from catalog");
        return Ok(client.service_client(endpoint));
    }

    let compute = catalog
        .endpoint_for(COMPUTE_SERVICE_TYPE, &opts.region, opts.availability)
        .ok_or_else(|| EndpointError::NotFound {
            service_type: COMPUTE_SERVICE_TYPE.to_owned(),
            region: opts.region.clone(),
            availability: opts.availability,
        })?;
    let endpoint = rewrite_compute_endpoint(compute);
    debug!(compute, %endpoint, "derived VPC endpoint from compute endpoint");
    Ok(client.service_client(endpoint))
}
