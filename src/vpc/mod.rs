//! Bindings for the VPC v1 public IP and bandwidth APIs.
//!
//! [`VpcApi`] is the seam the resource adapter depends on; [`VpcClient`]
//! implements it over HTTP through a [`ServiceClient`] resolved by
//! [`crate::endpoint::new_vpc_v1`].

mod bandwidths;
mod eips;

use std::future::Future;
use std::pin::Pin;

pub use crate::identity::ApiError;
use crate::identity::ServiceClient;

pub use bandwidths::{Bandwidth, BandwidthUpdateOpts, PublicIpInfo};
pub use eips::{ApplyOpts, BandwidthOpts, PublicIp, PublicIpOpts, PublicIpUpdateOpts};

/// Future returned by VPC API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Remote operations on elastic IPs and their bandwidth.
pub trait VpcApi: Send + Sync {
    /// Allocates a public IP together with a new bandwidth.
    fn apply<'a>(&'a self, opts: &'a ApplyOpts) -> ApiFuture<'a, PublicIp>;

    /// Fetches a public IP by identifier.
    fn get_public_ip<'a>(&'a self, id: &'a str) -> ApiFuture<'a, PublicIp>;

    /// Rebinds (or unbinds) the port of a public IP.
    fn update_public_ip<'a>(
        &'a self,
        id: &'a str,
        opts: &'a PublicIpUpdateOpts,
    ) -> ApiFuture<'a, PublicIp>;

    /// Releases a public IP.
    fn delete_public_ip<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()>;

    /// Fetches a bandwidth by identifier.
    fn get_bandwidth<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Bandwidth>;

    /// Renames or resizes a bandwidth.
    fn update_bandwidth<'a>(
        &'a self,
        id: &'a str,
        opts: &'a BandwidthUpdateOpts,
    ) -> ApiFuture<'a, Bandwidth>;
}

/// HTTP implementation of [`VpcApi`].
#[derive(Clone, Debug)]
pub struct VpcClient {
    service: ServiceClient,
}

impl VpcClient {
    /// Wraps a service client already pointing at the VPC v1 endpoint.
    #[must_use]
    pub const fn new(service: ServiceClient) -> Self {
        Self { service }
    }

    /// Endpoint the client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.service.endpoint()
    }
}

impl VpcApi for VpcClient {
    fn apply<'a>(&'a self, opts: &'a ApplyOpts) -> ApiFuture<'a, PublicIp> {
        Box::pin(eips::apply(&self.service, opts))
    }

    fn get_public_ip<'a>(&'a self, id: &'a str) -> ApiFuture<'a, PublicIp> {
        Box::pin(eips::get(&self.service, id))
    }

    fn update_public_ip<'a>(
        &'a self,
        id: &'a str,
        opts: &'a PublicIpUpdateOpts,
    ) -> ApiFuture<'a, PublicIp> {
        Box::pin(eips::update(&self.service, id, opts))
    }

    fn delete_public_ip<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(eips::delete(&self.service, id))
    }

    fn get_bandwidth<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Bandwidth> {
        Box::pin(bandwidths::get(&self.service, id))
    }

    fn update_bandwidth<'a>(
        &'a self,
        id: &'a str,
        opts: &'a BandwidthUpdateOpts,
    ) -> ApiFuture<'a, Bandwidth> {
        Box::pin(bandwidths::update(&self.service, id, opts))
    }
}
