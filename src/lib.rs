//! Elastic IP resource adapter for the VPC v1 API.
//!
//! The crate authenticates against an identity v3 service, resolves the VPC
//! v1 endpoint from the service catalog, and drives elastic IPs (a public
//! address plus its bandwidth allocation) through a host-facing lifecycle
//! (create → wait until active → read → update in place → release).

pub mod config;
pub mod endpoint;
pub mod identity;
pub mod lifecycle;
pub mod resource;
pub mod test_support;
pub mod vpc;
pub mod wait;

pub use config::{ConfigError, ProviderConfig};
pub use endpoint::{EndpointError, EndpointOpts, new_vpc_v1, rewrite_compute_endpoint};
pub use identity::{
    AuthOptions, Availability, Credentials, IdentityError, ProviderClient, ServiceCatalog,
    ServiceClient, http_client,
};
pub use lifecycle::{Lifecycle, LifecycleFuture, ReadOutcome, Timeouts};
pub use resource::{
    BandwidthBlock, ElasticIpConfig, ElasticIpError, ElasticIpResource, ElasticIpState,
    PublicIpBlock, UpdatePlan,
};
pub use vpc::{ApiError, VpcApi, VpcClient};
pub use wait::{StateChangeConf, WaitError};
