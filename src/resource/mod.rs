//! Lifecycle adapter for VPC elastic IPs.
//!
//! [`ElasticIpResource`] translates between the host's configuration record
//! ([`ElasticIpConfig`]) and the VPC v1 API exposed through [`VpcApi`]. Create
//! and delete block on the shared [`StateChangeConf`] poller until the
//! provider settles.

mod error;
mod model;
mod options;
mod update;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::lifecycle::{Lifecycle, LifecycleFuture, ReadOutcome, Timeouts};
use crate::vpc::{ApiError, PublicIp, VpcApi};
use crate::wait::{DEFAULT_DELAY, DEFAULT_MIN_INTERVAL, StateChangeConf};

pub use error::ElasticIpError;
pub use model::{BandwidthBlock, ElasticIpConfig, ElasticIpState, PublicIpBlock};
pub use options::{
    apply_opts, bandwidth_opts, bandwidth_update_opts, port_update_opts, public_ip_opts,
};
pub use update::{UpdatePlan, plan_update};

const STATE_ACTIVE: &str = "ACTIVE";
const STATE_DOWN: &str = "DOWN";
const STATE_ERROR: &str = "ERROR";
const STATE_PENDING: &str = "PENDING";
const STATE_DELETED: &str = "DELETED";

/// Elastic IP resource backed by a VPC API implementation.
#[derive(Clone, Debug)]
pub struct ElasticIpResource<A> {
    api: A,
    timeouts: Timeouts,
    delay: Duration,
    min_interval: Duration,
}

impl<A: VpcApi> ElasticIpResource<A> {
    /// Creates a resource adapter using the default poll cadence.
    #[must_use]
    pub const fn new(api: A, timeouts: Timeouts) -> Self {
        Self {
            api,
            timeouts,
            delay: DEFAULT_DELAY,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    /// Overrides the initial delay and the interval between status checks.
    #[must_use]
    pub const fn with_poll_intervals(mut self, delay: Duration, min_interval: Duration) -> Self {
        self.delay = delay;
        self.min_interval = min_interval;
        self
    }

    /// Borrows the underlying API client.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Deadlines applied to create and delete.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Allocates an elastic IP and waits for it to become usable.
    ///
    /// # Errors
    ///
    /// Returns [`ElasticIpError::MissingBlock`] for an incomplete config,
    /// [`ElasticIpError::Allocate`] when the request is rejected, and
    /// [`ElasticIpError::WaitActive`] (carrying the allocated identifier)
    /// when the address never becomes active.
    pub async fn create(&self, config: &ElasticIpConfig) -> Result<ElasticIpState, ElasticIpError> {
        let opts = apply_opts(config)?;
        debug!(?opts, "allocating elastic IP");
        let allocated = self
            .api
            .apply(&opts)
            .await
            .map_err(|source| ElasticIpError::Allocate { source })?;
        let id = allocated.id;
        info!(%id, "elastic IP allocated");

        let conf = self
            .poll_conf(STATE_ACTIVE, self.timeouts.create)
            .pending([STATE_PENDING]);
        conf.wait_for_state(|| self.active_tick(&id))
            .await
            .map_err(|source| ElasticIpError::WaitActive {
                id: id.clone(),
                source,
            })?;
        info!(%id, "elastic IP active");

        match self.fetch(&id).await? {
            ReadOutcome::Found(state) => Ok(state.with_value_specs(config.value_specs.clone())),
            ReadOutcome::Gone => Err(ElasticIpError::Gone { id }),
        }
    }

    /// Refreshes the elastic IP identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ElasticIpError::Fetch`] or [`ElasticIpError::FetchBandwidth`]
    /// for failures other than the address being absent, which is reported
    /// as [`ReadOutcome::Gone`].
    pub async fn read(&self, id: &str) -> Result<ReadOutcome<ElasticIpState>, ElasticIpError> {
        let outcome = self.fetch(id).await?;
        if outcome.is_gone() {
            info!(%id, "elastic IP no longer exists");
        }
        Ok(outcome)
    }

    /// Applies bandwidth and port changes in place.
    ///
    /// The bandwidth change is applied before the port change and is not
    /// rolled back when the port change fails. `value_specs` only apply at
    /// allocation, so the returned state records the desired ones without a
    /// remote call.
    ///
    /// # Errors
    ///
    /// Returns [`ElasticIpError::RequiresReplacement`] when a force-new
    /// attribute differs, [`ElasticIpError::UpdateBandwidth`] or
    /// [`ElasticIpError::UpdatePort`] naming the failed stage, and
    /// [`ElasticIpError::Gone`] when the address disappeared.
    pub async fn update(
        &self,
        id: &str,
        prior: &ElasticIpState,
        desired: &ElasticIpConfig,
    ) -> Result<ElasticIpState, ElasticIpError> {
        let plan = plan_update(prior, desired)?;
        if plan.is_empty() {
            debug!(%id, "elastic IP unchanged");
            return Ok(prior.clone().with_value_specs(desired.value_specs.clone()));
        }

        if let Some(opts) = &plan.bandwidth {
            let current = self.require(id).await?;
            let bandwidth_id = current.bandwidth_id;
            debug!(%id, %bandwidth_id, ?opts, "updating bandwidth");
            self.api
                .update_bandwidth(&bandwidth_id, opts)
                .await
                .map_err(|source| ElasticIpError::UpdateBandwidth {
                    id: bandwidth_id.clone(),
                    source,
                })?;
            info!(%id, %bandwidth_id, "bandwidth updated");
        }

        if let Some(opts) = &plan.port {
            debug!(%id, ?opts, "updating port binding");
            if let Err(source) = self.api.update_public_ip(id, opts).await {
                if plan.bandwidth.is_some() {
                    warn!(%id, error = %source, "bandwidth updated but port update failed");
                }
                return Err(ElasticIpError::UpdatePort {
                    id: id.to_owned(),
                    source,
                });
            }
            info!(%id, port_id = ?opts.port_id, "port binding updated");
        }

        match self.fetch(id).await? {
            ReadOutcome::Found(state) => Ok(state.with_value_specs(desired.value_specs.clone())),
            ReadOutcome::Gone => Err(ElasticIpError::Gone { id: id.to_owned() }),
        }
    }

    /// Releases the elastic IP and waits until it is gone.
    ///
    /// An identifier that is already absent completes without error.
    ///
    /// # Errors
    ///
    /// Returns [`ElasticIpError::Release`] when the release is rejected or
    /// does not complete before the delete timeout.
    pub async fn delete(&self, id: &str) -> Result<(), ElasticIpError> {
        info!(%id, "releasing elastic IP");
        let conf = self
            .poll_conf(STATE_DELETED, self.timeouts.delete)
            .pending([STATE_ACTIVE]);
        conf.wait_for_state(|| self.delete_tick(id))
            .await
            .map_err(|source| ElasticIpError::Release {
                id: id.to_owned(),
                source,
            })?;
        info!(%id, "elastic IP released");
        Ok(())
    }

    /// Adopts an existing elastic IP by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ElasticIpError::Gone`] when no address has that identifier,
    /// plus the errors of [`Self::read`].
    pub async fn import(&self, id: &str) -> Result<ElasticIpState, ElasticIpError> {
        match self.fetch(id).await? {
            ReadOutcome::Found(state) => {
                info!(%id, "elastic IP imported");
                Ok(state)
            }
            ReadOutcome::Gone => Err(ElasticIpError::Gone { id: id.to_owned() }),
        }
    }

    fn poll_conf(&self, target: &str, timeout: Duration) -> StateChangeConf {
        StateChangeConf::new([target], timeout)
            .delay(self.delay)
            .min_interval(self.min_interval)
    }

    async fn fetch(&self, id: &str) -> Result<ReadOutcome<ElasticIpState>, ElasticIpError> {
        let eip = match self.api.get_public_ip(id).await {
            Ok(eip) => eip,
            Err(err) if err.is_not_found() => return Ok(ReadOutcome::Gone),
            Err(source) => {
                return Err(ElasticIpError::Fetch {
                    id: id.to_owned(),
                    source,
                });
            }
        };
        let bandwidth = self
            .api
            .get_bandwidth(&eip.bandwidth_id)
            .await
            .map_err(|source| ElasticIpError::FetchBandwidth {
                id: eip.bandwidth_id.clone(),
                source,
            })?;
        debug!(%id, status = %eip.status, "fetched elastic IP");
        Ok(ReadOutcome::Found(ElasticIpState::from_remote(&eip, &bandwidth)))
    }

    async fn require(&self, id: &str) -> Result<PublicIp, ElasticIpError> {
        self.api.get_public_ip(id).await.map_err(|source| {
            if source.is_not_found() {
                ElasticIpError::Gone { id: id.to_owned() }
            } else {
                ElasticIpError::Fetch {
                    id: id.to_owned(),
                    source,
                }
            }
        })
    }

    async fn active_tick(&self, id: &str) -> Result<(PublicIp, String), ApiError> {
        let eip = self.api.get_public_ip(id).await?;
        let label = match eip.status.as_str() {
            STATE_ACTIVE | STATE_DOWN => STATE_ACTIVE,
            STATE_ERROR => STATE_ERROR,
            _ => STATE_PENDING,
        };
        debug!(%id, status = %eip.status, label, "elastic IP status");
        Ok((eip, label.to_owned()))
    }

    async fn delete_tick(&self, id: &str) -> Result<((), String), ApiError> {
        match self.api.get_public_ip(id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(((), STATE_DELETED.to_owned())),
            Err(err) => return Err(err),
        }
        match self.api.delete_public_ip(id).await {
            Ok(()) => Ok(((), STATE_ACTIVE.to_owned())),
            Err(err) if err.is_not_found() => Ok(((), STATE_DELETED.to_owned())),
            Err(err) => Err(err),
        }
    }
}

impl<A: VpcApi> Lifecycle for ElasticIpResource<A> {
    type Config = ElasticIpConfig;
    type State = ElasticIpState;
    type Error = ElasticIpError;

    fn create<'a>(
        &'a self,
        config: &'a Self::Config,
    ) -> LifecycleFuture<'a, Self::State, Self::Error> {
        Box::pin(Self::create(self, config))
    }

    fn read<'a>(
        &'a self,
        id: &'a str,
    ) -> LifecycleFuture<'a, ReadOutcome<Self::State>, Self::Error> {
        Box::pin(Self::read(self, id))
    }

    fn update<'a>(
        &'a self,
        id: &'a str,
        prior: &'a Self::State,
        desired: &'a Self::Config,
    ) -> LifecycleFuture<'a, Self::State, Self::Error> {
        Box::pin(Self::update(self, id, prior, desired))
    }

    fn delete<'a>(&'a self, id: &'a str) -> LifecycleFuture<'a, (), Self::Error> {
        Box::pin(Self::delete(self, id))
    }

    fn import<'a>(&'a self, id: &'a str) -> LifecycleFuture<'a, Self::State, Self::Error> {
        Box::pin(Self::import(self, id))
    }

    fn timeouts(&self) -> Timeouts {
        self.timeouts
    }
}

#[cfg(test)]
mod tests;
