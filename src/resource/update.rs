//! Planning of in-place updates.

use crate::vpc::{BandwidthUpdateOpts, PublicIpUpdateOpts};

use super::ElasticIpError;
use super::model::{ElasticIpConfig, ElasticIpState};
use super::options::{
    bandwidth_block, bandwidth_update_opts, normalised_port, port_update_opts, publicip_block,
};

/// Remote calls needed to move from the prior state to the desired config.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UpdatePlan {
    /// Bandwidth rename or resize, if any.
    pub bandwidth: Option<BandwidthUpdateOpts>,
    /// Port rebind or unbind, if any.
    pub port: Option<PublicIpUpdateOpts>,
}

impl UpdatePlan {
    /// Returns `true` when no remote call is needed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bandwidth.is_none() && self.port.is_none()
    }
}

/// Compares `prior` with `desired` and lists the in-place changes.
///
/// Optional attributes left unset in `desired` (`ip_address`,
/// `charge_mode`) are treated as provider-computed and never differ.
///
/// # Errors
///
/// Returns [`ElasticIpError::MissingBlock`] when a block is absent, and
/// [`ElasticIpError::RequiresReplacement`] when an attribute that cannot be
/// changed in place differs.
pub fn plan_update(
    prior: &ElasticIpState,
    desired: &ElasticIpConfig,
) -> Result<UpdatePlan, ElasticIpError> {
    let publicip = publicip_block(desired)?;
    let bandwidth = bandwidth_block(desired)?;

    if publicip.ip_type != prior.publicip.ip_type {
        return Err(ElasticIpError::RequiresReplacement {
            field: "publicip.type",
        });
    }
    if publicip
        .ip_address
        .as_ref()
        .is_some_and(|address| Some(address) != prior.publicip.ip_address.as_ref())
    {
        return Err(ElasticIpError::RequiresReplacement {
            field: "publicip.ip_address",
        });
    }
    if bandwidth.share_type != prior.bandwidth.share_type {
        return Err(ElasticIpError::RequiresReplacement {
            field: "bandwidth.share_type",
        });
    }
    if bandwidth
        .charge_mode
        .as_ref()
        .filter(|mode| !mode.is_empty())
        .is_some_and(|mode| Some(mode) != prior.bandwidth.charge_mode.as_ref())
    {
        return Err(ElasticIpError::RequiresReplacement {
            field: "bandwidth.charge_mode",
        });
    }

    let bandwidth_changed =
        bandwidth.name != prior.bandwidth.name || bandwidth.size != prior.bandwidth.size;
    let port_changed = normalised_port(publicip) != normalised_port(&prior.publicip);

    Ok(UpdatePlan {
        bandwidth: bandwidth_changed.then(|| bandwidth_update_opts(bandwidth)),
        port: port_changed.then(|| port_update_opts(publicip)),
    })
}
