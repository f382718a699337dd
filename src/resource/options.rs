//! Mapping from the configuration record to API request payloads.

use crate::vpc::{ApplyOpts, BandwidthOpts, BandwidthUpdateOpts, PublicIpOpts, PublicIpUpdateOpts};

use super::ElasticIpError;
use super::model::{BandwidthBlock, ElasticIpConfig, PublicIpBlock};

pub(super) const PUBLICIP_BLOCK: &str = "publicip";
pub(super) const BANDWIDTH_BLOCK: &str = "bandwidth";

pub(super) fn publicip_block(config: &ElasticIpConfig) -> Result<&PublicIpBlock, ElasticIpError> {
    config
        .publicip
        .as_ref()
        .ok_or(ElasticIpError::MissingBlock {
            block: PUBLICIP_BLOCK,
        })
}

pub(super) fn bandwidth_block(config: &ElasticIpConfig) -> Result<&BandwidthBlock, ElasticIpError> {
    config
        .bandwidth
        .as_ref()
        .ok_or(ElasticIpError::MissingBlock {
            block: BANDWIDTH_BLOCK,
        })
}

/// Builds the public IP section of an apply request.
///
/// # Errors
///
/// Returns [`ElasticIpError::MissingBlock`] when `publicip` is absent.
pub fn public_ip_opts(config: &ElasticIpConfig) -> Result<PublicIpOpts, ElasticIpError> {
    let block = publicip_block(config)?;
    Ok(PublicIpOpts {
        ip_type: block.ip_type.clone(),
        ip_address: block.ip_address.clone().unwrap_or_default(),
    })
}

/// Builds the bandwidth section of an apply request.
///
/// # Errors
///
/// Returns [`ElasticIpError::MissingBlock`] when `bandwidth` is absent.
pub fn bandwidth_opts(config: &ElasticIpConfig) -> Result<BandwidthOpts, ElasticIpError> {
    let block = bandwidth_block(config)?;
    Ok(BandwidthOpts {
        name: block.name.clone(),
        size: block.size,
        share_type: block.share_type.clone(),
        charge_mode: block.charge_mode.clone().unwrap_or_default(),
    })
}

/// Builds the full apply request, including extra options.
///
/// # Errors
///
/// Returns [`ElasticIpError::MissingBlock`] when either block is absent.
pub fn apply_opts(config: &ElasticIpConfig) -> Result<ApplyOpts, ElasticIpError> {
    Ok(ApplyOpts {
        publicip: public_ip_opts(config)?,
        bandwidth: bandwidth_opts(config)?,
        value_specs: config.value_specs.clone(),
    })
}

/// Builds a bandwidth update carrying the desired name and size.
#[must_use]
pub fn bandwidth_update_opts(block: &BandwidthBlock) -> BandwidthUpdateOpts {
    BandwidthUpdateOpts {
        name: block.name.clone(),
        size: block.size,
    }
}

/// Builds a port binding update; an absent or blank port unbinds.
#[must_use]
pub fn port_update_opts(block: &PublicIpBlock) -> PublicIpUpdateOpts {
    PublicIpUpdateOpts {
        port_id: normalised_port(block),
    }
}

pub(super) fn normalised_port(block: &PublicIpBlock) -> Option<String> {
    block
        .port_id
        .as_deref()
        .map(str::trim)
        .filter(|port| !port.is_empty())
        .map(str::to_owned)
}
