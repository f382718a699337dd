//! Configuration record and observed state of an elastic IP.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::vpc::{Bandwidth, PublicIp};

/// Public IP block of the configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicIpBlock {
    /// Address type, for example `5_bgp`. Changing it forces replacement.
    #[serde(rename = "type")]
    pub ip_type: String,
    /// Specific address to allocate. Changing it forces replacement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Port to bind the address to. Updated in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
}

/// Bandwidth block of the configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct BandwidthBlock {
    /// Bandwidth name. Updated in place.
    pub name: String,
    /// Size in Mbit/s. Updated in place.
    pub size: u32,
    /// Sharing type (`PER` or `WHOLE`). Changing it forces replacement.
    pub share_type: String,
    /// Billing mode. Changing it forces replacement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_mode: Option<String>,
}

/// Desired configuration of an elastic IP, as supplied by the host.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct ElasticIpConfig {
    /// Region override; the provider region applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// The single public IP block.
    #[serde(default)]
    pub publicip: Option<PublicIpBlock>,
    /// The single bandwidth block.
    #[serde(default)]
    pub bandwidth: Option<BandwidthBlock>,
    /// Provider-specific options merged into the create request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_specs: BTreeMap<String, String>,
}

/// Observed state of an elastic IP.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct ElasticIpState {
    /// Provider-assigned identifier.
    pub id: String,
    /// Lifecycle status reported by the provider.
    pub status: String,
    /// Public IP attributes as observed.
    pub publicip: PublicIpBlock,
    /// Bandwidth attributes as observed.
    pub bandwidth: BandwidthBlock,
    /// Identifier of the associated bandwidth.
    pub bandwidth_id: String,
    /// Private address of the bound port, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    /// Owning project.
    #[serde(default)]
    pub tenant_id: String,
    /// Allocation timestamp.
    #[serde(default)]
    pub create_time: String,
    /// Create-time options carried over from the configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_specs: BTreeMap<String, String>,
}

impl ElasticIpState {
    /// Combines a public IP and its bandwidth into host state.
    ///
    /// Size and share type come from the public IP, name and charge mode from
    /// the bandwidth.
    #[must_use]
    pub fn from_remote(eip: &PublicIp, bandwidth: &Bandwidth) -> Self {
        Self {
            id: eip.id.clone(),
            status: eip.status.clone(),
            publicip: PublicIpBlock {
                ip_type: eip.ip_type.clone(),
                ip_address: non_empty(&eip.public_ip_address),
                port_id: eip.port_id.as_deref().and_then(non_empty),
            },
            bandwidth: BandwidthBlock {
                name: bandwidth.name.clone(),
                size: eip.bandwidth_size,
                share_type: eip.bandwidth_share_type.clone(),
                charge_mode: non_empty(&bandwidth.charge_mode),
            },
            bandwidth_id: eip.bandwidth_id.clone(),
            private_ip_address: eip.private_ip_address.as_deref().and_then(non_empty),
            tenant_id: eip.tenant_id.clone(),
            create_time: eip.create_time.clone(),
            value_specs: BTreeMap::new(),
        }
    }

    /// Attaches create-time options the API does not echo back.
    #[must_use]
    pub fn with_value_specs(mut self, value_specs: BTreeMap<String, String>) -> Self {
        self.value_specs = value_specs;
        self
    }

    /// Projects the state onto a configuration record.
    #[must_use]
    pub fn to_config(&self) -> ElasticIpConfig {
        ElasticIpConfig {
            region: None,
            publicip: Some(self.publicip.clone()),
            bandwidth: Some(self.bandwidth.clone()),
            value_specs: self.value_specs.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
