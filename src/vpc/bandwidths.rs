//! Bandwidth (`bandwidths`) requests and payloads.

use serde::{Deserialize, Serialize};

use crate::identity::ServiceClient;

use super::ApiError;

const RESOURCE_PATH: &str = "bandwidths";

/// Public IP attached to a bandwidth.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicIpInfo {
    /// Public IP identifier.
    #[serde(default)]
    pub publicip_id: String,
    /// Public address.
    #[serde(default)]
    pub publicip_address: String,
    /// Address type.
    #[serde(default)]
    pub publicip_type: String,
}

/// Bandwidth as reported by the API.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct Bandwidth {
    /// Provider-assigned identifier.
    pub id: String,
    /// Bandwidth name.
    #[serde(default)]
    pub name: String,
    /// Size in Mbit/s.
    #[serde(default)]
    pub size: u32,
    /// Sharing type.
    #[serde(default)]
    pub share_type: String,
    /// Addresses using this bandwidth.
    #[serde(default)]
    pub publicip_info: Vec<PublicIpInfo>,
    /// Owning project.
    #[serde(default)]
    pub tenant_id: String,
    /// Bandwidth type.
    #[serde(default)]
    pub bandwidth_type: String,
    /// Billing mode.
    #[serde(default)]
    pub charge_mode: String,
}

/// Body of a bandwidth update request. Empty or zero fields are omitted.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct BandwidthUpdateOpts {
    /// New name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// New size in Mbit/s.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub size: u32,
}

#[expect(
    clippy::trivially_copy_pass_by_ref,
    reason = "serde skip_serializing_if passes fields by reference"
)]
const fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Deserialize)]
struct BandwidthEnvelope {
    bandwidth: Bandwidth,
}

#[derive(Serialize)]
struct UpdateEnvelope<'a> {
    bandwidth: &'a BandwidthUpdateOpts,
}

pub(super) async fn get(client: &ServiceClient, id: &str) -> Result<Bandwidth, ApiError> {
    let url = client.service_url(&[RESOURCE_PATH, id])?;
    let envelope: BandwidthEnvelope = client.get_json(&url).await?;
    Ok(envelope.bandwidth)
}

pub(super) async fn update(
    client: &ServiceClient,
    id: &str,
    opts: &BandwidthUpdateOpts,
) -> Result<Bandwidth, ApiError> {
    let url = client.service_url(&[RESOURCE_PATH, id])?;
    let envelope: BandwidthEnvelope = client
        .put_json(&url, &UpdateEnvelope { bandwidth: opts })
        .await?;
    Ok(envelope.bandwidth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_body_skips_unset_fields() {
        let opts = BandwidthUpdateOpts {
            name: String::new(),
            size: 20,
        };
        assert_eq!(
            serde_json::to_value(UpdateEnvelope { bandwidth: &opts }).ok(),
            Some(json!({ "bandwidth": { "size": 20 } }))
        );
    }
}
