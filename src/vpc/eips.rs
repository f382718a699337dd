//! Public IP (`publicips`) requests and payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::identity::ServiceClient;

use super::ApiError;

const RESOURCE_PATH: &str = "publicips";

/// Public IP section of an apply request.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicIpOpts {
    /// Address type, for example `5_bgp`.
    #[serde(rename = "type")]
    pub ip_type: String,
    /// Specific address to allocate; empty lets the provider choose.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip_address: String,
}

impl PublicIpOpts {
    fn to_body(&self) -> Value {
        let mut section = Map::new();
        section.insert(String::from("type"), Value::from(self.ip_type.as_str()));
        insert_non_empty(&mut section, "ip_address", &self.ip_address);
        Value::Object(section)
    }
}

/// Bandwidth section of an apply request.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct BandwidthOpts {
    /// Bandwidth name.
    pub name: String,
    /// Bandwidth size in Mbit/s.
    pub size: u32,
    /// Sharing type, `PER` (dedicated) or `WHOLE` (shared).
    pub share_type: String,
    /// Billing mode; empty uses the provider default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub charge_mode: String,
}

impl BandwidthOpts {
    fn to_body(&self) -> Value {
        let mut section = Map::new();
        section.insert(String::from("name"), Value::from(self.name.as_str()));
        section.insert(String::from("size"), Value::from(self.size));
        section.insert(String::from("share_type"), Value::from(self.share_type.as_str()));
        insert_non_empty(&mut section, "charge_mode", &self.charge_mode);
        Value::Object(section)
    }
}

fn insert_non_empty(section: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        section.insert(key.to_owned(), Value::from(value));
    }
}

/// Body of an apply (allocate) request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ApplyOpts {
    /// Public IP parameters.
    pub publicip: PublicIpOpts,
    /// Bandwidth parameters.
    pub bandwidth: BandwidthOpts,
    /// Extra top-level fields merged into the request body.
    pub value_specs: BTreeMap<String, String>,
}

impl ApplyOpts {
    /// Renders the JSON request body.
    ///
    /// Extra options are merged at the top level. They cannot replace the
    /// `publicip` or `bandwidth` sections; such keys are dropped.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert(String::from("publicip"), self.publicip.to_body());
        body.insert(String::from("bandwidth"), self.bandwidth.to_body());
        for (key, value) in &self.value_specs {
            if body.contains_key(key) {
                warn!(key = %key, "ignoring value_specs entry that collides with a request section");
                continue;
            }
            body.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(body)
    }
}

/// Body of a public IP update request.
///
/// `port_id` is always serialised; `null` unbinds the address from its port.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicIpUpdateOpts {
    /// Port to bind the address to, or `None` to unbind.
    pub port_id: Option<String>,
}

/// Public IP as reported by the API.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicIp {
    /// Provider-assigned identifier.
    pub id: String,
    /// Lifecycle status, for example `ACTIVE`, `DOWN` or `PENDING_CREATE`.
    #[serde(default)]
    pub status: String,
    /// Address type.
    #[serde(rename = "type", default)]
    pub ip_type: String,
    /// Allocated public address.
    #[serde(default)]
    pub public_ip_address: String,
    /// Private address of the bound port, if any.
    #[serde(default)]
    pub private_ip_address: Option<String>,
    /// Bound port, if any.
    #[serde(default)]
    pub port_id: Option<String>,
    /// Owning project.
    #[serde(default)]
    pub tenant_id: String,
    /// Allocation timestamp.
    #[serde(default)]
    pub create_time: String,
    /// Identifier of the associated bandwidth.
    #[serde(default)]
    pub bandwidth_id: String,
    /// Bandwidth size in Mbit/s.
    #[serde(default)]
    pub bandwidth_size: u32,
    /// Bandwidth sharing type.
    #[serde(default)]
    pub bandwidth_share_type: String,
}

#[derive(Deserialize)]
struct PublicIpEnvelope {
    publicip: PublicIp,
}

#[derive(Serialize)]
struct UpdateEnvelope<'a> {
    publicip: &'a PublicIpUpdateOpts,
}

pub(super) async fn apply(client: &ServiceClient, opts: &ApplyOpts) -> Result<PublicIp, ApiError> {
    let url = client.service_url(&[RESOURCE_PATH])?;
    let envelope: PublicIpEnvelope = client.post_json(&url, &opts.to_body()).await?;
    Ok(envelope.publicip)
}

pub(super) async fn get(client: &ServiceClient, id: &str) -> Result<PublicIp, ApiError> {
    let url = client.service_url(&[RESOURCE_PATH, id])?;
    let envelope: PublicIpEnvelope = client.get_json(&url).await?;
    Ok(envelope.publicip)
}

pub(super) async fn update(
    client: &ServiceClient,
    id: &str,
    opts: &PublicIpUpdateOpts,
) -> Result<PublicIp, ApiError> {
    let url = client.service_url(&[RESOURCE_PATH, id])?;
    let envelope: PublicIpEnvelope = client
        .put_json(&url, &UpdateEnvelope { publicip: opts })
        .await?;
    Ok(envelope.publicip)
}

pub(super) async fn delete(client: &ServiceClient, id: &str) -> Result<(), ApiError> {
    let url = client.service_url(&[RESOURCE_PATH, id])?;
    client.delete(&url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts() -> ApplyOpts {
        ApplyOpts {
            publicip: PublicIpOpts {
                ip_type: String::from("5_bgp"),
                ip_address: String::new(),
            },
            bandwidth: BandwidthOpts {
                name: String::from("eip-bw"),
                size: 10,
                share_type: String::from("PER"),
                charge_mode: String::new(),
            },
            value_specs: BTreeMap::new(),
        }
    }

    #[test]
    fn body_omits_empty_optional_fields() {
        assert_eq!(
            opts().to_body(),
            json!({
                "publicip": { "type": "5_bgp" },
                "bandwidth": { "name": "eip-bw", "size": 10, "share_type": "PER" }
            })
        );
    }

    #[test]
    fn body_carries_requested_address_and_charge_mode() {
        let mut apply = opts();
        apply.publicip.ip_address = String::from("192.0.2.50");
        apply.bandwidth.charge_mode = String::from("traffic");

        assert_eq!(
            apply.to_body(),
            json!({
                "publicip": { "type": "5_bgp", "ip_address": "192.0.2.50" },
                "bandwidth": {
                    "name": "eip-bw",
                    "size": 10,
                    "share_type": "PER",
                    "charge_mode": "traffic"
                }
            })
        );
    }

    #[test]
    fn body_merges_value_specs_without_overriding_sections() {
        let mut apply = opts();
        apply
            .value_specs
            .insert(String::from("enterprise_project_id"), String::from("ep-1"));
        apply
            .value_specs
            .insert(String::from("publicip"), String::from("clobber"));

        let body = apply.to_body();
        assert_eq!(body["enterprise_project_id"], "ep-1");
        assert_eq!(body["publicip"]["type"], "5_bgp");
    }

    #[test]
    fn update_serialises_null_port_to_unbind() {
        let unbind = PublicIpUpdateOpts { port_id: None };
        assert_eq!(
            serde_json::to_value(UpdateEnvelope { publicip: &unbind }).ok(),
            Some(json!({ "publicip": { "port_id": null } }))
        );
    }

    #[test]
    fn public_ip_tolerates_null_port() {
        let parsed: PublicIp = serde_json::from_value(json!({
            "id": "eip-1",
            "status": "DOWN",
            "type": "5_bgp",
            "public_ip_address": "192.0.2.10",
            "port_id": null,
            "bandwidth_id": "bw-1",
            "bandwidth_size": 10,
            "bandwidth_share_type": "PER"
        }))
        .expect("public ip should decode");
        assert_eq!(parsed.port_id, None);
        assert_eq!(parsed.bandwidth_size, 10);
    }
}
