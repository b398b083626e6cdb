//! `checkpoint_management_simple_cluster`: a ClusterXL gateway cluster.
//!
//! `show-simple-cluster` pages the cluster's interfaces: the reply carries
//! `interfaces: {objects, total, from, to}` and at most
//! [`INTERFACES_PAGE_LIMIT`] objects. When `total` exceeds the page the
//! cluster is shown again with `limit-interfaces` set to the total.

use super::{color, common_object_fields, ApiObject};
use crate::client::{ApiClient, ApiResponse};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

/// Number of interfaces `show-simple-cluster` returns by default.
pub const INTERFACES_PAGE_LIMIT: u64 = 50;

/// Simple cluster objects.
pub struct SimpleCluster;

fn interface_block() -> Block {
    let anti_spoofing_settings = Block::new().with_attribute(
        "action",
        Attribute::optional_string().with_description("prevent or detect."),
    );
    let topology_settings = Block::new()
        .with_attribute("interface_leads_to_dmz", Attribute::optional_bool())
        .with_attribute("ip_address_behind_this_interface", Attribute::optional_string())
        .with_attribute("specific_network", Attribute::optional_string());

    Block::new()
        .with_attribute("name", Attribute::required_string())
        .with_attribute("interface_type", Attribute::optional_string())
        .with_attribute("ipv4_address", Attribute::optional_string())
        .with_attribute("ipv4_mask_length", Attribute::optional_int64())
        .with_attribute("ipv4_network_mask", Attribute::optional_string())
        .with_attribute("ipv6_address", Attribute::optional_string())
        .with_attribute("ipv6_mask_length", Attribute::optional_int64())
        .with_attribute("anti_spoofing", Attribute::optional_bool())
        .with_attribute(
            "topology",
            Attribute::optional_string().with_description("external, internal or internal-and-external."),
        )
        .with_attribute("color", color())
        .with_attribute("comments", Attribute::optional_string())
        .with_block(
            "anti_spoofing_settings",
            NestedBlock::single(anti_spoofing_settings),
        )
        .with_block("topology_settings", NestedBlock::single(topology_settings))
}

fn member_block() -> Block {
    let member_interface = Block::new()
        .with_attribute("name", Attribute::required_string())
        .with_attribute("ipv4_address", Attribute::optional_string())
        .with_attribute("ipv4_mask_length", Attribute::optional_int64())
        .with_attribute("ipv4_network_mask", Attribute::optional_string())
        .with_attribute("ipv6_address", Attribute::optional_string())
        .with_attribute("ipv6_mask_length", Attribute::optional_int64());

    Block::new()
        .with_attribute("name", Attribute::required_string())
        .with_attribute("ip_address", Attribute::optional_string())
        .with_attribute(
            "one_time_password",
            Attribute::optional_string()
                .sensitive()
                .with_description("SIC one-time password."),
        )
        .with_block("interfaces", NestedBlock::list(member_interface))
}

#[async_trait]
impl ApiObject for SimpleCluster {
    fn object(&self) -> &'static str {
        "simple-cluster"
    }

    fn type_name(&self) -> &'static str {
        "checkpoint_management_simple_cluster"
    }

    fn data_source_name(&self) -> &'static str {
        "checkpoint_management_data_simple_cluster"
    }

    fn schema(&self) -> Schema {
        let schema = Schema::v0()
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("ipv4_address", Attribute::optional_string())
            .with_attribute("ipv6_address", Attribute::optional_string())
            .with_attribute(
                "cluster_mode",
                Attribute::optional_string()
                    .with_description("cluster-xl-ha, cluster-ls-multicast or cluster-ls-unicast."),
            )
            .with_attribute(
                "hardware",
                Attribute::optional_string().with_default("Open server"),
            )
            .with_attribute("os_name", Attribute::optional_string().with_default("Gaia"))
            .with_attribute("version", Attribute::optional_string())
            .with_attribute("firewall", Attribute::optional_bool())
            .with_attribute("vpn", Attribute::optional_bool())
            .with_attribute("send_logs_to_server", Attribute::string_set())
            .with_attribute("send_alerts_to_server", Attribute::string_set())
            .with_attribute("save_logs_locally", Attribute::optional_bool())
            .with_block("interfaces", NestedBlock::list(interface_block()))
            .with_block("members", NestedBlock::list(member_block()));

        common_object_fields(schema)
    }

    async fn show(
        &self,
        client: &dyn ApiClient,
        payload: Map<String, Value>,
    ) -> Result<ApiResponse, ProviderError> {
        let response = client
            .api_call("show-simple-cluster", payload.clone())
            .await?;
        if !response.success {
            return Ok(response);
        }

        let total = interfaces_total(&response.data);
        let mut response = if total > INTERFACES_PAGE_LIMIT {
            debug!(total, "re-reading cluster with every interface");
            let mut payload = payload;
            payload.insert("limit-interfaces".to_string(), Value::from(total));
            let full = client.api_call("show-simple-cluster", payload).await?;
            if !full.success {
                return Ok(full);
            }
            full
        } else {
            response
        };

        normalize(&mut response.data);
        Ok(response)
    }
}

fn interfaces_total(data: &Map<String, Value>) -> u64 {
    data.get("interfaces")
        .and_then(|interfaces| interfaces.get("total"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Reshape a `show-simple-cluster` reply into the fields `add-simple-cluster`
/// accepts.
fn normalize(data: &mut Map<String, Value>) {
    if let Some(Value::Object(page)) = data.get("interfaces") {
        let objects = page.get("objects").cloned().unwrap_or(Value::Array(Vec::new()));
        data.insert("interfaces".to_string(), objects);
    }
    if !data.contains_key("members") {
        if let Some(members) = data.remove("cluster-members") {
            data.insert("members".to_string(), members);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interfaces_total() {
        let data = json!({"interfaces": {"objects": [], "total": 51, "from": 1, "to": 50}});
        assert_eq!(interfaces_total(data.as_object().unwrap()), 51);
        assert_eq!(interfaces_total(&Map::new()), 0);
    }

    #[test]
    fn test_normalize_unwraps_interface_page() {
        let mut data = json!({
            "interfaces": {
                "objects": [{"name": "eth0", "ipv4-address": "10.0.0.1"}],
                "total": 1,
                "from": 1,
                "to": 1
            },
            "cluster-members": [{"name": "member1", "ip-address": "10.0.0.2"}]
        })
        .as_object()
        .cloned()
        .unwrap();

        normalize(&mut data);
        assert_eq!(
            data["interfaces"],
            json!([{"name": "eth0", "ipv4-address": "10.0.0.1"}])
        );
        assert_eq!(
            data["members"],
            json!([{"name": "member1", "ip-address": "10.0.0.2"}])
        );
        assert!(!data.contains_key("cluster-members"));
    }
}
