//! `checkpoint_management_host`: a network host object.

use super::{bool_block, color, common_object_fields, ApiObject};
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use serde_json::json;

/// Host objects.
pub struct Host;

impl ApiObject for Host {
    fn object(&self) -> &'static str {
        "host"
    }

    fn type_name(&self) -> &'static str {
        "checkpoint_management_host"
    }

    fn data_source_name(&self) -> &'static str {
        "checkpoint_management_data_host"
    }

    fn schema(&self) -> Schema {
        let interface = Block::new()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("subnet4", Attribute::optional_string())
            .with_attribute("subnet6", Attribute::optional_string())
            .with_attribute("mask_length4", Attribute::optional_int64())
            .with_attribute("mask_length6", Attribute::optional_int64())
            .with_attribute("color", color())
            .with_attribute("comments", Attribute::optional_string());

        let nat_settings = Block::new()
            .with_attribute(
                "auto_rule",
                Attribute::optional_bool().with_description("Whether to add automatic address translation rules."),
            )
            .with_attribute(
                "hide_behind",
                Attribute::optional_string().with_description("Hide behind method: gateway or ip-address."),
            )
            .with_attribute("install_on", Attribute::optional_string())
            .with_attribute("ip_address", Attribute::optional_string())
            .with_attribute("ipv4_address", Attribute::optional_string())
            .with_attribute("ipv6_address", Attribute::optional_string())
            .with_attribute(
                "method",
                Attribute::optional_string().with_description("NAT translation method: hide or static."),
            );

        let web_server_config = Block::new()
            .with_attribute("additional_ports", Attribute::string_set())
            .with_attribute("application_engines", Attribute::string_set())
            .with_attribute("listen_standard_port", Attribute::optional_bool())
            .with_attribute("operating_system", Attribute::optional_string())
            .with_attribute("protected_by", Attribute::optional_string());

        let host_servers = bool_block(&["dns_server", "mail_server", "web_server"])
            .with_block("web_server_config", NestedBlock::single(web_server_config));

        let schema = Schema::v0()
            .with_id()
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Object name. Should be unique in the domain."),
            )
            .with_attribute("ipv4_address", Attribute::optional_string())
            .with_attribute("ipv6_address", Attribute::optional_string())
            .with_attribute(
                "groups",
                Attribute::string_set().with_description("Collection of group identifiers."),
            )
            .with_block("interfaces", NestedBlock::list(interface))
            .with_block(
                "nat_settings",
                NestedBlock::single(nat_settings).with_default(json!({"auto_rule": false})),
            )
            .with_block(
                "host_servers",
                NestedBlock::single(host_servers).with_default(json!({
                    "dns_server": false,
                    "mail_server": false,
                    "web_server": false
                })),
            );

        common_object_fields(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::to_payload;
    use crate::schema::BlockNestingMode;

    #[test]
    fn test_host_schema_shape() {
        let schema = Host.schema();
        assert!(schema.block.attributes["name"].flags.required);
        assert_eq!(
            schema.block.attributes["color"].default,
            Some(json!("black"))
        );
        assert_eq!(
            schema.block.blocks["nat_settings"].nesting_mode,
            BlockNestingMode::Single
        );
        assert_eq!(
            schema.block.blocks["interfaces"].nesting_mode,
            BlockNestingMode::List
        );
    }

    #[test]
    fn test_host_payload_nests_server_config() {
        let schema = Host.schema();
        let state = json!({
            "name": "web1",
            "host_servers": [{
                "web_server": true,
                "web_server_config": [{"listen_standard_port": false, "protected_by": "gw1"}]
            }]
        });

        let payload = to_payload(&schema.block, state.as_object().unwrap());
        assert_eq!(
            payload["host-servers"],
            json!({
                "web-server": true,
                "web-server-config": {"listen-standard-port": false, "protected-by": "gw1"}
            })
        );
    }
}
