//! `checkpoint_management_set_global_properties`: runs
//! `set-global-properties`, again on every update.

use super::{bool_block, string_block, CommandResource};
use crate::schema::{Attribute, NestedBlock, Schema};

fn schema() -> Schema {
    let firewall = bool_block(&[
        "accept_control_connections",
        "accept_ips1_management_connections",
        "accept_remote_access_control_connections",
        "accept_smart_update_connections",
        "accept_outgoing_packets_originating_from_gw",
        "accept_outgoing_packets_originating_from_connectra_gw",
        "accept_rip",
        "accept_domain_name_over_tcp",
        "accept_domain_name_over_udp",
        "accept_icmp_requests",
        "accept_identity_awareness_control_connections",
        "log_implied_rules",
    ])
    .with_attribute(
        "accept_outgoing_packets_originating_from_gw_position",
        Attribute::optional_string().with_description("first, last or before last."),
    )
    .with_attribute(
        "accept_control_connections_position",
        Attribute::optional_string(),
    );

    let nat = bool_block(&[
        "allow_bi_directional",
        "auto_arp_conf",
        "merge_manual_proxy_arp_conf",
        "auto_translate_dest_on_client_side",
        "manually_translate_dest_on_client_side",
        "enable_ip_pool_nat",
    ])
    .with_attribute("addr_alloc_and_release_track", Attribute::optional_string())
    .with_attribute("addr_exhaustion_track", Attribute::optional_string());

    let stateful_inspection = [
        "tcp_start_timeout",
        "tcp_session_timeout",
        "tcp_end_timeout",
        "udp_virtual_session_timeout",
        "icmp_virtual_session_timeout",
        "other_ip_protocols_virtual_session_timeout",
    ]
    .iter()
    .fold(
        bool_block(&[
            "drop_out_of_state_tcp_packets",
            "log_on_drop_out_of_state_tcp_packets",
            "drop_out_of_state_icmp_packets",
            "log_on_drop_out_of_state_icmp_packets",
        ]),
        |block, name| block.with_attribute(*name, Attribute::optional_int64()),
    );

    let log_and_alert = string_block(&[
        "administrative_notifications",
        "connection_matched_by_sam",
        "dynamic_object_resolution_failure",
        "ip_options_drop",
        "packet_is_incorrectly_tagged",
        "packet_tagging_brute_force_attack",
        "sla_violation",
        "vpn_conf_and_key_exchange_errors",
        "vpn_packet_handling_error",
        "vpn_successful_key_exchange",
    ]);

    let user_accounts = string_block(&["expiration_date_method", "expiration_date"])
        .with_attribute("days_until_expiration", Attribute::optional_int64())
        .with_attribute(
            "show_accounts_expiration_indication_days",
            Attribute::optional_bool(),
        )
        .with_attribute(
            "expiration_date_indication_days",
            Attribute::optional_int64(),
        );

    Schema::v0()
        .with_id()
        .with_block("firewall", NestedBlock::single(firewall))
        .with_block("nat", NestedBlock::single(nat))
        .with_block(
            "stateful_inspection",
            NestedBlock::single(stateful_inspection),
        )
        .with_block("log_and_alert", NestedBlock::single(log_and_alert))
        .with_block("user_accounts", NestedBlock::single(user_accounts))
}

/// The global properties command resource.
pub fn resource() -> CommandResource {
    CommandResource::new(
        "checkpoint_management_set_global_properties",
        "set-global-properties",
        schema(),
    )
    .rerun_on_update()
}
