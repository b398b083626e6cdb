//! `checkpoint_management_domain_permissions_profile`: an administrator
//! permission profile.

use super::{bool_block, common_object_fields, ApiObject};
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// Domain permission profiles.
pub struct DomainPermissionsProfile;

/// Access level values accepted by string permission fields.
const ACCESS_LEVEL: &str = "disabled, read or write.";

fn access_level(block: Block, names: &[&str]) -> Block {
    names.iter().fold(block, |block, name| {
        block.with_attribute(*name, Attribute::optional_string().with_description(ACCESS_LEVEL))
    })
}

impl ApiObject for DomainPermissionsProfile {
    fn object(&self) -> &'static str {
        "domain-permissions-profile"
    }

    fn type_name(&self) -> &'static str {
        "checkpoint_management_domain_permissions_profile"
    }

    fn data_source_name(&self) -> &'static str {
        "checkpoint_management_data_domain_permissions_profile"
    }

    fn schema(&self) -> Schema {
        let access_control = access_level(
            bool_block(&[
                "show_policy",
                "app_control_and_url_filtering_update",
                "install_policy",
            ]),
            &["policy_layers", "edit_layers"],
        );

        let endpoint = bool_block(&[
            "manage_policies_and_software_deployment",
            "edit_endpoint_policies",
            "policies_installation",
            "edit_software_deployment",
            "software_deployment_installation",
            "allow_executing_push_operations",
            "authorize_preboot_users",
            "recovery_media",
            "remote_help",
            "reset_computer_data",
        ]);

        let events_and_reports = access_level(
            bool_block(&["events", "policy", "reports"]),
            &["smart_event"],
        );

        let gateways = access_level(
            bool_block(&[
                "vsx_provisioning",
                "system_backup",
                "system_restore",
                "open_shell",
                "run_one_time_script",
                "run_repository_script",
            ]),
            &[
                "smart_update",
                "lsm_gw_db",
                "manage_provisioning_profiles",
                "manage_repository_scripts",
            ],
        );

        let management = access_level(
            bool_block(&[
                "manage_admins",
                "manage_sessions",
                "high_availability_operations",
                "approve_or_reject_sessions",
                "publish_sessions",
                "manage_integration_with_cloud_services",
            ]),
            &["cme_operations"],
        )
        .with_attribute(
            "management_api_login",
            Attribute::optional_bool().with_default(true),
        );

        let monitoring_and_logging = access_level(
            bool_block(&[
                "monitoring",
                "app_and_url_filtering_logs",
                "https_inspection_logs",
                "packet_capture_and_forensics",
                "show_packet_capture_by_default",
                "identities",
                "show_identities_by_default",
                "dlp_logs_including_confidential_fields",
                "manage_dlp_messages",
            ]),
            &["management_logs", "track_logs"],
        );

        let threat_prevention = access_level(
            bool_block(&["edit_settings", "ips_update"]),
            &["policy_layers", "edit_layers", "profiles"],
        );

        let schema = Schema::v0()
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "permission_type",
                Attribute::optional_string()
                    .with_description("read write all, read only all or customized.")
                    .with_default("customized"),
            )
            .with_attribute(
                "edit_common_objects",
                Attribute::optional_bool().with_default(true),
            )
            .with_attribute(
                "view_global_objects_in_detail",
                Attribute::optional_bool().with_default(true),
            )
            .with_block("access_control", NestedBlock::single(access_control))
            .with_block("endpoint", NestedBlock::single(endpoint))
            .with_block("events_and_reports", NestedBlock::single(events_and_reports))
            .with_block("gateways", NestedBlock::single(gateways))
            .with_block("management", NestedBlock::single(management))
            .with_block(
                "monitoring_and_logging",
                NestedBlock::single(monitoring_and_logging),
            )
            .with_block("threat_prevention", NestedBlock::single(threat_prevention));

        common_object_fields(schema)
    }
}
