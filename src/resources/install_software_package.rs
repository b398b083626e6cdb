//! `checkpoint_management_install_software_package`: installs a software
//! package on gateways. Any change means running the installation again.

use super::CommandResource;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};

fn schema() -> Schema {
    let cluster_installation_settings = Block::new()
        .with_attribute(
            "cluster_delay",
            Attribute::optional_int64()
                .with_description("Minutes to wait between members.")
                .with_force_new(),
        )
        .with_attribute(
            "cluster_strategy",
            Attribute::optional_string()
                .with_description("Cluster installation strategy.")
                .with_force_new(),
        );

    Schema::v0()
        .with_id()
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_description("Package name.")
                .with_force_new(),
        )
        .with_attribute(
            "targets",
            Attribute::new(
                AttributeType::set(AttributeType::String),
                AttributeFlags::required(),
            )
            .with_description("Gateways to install the package on.")
            .with_force_new(),
        )
        .with_attribute(
            "concurrency_limit",
            Attribute::optional_int64()
                .with_description("Number of gateways installed in parallel.")
                .with_force_new(),
        )
        .with_attribute(
            "task_id",
            Attribute::computed_string().with_description("Installation task id."),
        )
        .with_block(
            "cluster_installation_settings",
            NestedBlock::single(cluster_installation_settings).with_force_new(),
        )
}

/// The software package installation command resource.
pub fn resource() -> CommandResource {
    CommandResource::new(
        "checkpoint_management_install_software_package",
        "install-software-package",
        schema(),
    )
}
