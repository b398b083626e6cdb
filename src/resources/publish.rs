//! `checkpoint_management_publish`: publishes the session's changes.
//!
//! `triggers` is never sent; changing it publishes again.

use super::CommandResource;
use crate::schema::{Attribute, Schema};

fn schema() -> Schema {
    Schema::v0()
        .with_id()
        .with_attribute(
            "triggers",
            Attribute::string_set()
                .with_description("Changes to this set cause a new publish.")
                .with_force_new(),
        )
        .with_attribute(
            "task_id",
            Attribute::computed_string().with_description("Publish task id."),
        )
}

/// The publish command resource.
pub fn resource() -> CommandResource {
    CommandResource::new("checkpoint_management_publish", "publish", schema())
        .with_local_attributes(&["triggers"])
}
