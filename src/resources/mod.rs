//! Resource and data source definitions.
//!
//! Object resources (hosts, clusters, time objects, permission profiles)
//! map onto the `add-`/`show-`/`set-`/`delete-` command family and are
//! identified by uid. Command resources run a single command and carry a
//! locally generated id.

mod command;
mod data_source;
mod object;

pub mod domain_permissions_profile;
pub mod global_properties;
pub mod host;
pub mod install_software_package;
pub mod publish;
pub mod simple_cluster;
pub mod time;

pub use command::CommandResource;
pub use data_source::{DataSource, DataSourceReader};
pub use object::{ApiObject, ObjectResource};

use crate::client::ApiClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Schema};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Prefix shared by every resource and data source type name.
pub const TYPE_PREFIX: &str = "checkpoint_management_";

/// Flags that change how the server handles a request but are never returned.
pub(crate) const REQUEST_FLAGS: [&str; 2] = ["ignore_warnings", "ignore_errors"];

/// A resource type the provider can manage.
#[async_trait]
pub trait ManagedResource: Send + Sync {
    /// Full type name, e.g. `checkpoint_management_host`.
    fn type_name(&self) -> &'static str;

    /// Resource schema.
    fn schema(&self) -> Schema;

    /// Create the resource from its planned state.
    async fn create(
        &self,
        client: &dyn ApiClient,
        planned: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError>;

    /// Refresh the resource. An empty `id` in the result means it is gone.
    async fn read(
        &self,
        client: &dyn ApiClient,
        state: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError>;

    /// Apply the planned state over the prior one.
    async fn update(
        &self,
        client: &dyn ApiClient,
        prior: Map<String, Value>,
        planned: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError>;

    /// Delete the resource.
    async fn delete(
        &self,
        client: &dyn ApiClient,
        state: Map<String, Value>,
    ) -> Result<(), ProviderError>;

    /// Read an existing object into state by id.
    async fn import(
        &self,
        client: &dyn ApiClient,
        id: &str,
    ) -> Result<Map<String, Value>, ProviderError> {
        let _ = (client, id);
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            self.type_name()
        )))
    }
}

/// Every resource type the provider serves.
pub fn resources() -> Vec<Arc<dyn ManagedResource>> {
    vec![
        Arc::new(ObjectResource::new(host::Host)),
        Arc::new(ObjectResource::new(simple_cluster::SimpleCluster)),
        Arc::new(ObjectResource::new(time::Time)),
        Arc::new(ObjectResource::new(
            domain_permissions_profile::DomainPermissionsProfile,
        )),
        Arc::new(global_properties::resource()),
        Arc::new(install_software_package::resource()),
        Arc::new(publish::resource()),
    ]
}

/// Every data source type the provider serves.
pub fn data_sources() -> Vec<Arc<dyn DataSourceReader>> {
    vec![
        Arc::new(DataSource::new(host::Host)),
        Arc::new(DataSource::new(simple_cluster::SimpleCluster)),
        Arc::new(DataSource::new(time::Time)),
        Arc::new(DataSource::new(
            domain_permissions_profile::DomainPermissionsProfile,
        )),
    ]
}

// ============================================================================
// Shared schema pieces
// ============================================================================

/// `color` with the server's default.
pub(crate) fn color() -> Attribute {
    Attribute::optional_string()
        .with_description("Color of the object.")
        .with_default("black")
}

/// `tags`, `comments`, `color` and the request flags every object carries.
pub(crate) fn common_object_fields(schema: Schema) -> Schema {
    schema
        .with_attribute(
            "tags",
            Attribute::string_set().with_description("Collection of tag identifiers."),
        )
        .with_attribute("color", color())
        .with_attribute("comments", Attribute::optional_string())
        .with_attribute(
            "ignore_warnings",
            Attribute::optional_bool()
                .with_description("Apply changes ignoring warnings.")
                .with_default(false),
        )
        .with_attribute(
            "ignore_errors",
            Attribute::optional_bool()
                .with_description("Apply changes ignoring errors.")
                .with_default(false),
        )
}

/// A block of optional boolean attributes.
pub(crate) fn bool_block(names: &[&str]) -> Block {
    names.iter().fold(Block::new(), |block, name| {
        block.with_attribute(*name, Attribute::optional_bool())
    })
}

/// A block of optional string attributes.
pub(crate) fn string_block(names: &[&str]) -> Block {
    names.iter().fold(Block::new(), |block, name| {
        block.with_attribute(*name, Attribute::optional_string())
    })
}

/// The non-empty `id` of a state, if any.
pub(crate) fn state_id(state: &Map<String, Value>) -> Option<&str> {
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// The state of an object that no longer exists.
pub(crate) fn gone() -> Map<String, Value> {
    let mut state = Map::new();
    state.insert("id".to_string(), Value::String(String::new()));
    state
}
