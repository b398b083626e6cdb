use super::ApiObject;
use crate::client::ApiClient;
use crate::error::ProviderError;
use crate::mapper::{to_state, ReadMode};
use crate::schema::{Attribute, Schema};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::instrument;

/// A data source type the provider can read.
#[async_trait]
pub trait DataSourceReader: Send + Sync {
    /// Full type name, e.g. `checkpoint_management_data_host`.
    fn type_name(&self) -> &'static str;

    /// Data source schema.
    fn schema(&self) -> Schema;

    /// Look the object up and return every field the server reports.
    async fn read(
        &self,
        client: &dyn ApiClient,
        config: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError>;
}

/// Lookup of an [`ApiObject`] by `name` or `uid`.
pub struct DataSource<T> {
    object: T,
    schema: Schema,
}

impl<T: ApiObject> DataSource<T> {
    /// Wrap an object type.
    pub fn new(object: T) -> Self {
        let resource = object.schema();
        let schema = Schema {
            version: resource.version,
            block: resource.block.into_computed(&["name"]),
        }
        .with_attribute(
            "uid",
            Attribute::optional_string().with_description("Object unique identifier."),
        );
        Self { object, schema }
    }
}

#[async_trait]
impl<T: ApiObject> DataSourceReader for DataSource<T> {
    fn type_name(&self) -> &'static str {
        self.object.data_source_name()
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    #[instrument(skip_all, fields(data_source = self.object.data_source_name()))]
    async fn read(
        &self,
        client: &dyn ApiClient,
        config: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        let mut payload = Map::new();
        for key in ["uid", "name"] {
            if let Some(value) = config.get(key).filter(|v| v.as_str().is_some_and(|s| !s.is_empty())) {
                payload.insert(key.to_string(), value.clone());
                break;
            }
        }
        if payload.is_empty() {
            return Err(ProviderError::Validation(format!(
                "{} requires either name or uid",
                self.object.data_source_name()
            )));
        }

        let data = self.object.show(client, payload).await?.into_result()?;
        let mut state = config;
        state.extend(to_state(&self.schema.block, &data, &Map::new(), ReadMode::DataSource));
        if let Some(uid) = data.get("uid").filter(|v| v.is_string()) {
            state.insert("uid".to_string(), uid.clone());
            state.insert("id".to_string(), uid.clone());
        }
        Ok(state)
    }
}
