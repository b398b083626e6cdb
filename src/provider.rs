//! The Check Point Management provider.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::client::{ApiClient, ManagementClient};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::resources::{self, DataSourceReader, ManagedResource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Provider for Check Point Security Management objects.
pub struct CheckpointProvider {
    resources: HashMap<&'static str, Arc<dyn ManagedResource>>,
    data_sources: HashMap<&'static str, Arc<dyn DataSourceReader>>,
    client: RwLock<Option<Arc<dyn ApiClient>>>,
}

impl CheckpointProvider {
    /// A provider that connects on [`ProviderService::configure`].
    pub fn new() -> Self {
        Self {
            resources: resources::resources()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: resources::data_sources()
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
            client: RwLock::new(None),
        }
    }

    /// A provider already bound to `client`.
    pub fn with_client(client: Arc<dyn ApiClient>) -> Self {
        let provider = Self::new();
        Self {
            client: RwLock::new(Some(client)),
            ..provider
        }
    }

    fn resource(&self, resource_type: &str) -> Result<&Arc<dyn ManagedResource>, ProviderError> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(
        &self,
        data_source_type: &str,
    ) -> Result<&Arc<dyn DataSourceReader>, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    async fn client(&self) -> Result<Arc<dyn ApiClient>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider is not configured".to_string())
        })
    }

    fn config_diagnostics(config: Value) -> Result<(ProviderConfig, Vec<Diagnostic>), ProviderError> {
        let config = ProviderConfig::from_value(config)?.with_env();
        let diagnostics = config.validate();
        Ok((config, diagnostics))
    }
}

impl Default for CheckpointProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn into_object(value: Value, what: &str) -> Result<Map<String, Value>, ProviderError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ProviderError::InvalidRequest(format!(
            "{} must be an object, got {}",
            what, other
        ))),
    }
}

#[async_trait::async_trait]
impl ProviderService for CheckpointProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = self
            .resources
            .values()
            .fold(ProviderSchema::new(), |schema, resource| {
                schema.with_resource(resource.type_name(), resource.schema())
            });
        self.data_sources
            .values()
            .fold(schema, |schema, data_source| {
                schema.with_data_source(data_source.type_name(), data_source.schema())
            })
            .with_provider_config(ProviderConfig::schema())
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        let (_, config_diagnostics) = Self::config_diagnostics(config)?;
        diagnostics.extend(config_diagnostics);
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let (config, diagnostics) = Self::config_diagnostics(config)?;
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        debug!(config = ?config, "connecting to management server");
        let client = ManagementClient::connect(&config).await?;
        *self.client.write().await = Some(Arc::new(client));
        info!(server = config.server.as_deref().unwrap_or_default(), "provider configured");
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        let client = self.client.write().await.take();
        if let Some(client) = client {
            client.logout().await?;
        }
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(validation::validate(&resource.schema(), &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        // A prior state with an empty id describes an object that is gone.
        let prior = prior_state.filter(|state| {
            state
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| !id.is_empty())
        });
        Ok(PlanResult::compute(
            &resource.schema().block,
            prior.as_ref(),
            &proposed_state,
        ))
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let planned = into_object(planned_state, "planned state")?;
        let state = resource.create(client.as_ref(), planned).await?;
        Ok(Value::Object(state))
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = into_object(current_state, "current state")?;
        let state = resource.read(client.as_ref(), state).await?;
        Ok(Value::Object(state))
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let prior = into_object(prior_state, "prior state")?;
        let planned = into_object(planned_state, "planned state")?;
        let state = resource.update(client.as_ref(), prior, planned).await?;
        Ok(Value::Object(state))
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = into_object(current_state, "current state")?;
        resource.delete(client.as_ref(), state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = resource.import(client.as_ref(), id).await?;
        Ok(vec![ImportedResource::new(resource_type, Value::Object(state))])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let mut diagnostics = validation::validate(&data_source.schema(), &config);
        let has_key = ["name", "uid"]
            .iter()
            .any(|key| config.get(key).and_then(Value::as_str).is_some_and(|s| !s.is_empty()));
        if !has_key {
            diagnostics.push(Diagnostic::error("Either name or uid must be set"));
        }
        Ok(diagnostics)
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client().await?;
        let config = into_object(config, "data source configuration")?;
        let state = data_source.read(client.as_ref(), config).await?;
        Ok(Value::Object(state))
    }
}
