use super::{gone, state_id, ManagedResource, REQUEST_FLAGS};
use crate::client::{call, ApiClient, ApiResponse};
use crate::error::ProviderError;
use crate::mapper::{apply_read, changed_payload, redacted, to_payload};
use crate::schema::Schema;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

/// A management object type served by the `add-`/`show-`/`set-`/`delete-`
/// command family.
#[async_trait]
pub trait ApiObject: Send + Sync + 'static {
    /// API object name, e.g. `host` or `simple-cluster`.
    fn object(&self) -> &'static str;

    /// Resource type name.
    fn type_name(&self) -> &'static str;

    /// Data source type name.
    fn data_source_name(&self) -> &'static str;

    /// Resource schema, including `id`.
    fn schema(&self) -> Schema;

    /// Run `show-<object>` and return the reply in the shape the schema
    /// expects.
    async fn show(
        &self,
        client: &dyn ApiClient,
        payload: Map<String, Value>,
    ) -> Result<ApiResponse, ProviderError> {
        client
            .api_call(&format!("show-{}", self.object()), payload)
            .await
    }
}

/// CRUD over an [`ApiObject`], keyed by uid.
pub struct ObjectResource<T> {
    object: T,
    schema: Schema,
}

impl<T: ApiObject> ObjectResource<T> {
    /// Wrap an object type.
    pub fn new(object: T) -> Self {
        let schema = object.schema();
        Self { object, schema }
    }

    fn command(&self, verb: &str) -> String {
        format!("{}-{}", verb, self.object.object())
    }

    fn uid_payload(uid: &str) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("uid".to_string(), Value::String(uid.to_string()));
        payload
    }

    fn require_id(&self, state: &Map<String, Value>) -> Result<String, ProviderError> {
        state_id(state).map(str::to_string).ok_or_else(|| {
            ProviderError::InvalidRequest(format!("{} state has no id", self.object.type_name()))
        })
    }
}

/// Copy request flags the user set into a payload.
fn with_request_flags(
    mut payload: Map<String, Value>,
    planned: &Map<String, Value>,
) -> Map<String, Value> {
    for flag in REQUEST_FLAGS {
        if let Some(value) = planned.get(flag).filter(|v| v.as_bool() == Some(true)) {
            payload.insert(flag.replace('_', "-"), value.clone());
        }
    }
    payload
}

#[async_trait]
impl<T: ApiObject> ManagedResource for ObjectResource<T> {
    fn type_name(&self) -> &'static str {
        self.object.type_name()
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    #[instrument(skip_all, fields(resource = self.object.type_name()))]
    async fn create(
        &self,
        client: &dyn ApiClient,
        planned: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        let payload = to_payload(&self.schema.block, &planned);
        debug!(payload = %redacted(&self.schema.block, &payload), "adding object");

        let data = call(client, &self.command("add"), payload).await?;
        let uid = data
            .get("uid")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::api(None, format!("{} reply carries no uid", self.command("add")))
            })?
            .to_string();
        info!(uid = %uid, "created object");

        let mut state = planned;
        state.insert("id".to_string(), Value::String(uid.clone()));
        let state = self.read(client, state).await?;
        if state_id(&state).is_none() {
            return Err(ProviderError::NotFound(format!(
                "{} with uid {} vanished right after it was created",
                self.object.object(),
                uid
            )));
        }
        Ok(state)
    }

    #[instrument(skip_all, fields(resource = self.object.type_name()))]
    async fn read(
        &self,
        client: &dyn ApiClient,
        state: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        let Some(uid) = state_id(&state).map(str::to_string) else {
            return Ok(gone());
        };

        let response = self.object.show(client, Self::uid_payload(&uid)).await?;
        if response.is_object_not_found() {
            warn!(uid = %uid, "object no longer exists, removing from state");
            return Ok(gone());
        }
        let data = response.into_result()?;

        let mut refreshed = apply_read(&self.schema.block, &state, &data);
        refreshed.insert("id".to_string(), Value::String(uid));
        Ok(refreshed)
    }

    #[instrument(skip_all, fields(resource = self.object.type_name()))]
    async fn update(
        &self,
        client: &dyn ApiClient,
        prior: Map<String, Value>,
        planned: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        let uid = self.require_id(&prior)?;
        let payload = changed_payload(&self.schema.block, &prior, &planned);

        if payload.is_empty() {
            debug!(uid = %uid, "nothing to update");
        } else {
            let mut payload = with_request_flags(payload, &planned);
            payload.insert("uid".to_string(), Value::String(uid.clone()));
            debug!(payload = %redacted(&self.schema.block, &payload), "setting object");
            call(client, &self.command("set"), payload).await?;
        }

        let mut state = planned;
        state.insert("id".to_string(), Value::String(uid));
        self.read(client, state).await
    }

    #[instrument(skip_all, fields(resource = self.object.type_name()))]
    async fn delete(
        &self,
        client: &dyn ApiClient,
        state: Map<String, Value>,
    ) -> Result<(), ProviderError> {
        let Some(uid) = state_id(&state) else {
            return Ok(());
        };

        let payload = with_request_flags(Self::uid_payload(uid), &state);
        let response = client.api_call(&self.command("delete"), payload).await?;
        if response.is_object_not_found() {
            warn!(uid = %uid, "object already deleted");
            return Ok(());
        }
        response.into_result()?;
        info!(uid = %uid, "deleted object");
        Ok(())
    }

    async fn import(
        &self,
        client: &dyn ApiClient,
        id: &str,
    ) -> Result<Map<String, Value>, ProviderError> {
        let mut seed = Map::new();
        seed.insert("id".to_string(), Value::String(id.to_string()));
        let state = self.read(client, seed).await?;
        if state_id(&state).is_none() {
            return Err(ProviderError::NotFound(format!(
                "{} with uid {}",
                self.object.object(),
                id
            )));
        }
        Ok(state)
    }
}
