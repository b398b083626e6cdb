use super::ManagedResource;
use crate::client::{call, ApiClient};
use crate::error::ProviderError;
use crate::mapper::{redacted, to_payload, wire_key};
use crate::schema::Schema;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A resource that runs one management command and has no server-side
/// identity.
///
/// Create runs the command and stores a random id. Read returns the state
/// unchanged and delete does nothing.
pub struct CommandResource {
    type_name: &'static str,
    command: &'static str,
    schema: Schema,
    rerun_on_update: bool,
    local_attributes: &'static [&'static str],
}

impl CommandResource {
    /// A command resource whose `schema` describes the command's arguments.
    pub fn new(type_name: &'static str, command: &'static str, schema: Schema) -> Self {
        Self {
            type_name,
            command,
            schema,
            rerun_on_update: false,
            local_attributes: &[],
        }
    }

    /// Run the command again on update instead of requiring replacement.
    pub fn rerun_on_update(mut self) -> Self {
        self.rerun_on_update = true;
        self
    }

    /// Attributes kept in state but never sent to the server.
    pub fn with_local_attributes(mut self, names: &'static [&'static str]) -> Self {
        self.local_attributes = names;
        self
    }

    /// The command this resource runs.
    pub fn command(&self) -> &'static str {
        self.command
    }

    async fn run(
        &self,
        client: &dyn ApiClient,
        mut state: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        let mut payload = to_payload(&self.schema.block, &state);
        for name in self.local_attributes {
            payload.remove(&wire_key(name, None));
        }
        debug!(payload = %redacted(&self.schema.block, &payload), "running command");

        let data = call(client, self.command, payload).await?;
        if self.schema.block.attributes.contains_key("task_id") {
            if let Some(task_id) = task_id(&data) {
                state.insert("task_id".to_string(), Value::String(task_id.to_string()));
            }
        }
        Ok(state)
    }
}

fn task_id(data: &Map<String, Value>) -> Option<&str> {
    data.get("task-id")
        .and_then(Value::as_str)
        .or_else(|| {
            data.get("tasks")
                .and_then(Value::as_array)
                .and_then(|tasks| tasks.first())
                .and_then(|task| task.get("task-id"))
                .and_then(Value::as_str)
        })
}

#[async_trait]
impl ManagedResource for CommandResource {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    #[instrument(skip_all, fields(resource = self.type_name, command = self.command))]
    async fn create(
        &self,
        client: &dyn ApiClient,
        planned: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        let mut state = self.run(client, planned).await?;
        let id = Uuid::new_v4().to_string();
        info!(id = %id, "command completed");
        state.insert("id".to_string(), Value::String(id));
        Ok(state)
    }

    async fn read(
        &self,
        _client: &dyn ApiClient,
        state: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        Ok(state)
    }

    #[instrument(skip_all, fields(resource = self.type_name, command = self.command))]
    async fn update(
        &self,
        client: &dyn ApiClient,
        prior: Map<String, Value>,
        planned: Map<String, Value>,
    ) -> Result<Map<String, Value>, ProviderError> {
        if !self.rerun_on_update {
            return Err(ProviderError::Unimplemented(format!(
                "{} cannot be updated in place",
                self.type_name
            )));
        }
        let mut state = self.run(client, planned).await?;
        if let Some(id) = prior.get("id") {
            state.insert("id".to_string(), id.clone());
        }
        Ok(state)
    }

    async fn delete(
        &self,
        _client: &dyn ApiClient,
        _state: Map<String, Value>,
    ) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_id_from_publish_reply() {
        let data = json!({"task-id": "01234567-89ab"});
        assert_eq!(task_id(data.as_object().unwrap()), Some("01234567-89ab"));
    }

    #[test]
    fn test_task_id_from_show_task_reply() {
        let data = json!({"tasks": [{"task-id": "t-1", "status": "succeeded"}]});
        assert_eq!(task_id(data.as_object().unwrap()), Some("t-1"));
        assert_eq!(task_id(&Map::new()), None);
    }
}
