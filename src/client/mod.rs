//! Management API client.
//!
//! Every provider hook talks to the management server through one call:
//! a command name (`add-host`, `show-simple-cluster`, `publish`, ...) and a
//! JSON payload, answered by an [`ApiResponse`]. [`ApiClient`] is the seam
//! that lets tests script the server; [`ManagementClient`] is the HTTPS
//! implementation.

mod http;

pub use http::{Credentials, LoginResponse, ManagementClient};

use crate::error::ProviderError;
use serde_json::{Map, Value};

/// Error code the management API returns for a missing object.
pub const OBJECT_NOT_FOUND_CODE: &str = "generic_err_object_not_found";

/// The outcome of a single management API command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiResponse {
    /// Whether the server accepted the command.
    pub success: bool,
    /// Error message assembled from the server's reply when `success` is false.
    pub error_msg: String,
    /// The reply body.
    pub data: Map<String, Value>,
}

impl ApiResponse {
    /// A successful reply carrying `data` (non-object values yield an empty map).
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            error_msg: String::new(),
            data: into_map(data),
        }
    }

    /// A failed reply with a vendor error code and message.
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        let mut data = Map::new();
        data.insert("code".to_string(), Value::String(code));
        data.insert("message".to_string(), Value::String(message.clone()));
        Self {
            success: false,
            error_msg: message,
            data,
        }
    }

    /// The vendor error code, if the reply carries one.
    pub fn code(&self) -> Option<&str> {
        self.data.get("code").and_then(Value::as_str)
    }

    /// Whether the reply reports a missing object.
    pub fn is_object_not_found(&self) -> bool {
        !self.success && self.code() == Some(OBJECT_NOT_FOUND_CODE)
    }

    /// Turn a failed reply into [`ProviderError::Api`], passing the message through.
    pub fn into_result(self) -> Result<Map<String, Value>, ProviderError> {
        if self.success {
            Ok(self.data)
        } else {
            let code = self.code().map(str::to_string);
            Err(ProviderError::api(code, self.error_msg))
        }
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// A connection able to run management API commands.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    /// Run one command.
    ///
    /// Transport failures are returned as `Err`; commands the server
    /// rejected come back as `Ok` with `success == false`.
    async fn api_call(
        &self,
        command: &str,
        payload: Map<String, Value>,
    ) -> Result<ApiResponse, ProviderError>;

    /// End the session. Clients without a session do nothing.
    async fn logout(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Run a command and fail on any rejection.
pub async fn call(
    client: &dyn ApiClient,
    command: &str,
    payload: Map<String, Value>,
) -> Result<Map<String, Value>, ProviderError> {
    client.api_call(command, payload).await?.into_result()
}
