//! HTTPS client for the Check Point Management web API.
//!
//! Each command is a `POST <base_url>/<command>` with a JSON body. After
//! `login`, the session id travels in the `X-chkp-sid` header. Commands that
//! start a background task (`publish`, `install-software-package`) are
//! awaited by polling `show-task`.

use super::{ApiClient, ApiResponse};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

const SID_HEADER: &str = "X-chkp-sid";

/// Login credentials and session settings.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Administrator name.
    pub username: Option<String>,
    /// Administrator password.
    pub password: Option<String>,
    /// API key, preferred over username/password when set.
    pub api_key: Option<String>,
    /// Domain to log into.
    pub domain: Option<String>,
    /// Session name.
    pub session_name: Option<String>,
    /// Session description.
    pub session_description: Option<String>,
    /// Session timeout in seconds.
    pub session_timeout: Option<u64>,
}

impl Credentials {
    /// Take the credentials out of a provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            api_key: config.api_key.clone(),
            domain: config.domain.clone(),
            session_name: config.session_name.clone(),
            session_description: config.session_description.clone(),
            session_timeout: Some(config.session_timeout),
        }
    }

    fn payload(&self) -> Result<Map<String, Value>, ProviderError> {
        let mut payload = Map::new();
        match (&self.api_key, &self.username, &self.password) {
            (Some(key), _, _) => {
                payload.insert("api-key".to_string(), json!(key));
            },
            (None, Some(user), Some(password)) => {
                payload.insert("user".to_string(), json!(user));
                payload.insert("password".to_string(), json!(password));
            },
            _ => {
                return Err(ProviderError::Configuration(
                    "login requires username and password, or api_key".to_string(),
                ))
            },
        }
        if let Some(domain) = &self.domain {
            payload.insert("domain".to_string(), json!(domain));
        }
        if let Some(name) = &self.session_name {
            payload.insert("session-name".to_string(), json!(name));
        }
        if let Some(description) = &self.session_description {
            payload.insert("session-description".to_string(), json!(description));
        }
        if let Some(timeout) = self.session_timeout {
            payload.insert("session-timeout".to_string(), json!(timeout));
        }
        Ok(payload)
    }
}

/// Reply to a successful `login`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoginResponse {
    /// Session id.
    pub sid: String,
    /// Session uid.
    #[serde(default)]
    pub uid: Option<String>,
    /// Version of the API server.
    #[serde(default)]
    pub api_server_version: Option<String>,
    /// Negotiated session timeout.
    #[serde(default)]
    pub session_timeout: Option<u64>,
}

/// Management API client over HTTPS.
pub struct ManagementClient {
    http: Client,
    base_url: String,
    sid: RwLock<Option<String>>,
    poll_interval: Duration,
    task_timeout: Duration,
}

impl ManagementClient {
    /// Build a client for the server described by `config`, without logging in.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.ignore_server_certificate);
        if let Some(proxy) = config.proxy_url() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url(),
            sid: RwLock::new(None),
            poll_interval: config.task_poll_interval(),
            task_timeout: config.task_timeout(),
        })
    }

    /// Build a client for an explicit base URL (e.g. a local mock server).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sid: RwLock::new(None),
            poll_interval: ProviderConfig::default().task_poll_interval(),
            task_timeout: ProviderConfig::default().task_timeout(),
        })
    }

    /// Override the interval between `show-task` polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override how long a background task may run before it is reported
    /// as failed.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Build a client and log in.
    pub async fn connect(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Self::new(config)?;
        client.login(&Credentials::from_config(config)).await?;
        Ok(client)
    }

    /// Log in and keep the session id for subsequent commands.
    #[instrument(skip(self, credentials), fields(base_url = %self.base_url))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ProviderError> {
        let data = self.post("login", &credentials.payload()?).await?.into_result()?;
        let login: LoginResponse = serde_json::from_value(Value::Object(data))?;
        *self.sid.write().await = Some(login.sid.clone());
        info!(
            api_server_version = login.api_server_version.as_deref().unwrap_or("unknown"),
            "logged in to management server"
        );
        Ok(login)
    }

    /// The current session id, if logged in.
    pub async fn session_id(&self) -> Option<String> {
        self.sid.read().await.clone()
    }

    async fn post(
        &self,
        command: &str,
        payload: &Map<String, Value>,
    ) -> Result<ApiResponse, ProviderError> {
        let url = format!("{}/{}", self.base_url, command);
        let mut request = self.http.post(&url).json(payload);
        if let Some(sid) = self.sid.read().await.as_deref() {
            request = request.header(SID_HEADER, sid);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => body,
                Err(_) if !status.is_success() => {
                    json!({"message": String::from_utf8_lossy(&bytes).into_owned()})
                },
                Err(err) => return Err(err.into()),
            }
        };

        if status.is_success() {
            debug!(command, %status, "command succeeded");
            Ok(ApiResponse::ok(body))
        } else {
            let data = match body {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            let error_msg = error_message(status, &data);
            warn!(command, %status, error = %error_msg, "command rejected");
            Ok(ApiResponse {
                success: false,
                error_msg,
                data,
            })
        }
    }

    async fn wait_for_tasks(&self, task_ids: Vec<Value>) -> Result<ApiResponse, ProviderError> {
        let ids = Value::Array(task_ids.clone());
        match tokio::time::timeout(self.task_timeout, self.poll_tasks(task_ids)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(tasks = %ids, timeout = ?self.task_timeout, "gave up waiting for task");
                let mut data = Map::new();
                data.insert("tasks".to_string(), ids);
                Ok(ApiResponse {
                    success: false,
                    error_msg: format!("task did not finish within {:?}", self.task_timeout),
                    data,
                })
            },
        }
    }

    async fn poll_tasks(&self, task_ids: Vec<Value>) -> Result<ApiResponse, ProviderError> {
        let mut payload = Map::new();
        payload.insert("task-id".to_string(), Value::Array(task_ids));
        payload.insert("details-level".to_string(), json!("full"));

        loop {
            tokio::time::sleep(self.poll_interval).await;
            let response = self.post("show-task", &payload).await?;
            if !response.success {
                return Ok(response);
            }

            let tasks = response
                .data
                .get("tasks")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if tasks.iter().any(|task| task_status(task) == "in progress") {
                debug!(tasks = tasks.len(), "task still in progress");
                continue;
            }

            let failures: Vec<String> = tasks
                .iter()
                .filter(|task| task_status(task) == "failed")
                .map(task_failure_message)
                .collect();
            if failures.is_empty() {
                return Ok(response);
            }
            return Ok(ApiResponse {
                success: false,
                error_msg: failures.join("\n"),
                data: response.data,
            });
        }
    }
}

#[async_trait]
impl ApiClient for ManagementClient {
    #[instrument(skip(self, payload), name = "management.api_call")]
    async fn api_call(
        &self,
        command: &str,
        payload: Map<String, Value>,
    ) -> Result<ApiResponse, ProviderError> {
        let response = self.post(command, &payload).await?;
        if response.success && command != "show-task" {
            let task_ids = task_ids(&response.data);
            if !task_ids.is_empty() {
                debug!(command, tasks = task_ids.len(), "waiting for task");
                return self.wait_for_tasks(task_ids).await;
            }
        }
        Ok(response)
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        if self.sid.read().await.is_none() {
            return Ok(());
        }
        self.post("logout", &Map::new()).await?.into_result()?;
        *self.sid.write().await = None;
        info!("logged out of management server");
        Ok(())
    }
}

fn task_ids(data: &Map<String, Value>) -> Vec<Value> {
    if let Some(id) = data.get("task-id").filter(|v| v.is_string()) {
        return vec![id.clone()];
    }
    data.get("tasks")
        .and_then(Value::as_array)
        .map(|tasks| {
            tasks
                .iter()
                .filter_map(|task| task.get("task-id").filter(|v| v.is_string()).cloned())
                .collect()
        })
        .unwrap_or_default()
}

fn task_status(task: &Value) -> &str {
    task.get("status").and_then(Value::as_str).unwrap_or("")
}

fn task_failure_message(task: &Value) -> String {
    let name = task
        .get("task-name")
        .and_then(Value::as_str)
        .unwrap_or("task");
    let detail = task
        .get("task-details")
        .and_then(Value::as_array)
        .and_then(|details| {
            details.iter().find_map(|d| {
                d.get("statusDescription")
                    .or_else(|| d.get("status-description"))
                    .and_then(Value::as_str)
            })
        })
        .or_else(|| task.get("comments").and_then(Value::as_str));
    match detail {
        Some(detail) => format!("{} failed: {}", name, detail),
        None => format!("{} failed", name),
    }
}

fn error_message(status: StatusCode, data: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    if let Some(message) = data.get("message").and_then(Value::as_str) {
        parts.push(message.to_string());
    }
    for key in ["errors", "blocking-errors", "warnings"] {
        let Some(items) = data.get(key).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            if let Some(message) = item.get("message").and_then(Value::as_str) {
                parts.push(format!("{}: {}", key, message));
            }
        }
    }
    if parts.is_empty() {
        match data.get("code").and_then(Value::as_str) {
            Some(code) => format!("{} ({})", code, status),
            None => format!("management server returned {}", status),
        }
    } else {
        parts.join("\n")
    }
}
