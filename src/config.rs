//! Provider configuration.
//!
//! Configuration arrives as a JSON object from the host. Any field left
//! unset is filled from the matching `CHECKPOINT_*` environment variable.

use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default HTTPS port of the management server.
pub const DEFAULT_PORT: u16 = 443;

/// Default API context.
pub const DEFAULT_CONTEXT: &str = "web_api";

/// Context used when talking to a Gaia OS API instead of the management API.
pub const GAIA_CONTEXT: &str = "gaia_api";

/// Connection settings for a Check Point Management Server.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Management server address.
    pub server: Option<String>,
    /// HTTPS port.
    pub port: u16,
    /// Login user name.
    pub username: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// API key, used instead of username/password.
    pub api_key: Option<String>,
    /// Domain to log into (Multi-Domain servers).
    pub domain: Option<String>,
    /// API context, `web_api` or `gaia_api`.
    pub context: String,
    /// API version path segment (`v1.8` style, without the `v`).
    pub api_version: Option<String>,
    /// Session name shown in SmartConsole.
    pub session_name: Option<String>,
    /// Session description.
    pub session_description: Option<String>,
    /// Session inactivity timeout in seconds.
    pub session_timeout: u64,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    /// Interval between `show-task` polls in seconds.
    pub task_poll_interval_secs: u64,
    /// Longest time to wait for a background task, in seconds.
    pub task_timeout_secs: u64,
    /// HTTP proxy host.
    pub proxy_host: Option<String>,
    /// HTTP proxy port.
    pub proxy_port: Option<u16>,
    /// Accept the server's certificate without verification.
    pub ignore_server_certificate: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_PORT,
            username: None,
            password: None,
            api_key: None,
            domain: None,
            context: DEFAULT_CONTEXT.to_string(),
            api_version: None,
            session_name: None,
            session_description: None,
            session_timeout: 600,
            timeout: 120,
            task_poll_interval_secs: 2,
            task_timeout_secs: 3600,
            proxy_host: None,
            proxy_port: None,
            ignore_server_certificate: false,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("domain", &self.domain)
            .field("context", &self.context)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("proxy_host", &self.proxy_host)
            .field("proxy_port", &self.proxy_port)
            .field("ignore_server_certificate", &self.ignore_server_certificate)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// Parse a host-supplied configuration object.
    ///
    /// `null` fields are treated as unset.
    pub fn from_value(config: Value) -> Result<Self, ProviderError> {
        let config = match config {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => {
                Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect())
            },
            other => {
                return Err(ProviderError::Configuration(format!(
                    "expected an object, got {}",
                    other
                )))
            },
        };
        Ok(serde_json::from_value(config)?)
    }

    /// Fill unset fields from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from an arbitrary variable lookup.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        fill(&mut self.server, lookup("CHECKPOINT_SERVER"));
        fill(&mut self.username, lookup("CHECKPOINT_USERNAME"));
        fill(&mut self.password, lookup("CHECKPOINT_PASSWORD"));
        fill(&mut self.api_key, lookup("CHECKPOINT_API_KEY"));
        fill(&mut self.domain, lookup("CHECKPOINT_DOMAIN"));
        fill(&mut self.proxy_host, lookup("CHECKPOINT_PROXY_HOST"));
        if self.context == defaults.context {
            if let Some(context) = lookup("CHECKPOINT_CONTEXT") {
                self.context = context;
            }
        }
        if self.port == defaults.port {
            if let Some(port) = lookup("CHECKPOINT_PORT").and_then(|p| p.parse().ok()) {
                self.port = port;
            }
        }
        if self.timeout == defaults.timeout {
            if let Some(timeout) = lookup("CHECKPOINT_TIMEOUT").and_then(|t| t.parse().ok()) {
                self.timeout = timeout;
            }
        }
        if self.proxy_port.is_none() {
            self.proxy_port = lookup("CHECKPOINT_PROXY_PORT").and_then(|p| p.parse().ok());
        }
        self
    }

    /// Check that the configuration can be used to log in.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.server.as_deref().map_or(true, str::is_empty) {
            diagnostics.push(
                Diagnostic::error("Missing management server address")
                    .with_detail("Set `server` or the CHECKPOINT_SERVER environment variable")
                    .with_attribute("server"),
            );
        }
        let has_password = self.username.is_some() && self.password.is_some();
        if !has_password && self.api_key.is_none() {
            diagnostics.push(
                Diagnostic::error("Missing credentials")
                    .with_detail("Set `username` and `password`, or `api_key`"),
            );
        }
        if self.context != DEFAULT_CONTEXT && self.context != GAIA_CONTEXT {
            diagnostics.push(
                Diagnostic::error(format!("Unsupported API context '{}'", self.context))
                    .with_detail(format!("Expected '{}' or '{}'", DEFAULT_CONTEXT, GAIA_CONTEXT))
                    .with_attribute("context"),
            );
        }
        if self.proxy_host.is_some() != self.proxy_port.is_some() {
            diagnostics.push(
                Diagnostic::warning("Incomplete proxy settings are ignored")
                    .with_detail("Set both `proxy_host` and `proxy_port`"),
            );
        }
        diagnostics
    }

    /// Base URL every command is appended to.
    pub fn base_url(&self) -> String {
        let server = self.server.as_deref().unwrap_or_default();
        match &self.api_version {
            Some(version) => format!(
                "https://{}:{}/{}/v{}",
                server, self.port, self.context, version
            ),
            None => format!("https://{}:{}/{}", server, self.port, self.context),
        }
    }

    /// Proxy URL, when both host and port are set.
    pub fn proxy_url(&self) -> Option<String> {
        match (&self.proxy_host, self.proxy_port) {
            (Some(host), Some(port)) => Some(format!("http://{}:{}", host, port)),
            _ => None,
        }
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Interval between task status polls.
    pub fn task_poll_interval(&self) -> Duration {
        Duration::from_secs(self.task_poll_interval_secs)
    }

    /// Overall deadline for a background task.
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "server",
                Attribute::optional_string().with_description("Check Point Management server IP."),
            )
            .with_attribute(
                "port",
                Attribute::optional_int64()
                    .with_description("Port used for connection to the API server.")
                    .with_default(i64::from(DEFAULT_PORT)),
            )
            .with_attribute("username", Attribute::optional_string())
            .with_attribute("password", Attribute::optional_string().sensitive())
            .with_attribute(
                "api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Administrator API key."),
            )
            .with_attribute("domain", Attribute::optional_string())
            .with_attribute(
                "context",
                Attribute::optional_string().with_default(DEFAULT_CONTEXT),
            )
            .with_attribute("api_version", Attribute::optional_string())
            .with_attribute("session_name", Attribute::optional_string())
            .with_attribute("session_description", Attribute::optional_string())
            .with_attribute(
                "session_timeout",
                Attribute::optional_int64().with_default(600),
            )
            .with_attribute("timeout", Attribute::optional_int64().with_default(120))
            .with_attribute(
                "task_poll_interval_secs",
                Attribute::optional_int64().with_default(2),
            )
            .with_attribute(
                "task_timeout_secs",
                Attribute::optional_int64()
                    .with_description("Seconds to wait for a publish or installation task.")
                    .with_default(3600),
            )
            .with_attribute("proxy_host", Attribute::optional_string())
            .with_attribute("proxy_port", Attribute::optional_int64())
            .with_attribute(
                "ignore_server_certificate",
                Attribute::optional_bool().with_default(false),
            )
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value.filter(|v| !v.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_value_defaults() {
        let config = ProviderConfig::from_value(json!({"server": "10.0.0.1", "port": null})).unwrap();
        assert_eq!(config.server.as_deref(), Some("10.0.0.1"));
        assert_eq!(config.port, 443);
        assert_eq!(config.context, "web_api");
        assert_eq!(config.base_url(), "https://10.0.0.1:443/web_api");
        assert_eq!(config.task_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(matches!(
            ProviderConfig::from_value(json!("server")),
            Err(ProviderError::Configuration(_))
        ));
        assert!(ProviderConfig::from_value(json!({"port": "not a port"})).is_err());
    }

    #[test]
    fn test_env_fills_only_unset_fields() {
        let config = ProviderConfig::from_value(json!({"server": "mgmt.example.com"}))
            .unwrap()
            .with_env_from(env(&[
                ("CHECKPOINT_SERVER", "ignored"),
                ("CHECKPOINT_USERNAME", "admin"),
                ("CHECKPOINT_PASSWORD", "secret"),
                ("CHECKPOINT_CONTEXT", "gaia_api"),
                ("CHECKPOINT_PORT", "4434"),
            ]));

        assert_eq!(config.server.as_deref(), Some("mgmt.example.com"));
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.context, "gaia_api");
        assert_eq!(config.port, 4434);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_missing_fields() {
        let diagnostics = ProviderConfig::default().validate();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("server"));

        let config = ProviderConfig {
            server: Some("s".to_string()),
            api_key: Some("key".to_string()),
            context: "rest".to_string(),
            ..Default::default()
        };
        let diagnostics = config.validate();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("context"));
    }

    #[test]
    fn test_base_url_with_version_and_proxy() {
        let config = ProviderConfig {
            server: Some("mgmt".to_string()),
            port: 8443,
            api_version: Some("1.8".to_string()),
            proxy_host: Some("proxy".to_string()),
            proxy_port: Some(3128),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "https://mgmt:8443/web_api/v1.8");
        assert_eq!(config.proxy_url().as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProviderConfig {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
