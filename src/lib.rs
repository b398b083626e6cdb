//! Check Point Management provider
//!
//! This crate exposes Check Point Security Management objects (hosts,
//! simple clusters, time objects, permission profiles) and management
//! commands (global properties, software installation, publish) as
//! declarative resources and data sources.
//!
//! # Overview
//!
//! - **ProviderService trait**: the hooks a host drives (schema, configure,
//!   plan, create, read, update, delete, import, data source read)
//! - **CheckpointProvider**: the implementation over the management web API
//! - **Schema types**: resource, data source and provider config schemas
//! - **Attribute mapper**: snake_case state to kebab-case API payloads and back
//! - **Management client**: session login, command calls and task polling
//! - **Logging**: integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```ignore
//! use checkpoint_provider::{CheckpointProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     checkpoint_provider::init_logging();
//!
//!     let provider = CheckpointProvider::new();
//!     provider
//!         .configure(json!({"server": "192.0.2.10", "username": "admin", "password": "secret"}))
//!         .await?;
//!
//!     let plan = provider
//!         .plan("checkpoint_management_host", None, json!({"name": "host1", "ipv4_address": "1.2.3.4"}), json!({}))
//!         .await?;
//!     let state = provider.create("checkpoint_management_host", plan.planned_state).await?;
//!     println!("created host {}", state["id"]);
//!
//!     provider.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! # State
//!
//! Resource state is a JSON object keyed by schema attribute names. `id`
//! holds the object's uid on the management server; an empty `id` returned
//! from `read` means the object no longer exists.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{ApiClient, ApiResponse, ManagementClient};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::CheckpointProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
