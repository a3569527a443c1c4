//! Snyk provider
//!
//! Manages Snyk organizations, cloud environments, organization service
//! accounts and cloud permission templates as declarative resources.
//!
//! # Overview
//!
//! - **ProviderService trait**: the host-facing interface ([`service`])
//! - **SnykProvider**: the provider, one [`provider::Resource`] adapter per resource type
//! - **API clients**: typed calls to the Snyk REST and v1 APIs ([`cloudapi`], [`organization`])
//! - **Schema types**: attribute schemas driving validation and planning
//! - **Error types**: [`ProviderError`] and user-facing [`schema::Diagnostic`]s
//! - **Logging**: `tracing` with an `RUST_LOG` filter
//!
//! # Resources
//!
//! | Type | Remote object |
//! |------|---------------|
//! | `snyk_environment` | Cloud environment (AWS, Azure or Google) of an organization |
//! | `snyk_organization` | Organization, optionally in a group |
//! | `snyk_organization_service_account` | Organization-level service account |
//! | `snyk_permissions` | CloudFormation template granting Snyk access to an AWS account |
//!
//! # Quick Start
//!
//! ```ignore
//! use snyk_provider::{init_logging, ProviderService, SnykProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = SnykProvider::new(env!("CARGO_PKG_VERSION"));
//!     // endpoint and api_token fall back to $SNYK_API and $SNYK_TOKEN
//!     provider.configure(json!({})).await?;
//!
//!     let state = provider
//!         .create("snyk_organization", json!({"name": "acme"}))
//!         .await?;
//!     println!("created {}", state["id"]);
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! | Attribute | Environment fallback | Notes |
//! |-----------|----------------------|-------|
//! | `endpoint` | `SNYK_API` | Reduced to scheme, host and port |
//! | `api_token` | `SNYK_TOKEN` | Sent as `Authorization: token ...` |
//! | `bearer_token` | | Sent as `Authorization: Bearer ...`, takes precedence |
//! | `tls_skip_verify` | | Disables certificate verification |
//!
//! Extra trusted CA certificates are read from the PEM file named by
//! `NODE_EXTRA_CA_CERTS`.

#![warn(clippy::all)]

pub mod client;
pub mod cloudapi;
pub mod error;
pub mod http;
pub mod logging;
pub mod organization;
pub mod provider;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{ClientConfig, SnykClient};
pub use error::ProviderError;
pub use http::HttpClientOptions;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{Resource, SnykProvider, PROVIDER_TYPE_NAME};
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
