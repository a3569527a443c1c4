//! The Snyk provider: resource adapters behind a [`ProviderService`].
//!
//! [`SnykProvider`] owns one adapter per resource type and the API client
//! built by `configure`. Every resource call is dispatched by type name to its
//! [`Resource`] adapter with a clone of that client.

pub mod environment;
pub mod organization;
pub mod permissions;
pub mod plan;
pub mod resource;
pub mod service_account;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{ClientConfig, SnykClient};
use crate::error::ProviderError;
use crate::http::HttpClientOptions;
use crate::schema::{has_errors, Attribute, Diagnostic, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};
use crate::validation::validate;

pub use environment::{EnvironmentModel, EnvironmentResource, ENVIRONMENT_RESOURCE};
pub use organization::{OrganizationModel, OrganizationResource, ORGANIZATION_RESOURCE};
pub use permissions::{PermissionsModel, PermissionsResource, PERMISSIONS_RESOURCE};
pub use resource::Resource;
pub use service_account::{ServiceAccountModel, ServiceAccountResource, SERVICE_ACCOUNT_RESOURCE};

use resource::ensure_valid;

/// Prefix of every resource type name.
pub const PROVIDER_TYPE_NAME: &str = "snyk";

#[derive(Default, Deserialize)]
struct ProviderConfigModel {
    endpoint: Option<String>,
    api_token: Option<String>,
    bearer_token: Option<String>,
    tls_skip_verify: Option<bool>,
}

impl ProviderConfigModel {
    fn into_client_config(self) -> ClientConfig {
        let http = HttpClientOptions::from_env().with_tls_skip_verify(self.tls_skip_verify.unwrap_or(false));
        ClientConfig::new(
            self.endpoint.unwrap_or_default(),
            self.api_token.unwrap_or_default(),
        )
        .with_bearer_token(self.bearer_token.unwrap_or_default())
        .with_http_options(http)
    }
}

/// Snyk organizations, cloud environments, service accounts and permissions.
pub struct SnykProvider {
    version: String,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    client: RwLock<Option<SnykClient>>,
}

impl Default for SnykProvider {
    fn default() -> Self {
        Self::new("dev")
    }
}

impl SnykProvider {
    /// A provider reporting `version`: the release version, "dev" for local
    /// builds or "test" under test.
    pub fn new(version: impl Into<String>) -> Self {
        let adapters: Vec<Box<dyn Resource>> = vec![
            Box::new(EnvironmentResource),
            Box::new(OrganizationResource),
            Box::new(ServiceAccountResource),
            Box::new(PermissionsResource),
        ];

        Self {
            version: version.into(),
            resources: adapters.into_iter().map(|r| (r.type_name(), r)).collect(),
            client: RwLock::new(None),
        }
    }

    /// Schema of the provider configuration block.
    pub fn provider_config_schema() -> Schema {
        Schema::new()
            .with_attribute(
                "endpoint",
                Attribute::optional_string().with_description("API endpoint. Defaults to $SNYK_API"),
            )
            .with_attribute(
                "api_token",
                Attribute::optional_string()
                    .with_description("API token. Defaults to $SNYK_TOKEN")
                    .sensitive(),
            )
            .with_attribute(
                "bearer_token",
                Attribute::optional_string()
                    .with_description("OAuth access token, used instead of api_token")
                    .sensitive(),
            )
            .with_attribute(
                "tls_skip_verify",
                Attribute::optional_bool().with_description("Disable TLS certificate verification"),
            )
    }

    /// Install an already built client, bypassing `configure`.
    pub async fn set_client(&self, client: SnykClient) {
        *self.client.write().await = Some(client);
    }

    /// Returns `true` once a client has been configured.
    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    async fn client(&self) -> Result<SnykClient, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    /// Schema checks, then the adapter's own checks if the schema passed.
    fn check(resource: &dyn Resource, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validate(&resource.schema(), config);
        if !has_errors(&diagnostics) {
            diagnostics.extend(resource.validate(config));
        }
        diagnostics
    }
}

#[async_trait::async_trait]
impl ProviderService for SnykProvider {
    fn schema(&self) -> ProviderSchema {
        self.resources.values().fold(
            ProviderSchema::new().with_provider_config(Self::provider_config_schema()),
            |schema, resource| schema.with_resource(resource.type_name(), resource.schema()),
        )
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: self.version.clone(),
            resources: self.resources.keys().map(|name| name.to_string()).collect(),
        }
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = self.validate_provider_config(config.clone()).await?;
        if has_errors(&diagnostics) {
            warn!(diagnostics = diagnostics.len(), "Configure rejected provider configuration");
            return Ok(diagnostics);
        }

        let model: ProviderConfigModel = if config.is_null() {
            ProviderConfigModel::default()
        } else {
            serde_json::from_value(config)?
        };

        match SnykClient::new(&model.into_client_config()) {
            Ok(client) => {
                self.set_client(client).await;
                info!("Configure completed successfully");
                Ok(diagnostics)
            }
            Err(err) => {
                error!(error = %err, "Configure failed");
                Ok(vec![Diagnostic::error("Client Error")
                    .with_detail(format!("Unable to create rest client: {}", err.message()))])
            }
        }
    }

    #[instrument(skip(self, config))]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let diagnostics = Self::check(resource, &config);
        if has_errors(&diagnostics) {
            warn!(diagnostics = diagnostics.len(), "ValidateResourceConfig completed with errors");
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, prior_state, proposed_state, _config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let result = plan::plan(&resource.schema(), prior_state.as_ref(), &proposed_state);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "Plan completed"
        );
        Ok(result)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        ensure_valid(Self::check(resource, &planned_state))?;
        let client = self.client().await?;

        info!("Create called");
        let state = resource.create(&client, planned_state).await.map_err(|err| {
            error!(error = %err, "Create failed");
            err
        })?;
        info!("Create completed successfully");
        Ok(state)
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;

        debug!("Read called");
        resource.read(&client, current_state).await.map_err(|err| {
            error!(error = %err, "Read failed");
            err
        })
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        ensure_valid(Self::check(resource, &planned_state))?;
        let client = self.client().await?;

        info!("Update called");
        let state = resource
            .update(&client, prior_state, planned_state)
            .await
            .map_err(|err| {
                error!(error = %err, "Update failed");
                err
            })?;
        info!("Update completed successfully");
        Ok(state)
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;

        info!("Delete called");
        resource.delete(&client, current_state).await.map_err(|err| {
            error!(error = %err, "Delete failed");
            err
        })?;
        info!("Delete completed successfully");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;

        let state = resource.import(&client, id).await.map_err(|err| {
            error!(error = %err, "ImportResourceState failed");
            err
        })?;
        info!("ImportResourceState completed");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_error_contains;
    use serde_json::json;

    #[test]
    fn test_metadata_and_schema() {
        let provider = SnykProvider::new("test");
        let metadata = provider.metadata();
        assert_eq!(metadata.type_name, "snyk");
        assert_eq!(metadata.version, "test");
        assert_eq!(
            metadata.resources,
            vec![
                "snyk_environment",
                "snyk_organization",
                "snyk_organization_service_account",
                "snyk_permissions",
            ]
        );
        assert!(metadata.resources.iter().all(|r| r.starts_with(PROVIDER_TYPE_NAME)));

        let schema = provider.schema();
        assert_eq!(schema.resources.len(), 4);
        assert!(schema.provider.attribute("api_token").unwrap().flags.sensitive);
    }

    #[tokio::test]
    async fn test_configure_rejects_ill_typed_config() {
        let provider = SnykProvider::default();
        let diagnostics = provider
            .configure(json!({"endpoint": "https://api.snyk.io", "tls_skip_verify": "yes"}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "Invalid type");
        assert!(!provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_validate_provider_config() {
        let provider = SnykProvider::default();
        let diagnostics = provider
            .validate_provider_config(json!({"endpoint": "https://api.snyk.io", "bearer_token": "b"}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());

        let diagnostics = provider
            .validate_provider_config(json!({"api_key": "t"}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "Unsupported argument 'api_key'");
        assert!(!provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_configure_with_explicit_values() {
        let provider = SnykProvider::default();
        let diagnostics = provider
            .configure(json!({"endpoint": "https://api.snyk.io/v1", "api_token": "t"}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
        assert!(provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails() {
        let provider = SnykProvider::default();
        let err = provider
            .delete("snyk_organization", json!({"id": "org-1", "name": "acme"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = SnykProvider::default();
        let err = provider
            .validate_resource_config("snyk_project", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_create_validates_before_any_call() {
        let provider = SnykProvider::default();
        let err = provider
            .create(
                "snyk_environment",
                json!({"organization_id": "5f6e3d4b-2a1c-4b8e-9f0a-1b2c3d4e5f60", "kind": "oracle"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }
}
