//! `snyk_organization_service_account`.
//!
//! There is no read or update API: read returns the stored state unchanged and
//! every configurable attribute forces replacement. The API key is only known
//! from the create response, so import cannot work.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{
    check_uuid, config_error, decode_state, encode_state, is_blank, state_str, Resource,
};
use crate::client::SnykClient;
use crate::error::ProviderError;
use crate::organization::{AuthType, ServiceAccountRequest};
use crate::schema::{Attribute, Diagnostic, Schema};

pub const SERVICE_ACCOUNT_RESOURCE: &str = "snyk_organization_service_account";

/// Bounds of `access_token_ttl_seconds`.
pub const MIN_ACCESS_TOKEN_TTL: i64 = 3600;
pub const MAX_ACCESS_TOKEN_TTL: i64 = 86400;

/// State of a `snyk_organization_service_account`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role_id: String,
    #[serde(default)]
    pub auth_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_ttl_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ServiceAccountModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountModel")
            .field("id", &self.id)
            .field("organization_id", &self.organization_id)
            .field("name", &self.name)
            .field("auth_type", &self.auth_type)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountModel {
    fn request(&self) -> Result<ServiceAccountRequest, ProviderError> {
        let auth_type: AuthType = self.auth_type.parse()?;
        let mut request = ServiceAccountRequest::new(self.name.clone(), self.role_id.clone(), auth_type);
        if let Some(jwks_url) = &self.jwks_url {
            request = request.with_jwks_url(jwks_url.clone());
        }
        if let Some(ttl) = self.access_token_ttl_seconds {
            request = request.with_access_token_ttl_seconds(ttl);
        }
        Ok(request)
    }
}

pub struct ServiceAccountResource;

#[async_trait::async_trait]
impl Resource for ServiceAccountResource {
    fn type_name(&self) -> &'static str {
        SERVICE_ACCOUNT_RESOURCE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_description("Provides Snyk Organization level Service Accounts")
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Snyk service account id"),
            )
            .with_attribute(
                "api_key",
                Attribute::computed_string()
                    .with_description("Service account API key")
                    .sensitive(),
            )
            .with_attribute(
                "organization_id",
                Attribute::required_string()
                    .with_description("The id of the organization to create the service account in.")
                    .with_force_new(),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("A human-friendly name for the service account.")
                    .with_force_new(),
            )
            .with_attribute(
                "role_id",
                Attribute::required_string()
                    .with_description("The ID of the role the service account should use.")
                    .with_force_new(),
            )
            .with_attribute(
                "auth_type",
                Attribute::required_string()
                    .with_description(
                        "Authentication strategy for the service account. Allowed: api_key|oauth_private_key_jwt",
                    )
                    .with_one_of(["api_key", "oauth_private_key_jwt"])
                    .with_force_new(),
            )
            .with_attribute(
                "jwks_url",
                Attribute::optional_string()
                    .with_description(
                        "A JWKs URL hosting your public keys. Must be https. Required only when auth_type is oauth_private_key_jwt",
                    )
                    .with_force_new(),
            )
            .with_attribute(
                "access_token_ttl_seconds",
                Attribute::optional_int64()
                    .with_description(
                        "Lifetime of generated access tokens. Only used when auth_type is oauth_private_key_jwt. Min 3600, max 86400",
                    )
                    .with_force_new(),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let model: ServiceAccountModel = match serde_json::from_value(config.clone()) {
            Ok(model) => model,
            Err(err) => return vec![Diagnostic::error("Configuration Error").with_detail(err.to_string())],
        };

        let mut diagnostics = Vec::new();
        diagnostics.extend(check_uuid("organization_id", "Service Account Organization", &model.organization_id));
        if is_blank(&model.name) {
            diagnostics.push(config_error("name", "Service account name must not be blank"));
        }
        if is_blank(&model.role_id) {
            diagnostics.push(config_error("role_id", "Service account role_id must not be blank"));
        }

        let auth_type = match model.auth_type.parse::<AuthType>() {
            Ok(auth_type) => auth_type,
            Err(err) => {
                diagnostics.push(config_error("auth_type", err.message()));
                return diagnostics;
            }
        };

        if auth_type == AuthType::OauthPrivateKeyJwt {
            match model.jwks_url.as_deref().map(str::trim) {
                None | Some("") => diagnostics.push(config_error(
                    "jwks_url",
                    "jwks_url is required when auth_type is oauth_private_key_jwt",
                )),
                Some(url) if !url.starts_with("https://") => {
                    diagnostics.push(config_error("jwks_url", "jwks_url must be an https URL"))
                }
                Some(_) => {}
            }
        }

        if let Some(ttl) = model.access_token_ttl_seconds {
            if !(MIN_ACCESS_TOKEN_TTL..=MAX_ACCESS_TOKEN_TTL).contains(&ttl) {
                diagnostics.push(config_error(
                    "access_token_ttl_seconds",
                    format!(
                        "access_token_ttl_seconds must be between {} and {}, got {}",
                        MIN_ACCESS_TOKEN_TTL, MAX_ACCESS_TOKEN_TTL, ttl
                    ),
                ));
            }
        }

        diagnostics
    }

    async fn create(&self, client: &SnykClient, planned: Value) -> Result<Value, ProviderError> {
        let mut model: ServiceAccountModel = decode_state(planned)?;
        let account = client
            .organizations
            .create_service_account(&model.organization_id, &model.request()?)
            .await?;

        model.id = Some(account.id);
        model.api_key = Some(account.api_key).filter(|key| !key.is_empty());
        encode_state(&model)
    }

    async fn read(&self, _client: &SnykClient, current: Value) -> Result<Value, ProviderError> {
        Ok(current)
    }

    async fn update(
        &self,
        _client: &SnykClient,
        _prior: Value,
        _planned: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::Unimplemented(
            "service accounts cannot be updated in place".to_string(),
        ))
    }

    async fn delete(&self, client: &SnykClient, current: Value) -> Result<(), ProviderError> {
        let org_id = state_str(&current, "organization_id")?;
        let id = state_str(&current, "id")?;
        client.organizations.delete_service_account(org_id, id).await
    }
}
