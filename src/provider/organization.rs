//! `snyk_organization`.
//!
//! The API has no update call, so every configurable attribute forces
//! replacement.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{
    check_uuid, config_error, decode_state, encode_state, ensure_import_uuid, is_blank, state_str,
    Resource,
};
use crate::client::SnykClient;
use crate::error::ProviderError;
use crate::organization::{Organization, OrganizationRequest};
use crate::schema::{Attribute, Diagnostic, Schema};

pub const ORGANIZATION_RESOURCE: &str = "snyk_organization";

/// State of a `snyk_organization`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_organization_id: Option<String>,
}

impl OrganizationModel {
    fn request(&self) -> OrganizationRequest {
        let mut request = OrganizationRequest::new(self.name.clone());
        if let Some(group_id) = &self.group_id {
            request = request.with_group_id(group_id.clone());
        }
        if let Some(source) = &self.source_organization_id {
            request = request.with_source_org_id(source.clone());
        }
        request
    }

    fn refresh(&mut self, remote: Organization) {
        self.id = Some(remote.id);
        self.name = remote.name;
        self.group_id = Some(remote.group_id).filter(|id| !id.is_empty());
    }
}

pub struct OrganizationResource;

#[async_trait::async_trait]
impl Resource for OrganizationResource {
    fn type_name(&self) -> &'static str {
        ORGANIZATION_RESOURCE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_description("Provides Snyk Organizations")
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Snyk organization id"),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("The name of the organization")
                    .with_force_new(),
            )
            .with_attribute(
                "group_id",
                Attribute::optional_computed_string()
                    .with_description("The group ID. The API token must have access to this group.")
                    .with_force_new(),
            )
            .with_attribute(
                "source_organization_id",
                Attribute::optional_string()
                    .with_description("The id of an organization to copy settings from.")
                    .with_force_new(),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let model: OrganizationModel = match serde_json::from_value(config.clone()) {
            Ok(model) => model,
            Err(err) => return vec![Diagnostic::error("Configuration Error").with_detail(err.to_string())],
        };

        let mut diagnostics = Vec::new();
        if is_blank(&model.name) {
            diagnostics.push(config_error("name", "Organization name must not be blank"));
        }
        if let Some(group_id) = &model.group_id {
            diagnostics.extend(check_uuid("group_id", "Organization Group", group_id));
        }
        if let Some(source) = &model.source_organization_id {
            diagnostics.extend(check_uuid("source_organization_id", "Source Organization", source));
        }
        diagnostics
    }

    async fn create(&self, client: &SnykClient, planned: Value) -> Result<Value, ProviderError> {
        let mut model: OrganizationModel = decode_state(planned)?;
        let created = client
            .organizations
            .create_organization(&model.request())
            .await?;
        model.id = Some(created.id);
        encode_state(&model)
    }

    async fn read(&self, client: &SnykClient, current: Value) -> Result<Value, ProviderError> {
        let id = state_str(&current, "id")?.to_string();
        let mut model: OrganizationModel = decode_state(current)?;
        let remote = client.organizations.get_organization(&id).await?;
        model.refresh(remote);
        encode_state(&model)
    }

    async fn update(
        &self,
        _client: &SnykClient,
        _prior: Value,
        _planned: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::Unimplemented(
            "organizations cannot be updated in place".to_string(),
        ))
    }

    async fn delete(&self, client: &SnykClient, current: Value) -> Result<(), ProviderError> {
        let id = state_str(&current, "id")?;
        client.organizations.delete_organization(id).await
    }

    async fn import(&self, client: &SnykClient, id: &str) -> Result<Value, ProviderError> {
        ensure_import_uuid("organization id", id)?;
        let remote = client.organizations.get_organization(id).await?;
        let mut model = OrganizationModel::default();
        model.refresh(remote);
        encode_state(&model)
    }
}
