//! `snyk_permissions`: the template granting Snyk access to a cloud account.
//!
//! Nothing is created remotely. `data` is fetched again on create, read and
//! update; delete only forgets the state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{check_uuid, decode_state, encode_state, Resource};
use crate::client::SnykClient;
use crate::cloudapi::PermissionsRequest;
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

pub const PERMISSIONS_RESOURCE: &str = "snyk_permissions";

/// State of a `snyk_permissions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsModel {
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub platform: String,
    #[serde(rename = "type", default)]
    pub template_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl PermissionsModel {
    async fn recompute(&mut self, client: &SnykClient) -> Result<(), ProviderError> {
        let request = PermissionsRequest::new(self.platform.clone(), self.template_type.clone());
        let permissions = client
            .cloud
            .get_permissions(&self.organization_id, &request)
            .await?;
        self.data = Some(permissions.data().to_string());
        Ok(())
    }
}

pub struct PermissionsResource;

#[async_trait::async_trait]
impl Resource for PermissionsResource {
    fn type_name(&self) -> &'static str {
        PERMISSIONS_RESOURCE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_description("Permissions template for a cloud platform")
            .with_attribute(
                "organization_id",
                Attribute::required_string().with_description("Snyk organization ID"),
            )
            .with_attribute(
                "platform",
                Attribute::required_string()
                    .with_description("Platform, should be `aws`")
                    .with_one_of(["aws"]),
            )
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_description("Type, should be `cf`")
                    .with_one_of(["cf"]),
            )
            .with_attribute(
                "data",
                Attribute::optional_computed_string().with_description(
                    "Permission data, e.g. template body to create an AWS CloudFormation Stack",
                ),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        config
            .get("organization_id")
            .and_then(Value::as_str)
            .and_then(|org| check_uuid("organization_id", "Permissions Organization", org))
            .into_iter()
            .collect()
    }

    async fn create(&self, client: &SnykClient, planned: Value) -> Result<Value, ProviderError> {
        let mut model: PermissionsModel = decode_state(planned)?;
        model.recompute(client).await?;
        encode_state(&model)
    }

    async fn read(&self, client: &SnykClient, current: Value) -> Result<Value, ProviderError> {
        let mut model: PermissionsModel = decode_state(current)?;
        model.recompute(client).await?;
        encode_state(&model)
    }

    async fn update(
        &self,
        client: &SnykClient,
        _prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let mut model: PermissionsModel = decode_state(planned)?;
        model.recompute(client).await?;
        encode_state(&model)
    }

    async fn delete(&self, _client: &SnykClient, _current: Value) -> Result<(), ProviderError> {
        Ok(())
    }
}
