//! `snyk_environment`: a cloud account, subscription or project Snyk scans.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::resource::{
    check_uuid, config_error, decode_state, encode_state, ensure_import_uuid, is_blank, state_str,
    Resource,
};
use crate::client::SnykClient;
use crate::cloudapi::{
    AwsOptions, AzureOptions, EnvironmentAttributes, EnvironmentDocument, EnvironmentKind,
    EnvironmentMetadata, EnvironmentObject, EnvironmentOptions, GoogleOptions,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};

pub const ENVIRONMENT_RESOURCE: &str = "snyk_environment";

/// State of a `snyk_environment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn label(kind: EnvironmentKind) -> &'static str {
    match kind {
        EnvironmentKind::Aws => "AWS",
        EnvironmentKind::Azure => "Azure",
        EnvironmentKind::Google => "Google",
    }
}

/// `(attribute, value)` pairs that must all be non-blank.
fn required_fields(options: &EnvironmentOptions) -> Vec<(&'static str, &str)> {
    match options {
        EnvironmentOptions::Aws(o) => vec![("role_arn", o.role_arn.as_str())],
        EnvironmentOptions::Azure(o) => vec![
            ("application_id", o.application_id.as_str()),
            ("tenant_id", o.tenant_id.as_str()),
            ("subscription_id", o.subscription_id.as_str()),
        ],
        EnvironmentOptions::Google(o) => vec![
            ("project_id", o.project_id.as_str()),
            ("service_account_email", o.service_account_email.as_str()),
        ],
    }
}

impl EnvironmentModel {
    fn block_present(&self, kind: EnvironmentKind) -> bool {
        match kind {
            EnvironmentKind::Aws => self.aws.is_some(),
            EnvironmentKind::Azure => self.azure.is_some(),
            EnvironmentKind::Google => self.google.is_some(),
        }
    }

    /// The configured block for `kind`.
    pub fn options(&self, kind: EnvironmentKind) -> Option<EnvironmentOptions> {
        match kind {
            EnvironmentKind::Aws => self.aws.clone().map(Into::into),
            EnvironmentKind::Azure => self.azure.clone().map(Into::into),
            EnvironmentKind::Google => self.google.clone().map(Into::into),
        }
    }

    fn set_options(&mut self, options: EnvironmentOptions) {
        self.aws = None;
        self.azure = None;
        self.google = None;
        match options {
            EnvironmentOptions::Aws(o) => self.aws = Some(o),
            EnvironmentOptions::Azure(o) => self.azure = Some(o),
            EnvironmentOptions::Google(o) => self.google = Some(o),
        }
    }

    /// Local checks on kind and option blocks.
    pub fn check_kind_configuration(&self) -> Vec<Diagnostic> {
        let kind = match self.kind.parse::<EnvironmentKind>() {
            Ok(kind) => kind,
            Err(err) => return vec![config_error("kind", err.message())],
        };

        let others: Vec<&str> = EnvironmentKind::ALL
            .into_iter()
            .filter(|other| *other != kind && self.block_present(*other))
            .map(label)
            .collect();
        if !others.is_empty() {
            return vec![config_error(
                kind.as_str(),
                format!(
                    "Invalid configuration, {} configurations should be empty when using {}",
                    others.join(" and "),
                    label(kind)
                ),
            )];
        }

        let options = self.options(kind).unwrap_or_else(|| EnvironmentOptions::empty(kind));
        required_fields(&options)
            .into_iter()
            .filter(|(_, value)| is_blank(value))
            .map(|(field, _)| {
                config_error(
                    &format!("{}.{}", kind.as_str(), field),
                    format!(
                        "Unable to read {kind} {field}. A valid {kind} {field} should be provided.",
                        kind = label(kind),
                        field = field
                    ),
                )
            })
            .collect()
    }

    /// Body of a create or update request.
    pub fn request(&self) -> Result<EnvironmentDocument, ProviderError> {
        let kind = self.kind.parse::<EnvironmentKind>()?;
        let options = self.options(kind).ok_or_else(|| {
            ProviderError::Validation(format!("no {} block configured", kind.as_str()))
        })?;
        let name = self.name.clone().unwrap_or_default();
        Ok(EnvironmentDocument::request(EnvironmentAttributes::new(name, options)))
    }

    fn apply_metadata(&mut self, metadata: &EnvironmentMetadata) {
        if metadata.status.is_some() {
            self.status = metadata.status.clone();
        }
        if metadata.revision.is_some() {
            self.revision = metadata.revision;
        }
        if metadata.native_id.is_some() {
            self.native_id = metadata.native_id.clone();
        }
        if metadata.created_at.is_some() {
            self.created_at = metadata.created_at.clone();
        }
        if metadata.updated_at.is_some() {
            self.updated_at = metadata.updated_at.clone();
        }
    }

    /// Overwrite local fields with the remote object.
    ///
    /// When the server omits options, the block already in state is kept.
    pub fn refresh(&mut self, remote: &EnvironmentObject) -> Result<(), ProviderError> {
        let attributes = &remote.attributes;
        let kind = attributes.known_kind().ok_or_else(|| {
            ProviderError::Validation(format!(
                "Invalid kind {:?} in remote state, known kinds are [aws,azure,google]",
                attributes.kind
            ))
        })?;

        if !remote.id.is_empty() {
            self.id = Some(remote.id.clone());
        }
        self.name = Some(attributes.name.clone()).filter(|name| !name.is_empty());
        self.kind = kind.as_str().to_string();

        match &attributes.options {
            Some(options) => self.set_options(options.clone()),
            None => {
                if let Some(kept) = self.options(kind) {
                    self.set_options(kept);
                } else {
                    self.aws = None;
                    self.azure = None;
                    self.google = None;
                }
            }
        }

        self.apply_metadata(&attributes.metadata);
        Ok(())
    }
}

pub struct EnvironmentResource;

fn options_block(fields: &[(&str, &str)]) -> NestedBlock {
    let block = fields.iter().fold(Block::new(), |block, (name, description)| {
        block.with_attribute(*name, Attribute::optional_string().with_description(*description))
    });
    NestedBlock::single(block)
}

#[async_trait::async_trait]
impl Resource for EnvironmentResource {
    fn type_name(&self) -> &'static str {
        ENVIRONMENT_RESOURCE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_description("Provides Snyk Cloud Environments")
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Snyk Environment ID"),
            )
            .with_attribute(
                "organization_id",
                Attribute::required_string()
                    .with_description("Snyk Organization GUID")
                    .with_force_new(),
            )
            .with_attribute(
                "name",
                Attribute::optional_computed_string().with_description("User assigned name"),
            )
            .with_attribute(
                "kind",
                Attribute::required_string()
                    .with_description("One of [aws,azure,google]")
                    .with_force_new(),
            )
            .with_attribute("status", Attribute::computed_string())
            .with_attribute("revision", Attribute::computed_int64())
            .with_attribute("native_id", Attribute::computed_string())
            .with_attribute("created_at", Attribute::computed_string())
            .with_attribute("updated_at", Attribute::computed_string())
            .with_block(
                "aws",
                options_block(&[("role_arn", "ARN of the AWS role created for Snyk Cloud")]),
            )
            .with_block(
                "azure",
                options_block(&[
                    ("application_id", "ID of the Azure app registration with permissions to scan"),
                    ("subscription_id", "ID of the Azure subscription to be scanned"),
                    ("tenant_id", "Azure Tenant (directory) ID"),
                ]),
            )
            .with_block(
                "google",
                options_block(&[
                    ("project_id", "Google project ID"),
                    ("service_account_email", "Google service account email"),
                ]),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let model: EnvironmentModel = match serde_json::from_value(config.clone()) {
            Ok(model) => model,
            Err(err) => return vec![Diagnostic::error("Configuration Error").with_detail(err.to_string())],
        };

        let mut diagnostics = Vec::new();
        if let Some(diag) = check_uuid("organization_id", "Environment Organization", &model.organization_id) {
            diagnostics.push(diag);
        }
        diagnostics.extend(model.check_kind_configuration());
        diagnostics
    }

    async fn create(&self, client: &SnykClient, planned: Value) -> Result<Value, ProviderError> {
        let mut model: EnvironmentModel = decode_state(planned)?;
        let request = model.request()?;

        let created = client
            .cloud
            .create_environment(&model.organization_id, &request)
            .await?;

        model.id = Some(created.data.id.clone());
        model.apply_metadata(&created.data.attributes.metadata);
        encode_state(&model)
    }

    async fn read(&self, client: &SnykClient, current: Value) -> Result<Value, ProviderError> {
        let id = state_str(&current, "id")?.to_string();
        let mut model: EnvironmentModel = decode_state(current)?;

        let remote = client
            .cloud
            .get_environment(&model.organization_id, &id)
            .await?;
        model.refresh(&remote)?;
        encode_state(&model)
    }

    async fn update(
        &self,
        client: &SnykClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let id = state_str(&prior, "id")?.to_string();
        let mut model: EnvironmentModel = decode_state(planned)?;
        let request = model.request()?;

        let updated = client
            .cloud
            .update_environment(&model.organization_id, &id, &request)
            .await?;

        model.id = Some(id);
        model.apply_metadata(&updated.data.attributes.metadata);
        encode_state(&model)
    }

    async fn delete(&self, client: &SnykClient, current: Value) -> Result<(), ProviderError> {
        let org_id = state_str(&current, "organization_id")?;
        let id = state_str(&current, "id")?;
        client.cloud.delete_environment(org_id, id).await
    }

    /// Import ids take the form `<organization_id>/<environment_id>`.
    async fn import(&self, client: &SnykClient, id: &str) -> Result<Value, ProviderError> {
        let (org_id, environment_id) = id
            .split_once('/')
            .filter(|(org, env)| !org.is_empty() && !env.is_empty() && !env.contains(['/', '?', '#']))
            .ok_or_else(|| {
                ProviderError::InvalidRequest(format!(
                    "invalid import id {:?}, expected <organization_id>/<environment_id>",
                    id
                ))
            })?;
        ensure_import_uuid("organization id", org_id)?;
        debug!(org_id, environment_id, "importing environment");

        let remote = client.cloud.get_environment(org_id, environment_id).await?;
        let mut model = EnvironmentModel {
            id: Some(environment_id.to_string()),
            organization_id: org_id.to_string(),
            ..Default::default()
        };
        model.refresh(&remote)?;
        encode_state(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORG: &str = "5f6e3d4b-2a1c-4b8e-9f0a-1b2c3d4e5f60";

    fn details(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics.iter().filter_map(|d| d.detail.clone()).collect()
    }

    #[test]
    fn test_validate_accepts_each_kind() {
        let resource = EnvironmentResource;
        for config in [
            json!({"organization_id": ORG, "kind": "aws", "aws": {"role_arn": "arn"}}),
            json!({"organization_id": ORG, "kind": "azure", "azure": {
                "application_id": "a", "subscription_id": "s", "tenant_id": "t"
            }}),
            json!({"organization_id": ORG, "kind": "google", "google": {
                "project_id": "p", "service_account_email": "e"
            }}),
        ] {
            assert!(resource.validate(&config).is_empty(), "{config}");
        }
    }

    #[test]
    fn test_validate_unknown_kind() {
        let diags = EnvironmentResource.validate(&json!({"organization_id": ORG, "kind": "oracle"}));
        assert_eq!(diags.len(), 1);
        assert!(details(&diags)[0].contains("Kind should be one of [aws,azure,google]"));
    }

    #[test]
    fn test_validate_bad_organization_id() {
        let diags = EnvironmentResource.validate(&json!({
            "organization_id": "nope", "kind": "aws", "aws": {"role_arn": "arn"}
        }));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("organization_id"));
    }

    #[test]
    fn test_validate_blank_fields() {
        let diags = EnvironmentResource.validate(&json!({
            "organization_id": ORG, "kind": "azure", "azure": {"application_id": "a", "tenant_id": " "}
        }));
        let attrs: Vec<_> = diags.iter().filter_map(|d| d.attribute.clone()).collect();
        assert_eq!(attrs, vec!["azure.tenant_id", "azure.subscription_id"]);

        let diags = EnvironmentResource.validate(&json!({"organization_id": ORG, "kind": "aws"}));
        assert!(details(&diags)[0].contains("Unable to read AWS role_arn"));
    }

    #[test]
    fn test_validate_other_blocks_must_be_absent() {
        let diags = EnvironmentResource.validate(&json!({
            "organization_id": ORG,
            "kind": "google",
            "google": {"project_id": "p", "service_account_email": "e"},
            "aws": {"role_arn": "arn"},
            "azure": {}
        }));
        assert_eq!(diags.len(), 1);
        assert_eq!(
            details(&diags)[0],
            "Invalid configuration, AWS and Azure configurations should be empty when using Google"
        );
    }

    #[test]
    fn test_request_uses_matching_block() {
        let model = EnvironmentModel {
            organization_id: ORG.into(),
            name: Some("prod".into()),
            kind: "aws".into(),
            aws: Some(AwsOptions {
                role_arn: "arn".into(),
            }),
            ..Default::default()
        };
        let request = model.request().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap()["data"]["attributes"],
            json!({"kind": "aws", "name": "prod", "options": {"role_arn": "arn"}})
        );
    }

    #[test]
    fn test_refresh_keeps_block_when_options_omitted() {
        let mut model = EnvironmentModel {
            organization_id: ORG.into(),
            kind: "aws".into(),
            aws: Some(AwsOptions {
                role_arn: "arn".into(),
            }),
            ..Default::default()
        };
        let remote: EnvironmentObject = serde_json::from_value(json!({
            "id": "env-1",
            "attributes": {"kind": "aws", "name": "prod", "status": "success"}
        }))
        .unwrap();

        model.refresh(&remote).unwrap();
        assert_eq!(model.id.as_deref(), Some("env-1"));
        assert_eq!(model.name.as_deref(), Some("prod"));
        assert_eq!(model.aws.unwrap().role_arn, "arn");
        assert_eq!(model.status.as_deref(), Some("success"));
    }

    #[test]
    fn test_server_assigned_name_is_stable() {
        let config = json!({"organization_id": ORG, "kind": "aws", "aws": {"role_arn": "arn"}});
        let mut prior = config.clone();
        prior["id"] = json!("env-1");
        prior["name"] = json!("aws-123456789012");

        let result = crate::provider::plan::plan(&EnvironmentResource.schema(), Some(&prior), &config);
        assert!(!result.has_changes());
        assert_eq!(result.planned_state["name"], "aws-123456789012");
    }

    #[test]
    fn test_refresh_rejects_unknown_kind() {
        let mut model = EnvironmentModel::default();
        let remote: EnvironmentObject = serde_json::from_value(json!({
            "id": "env-1",
            "attributes": {"kind": "oracle", "name": "x"}
        }))
        .unwrap();
        assert!(model.refresh(&remote).is_err());
    }
}
