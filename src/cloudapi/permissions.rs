//! Cloud permissions endpoint.
//!
//! Returns the template (for example a CloudFormation document) that grants
//! Snyk the access it needs to scan an account.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::CloudApi;
use crate::client::{decode, ApiRequest};
use crate::error::ProviderError;

/// API version of the permissions endpoint.
pub const PERMISSIONS_VERSION: &str = "2022-04-13~experimental";

/// Which template to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsRequest {
    /// Cloud platform, e.g. `aws`.
    pub platform: String,
    /// Template format, e.g. `cf`.
    #[serde(rename = "type")]
    pub template_type: String,
}

impl PermissionsRequest {
    pub fn new(platform: impl Into<String>, template_type: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            template_type: template_type.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PermissionsEnvelope<'a> {
    data: PermissionsRequestObject<'a>,
}

#[derive(Debug, Serialize)]
struct PermissionsRequestObject<'a> {
    attributes: &'a PermissionsRequest,
    #[serde(rename = "type")]
    object_type: &'static str,
}

/// Attributes of a permissions response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsAttributes {
    /// The opaque template body.
    #[serde(default)]
    pub data: String,
}

/// A permissions resource object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsObject {
    #[serde(rename = "type", default)]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<PermissionsAttributes>,
}

impl PermissionsObject {
    /// The template body, empty if the server sent none.
    pub fn data(&self) -> &str {
        self.attributes.as_ref().map(|a| a.data.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct PermissionsDocument {
    data: PermissionsObject,
}

impl CloudApi {
    /// Generate a permissions template. Expects `200 OK`.
    #[instrument(skip(self, request), fields(platform = %request.platform, template_type = %request.template_type))]
    pub async fn get_permissions(
        &self,
        org_id: &str,
        request: &PermissionsRequest,
    ) -> Result<PermissionsObject, ProviderError> {
        let envelope = PermissionsEnvelope {
            data: PermissionsRequestObject {
                attributes: request,
                object_type: "permission",
            },
        };
        let call = ApiRequest::post(format!("/rest/orgs/{}/cloud/permissions", org_id))
            .version(PERMISSIONS_VERSION)
            .expect(reqwest::StatusCode::OK)
            .json(&envelope)?;
        let body = self.api.execute(call).await?;
        let document: PermissionsDocument = decode(&body)?;
        Ok(document.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::api_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_permissions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/orgs/org-1/cloud/permissions"))
            .and(query_param("version", PERMISSIONS_VERSION))
            .and(body_json(json!({
                "data": {"attributes": {"platform": "aws", "type": "cf"}, "type": "permission"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"type": "permission", "attributes": {"data": "AWSTemplateFormatVersion: 2010-09-09"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let permissions = CloudApi::new(api_client(&server))
            .get_permissions("org-1", &PermissionsRequest::new("aws", "cf"))
            .await
            .unwrap();
        assert_eq!(permissions.object_type, "permission");
        assert_eq!(permissions.data(), "AWSTemplateFormatVersion: 2010-09-09");
    }

    #[tokio::test]
    async fn test_get_permissions_requires_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"type": "permission"}})))
            .mount(&server)
            .await;

        let err = CloudApi::new(api_client(&server))
            .get_permissions("org-1", &PermissionsRequest::new("aws", "cf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedStatus { status: 201, .. }));
    }

    #[test]
    fn test_missing_attributes_yield_empty_data() {
        let object: PermissionsObject = serde_json::from_value(json!({"type": "permission"})).unwrap();
        assert_eq!(object.data(), "");
    }
}
