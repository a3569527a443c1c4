//! Organization endpoints.
//!
//! Creation and deletion still go through the v1 API; reads use the REST API.
//! There is no update endpoint.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::OrganizationApi;
use crate::client::{decode, ApiRequest, MediaType};
use crate::error::ProviderError;

/// API version of the organization endpoints.
pub const ORGANIZATIONS_VERSION: &str = "2023-09-20";

/// Body of `POST /v1/org`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_id: String,
    /// Organization whose settings are copied into the new one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_org_id: String,
}

impl OrganizationRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn with_source_org_id(mut self, source_org_id: impl Into<String>) -> Self {
        self.source_org_id = source_org_id.into();
        self
    }
}

/// Group reference in a v1 organization response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Response of `POST /v1/org`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationResponseV1 {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub group: Option<OrganizationGroup>,
}

/// An organization as read from the REST API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
struct OrganizationDocument {
    data: OrganizationObject,
}

#[derive(Debug, Deserialize)]
struct OrganizationObject {
    id: String,
    #[serde(default)]
    attributes: OrganizationAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct OrganizationAttributes {
    #[serde(default)]
    name: String,
    #[serde(default)]
    group_id: Option<String>,
}

impl From<OrganizationDocument> for Organization {
    fn from(document: OrganizationDocument) -> Self {
        Self {
            id: document.data.id,
            name: document.data.attributes.name,
            group_id: document.data.attributes.group_id.unwrap_or_default(),
        }
    }
}

impl OrganizationApi {
    /// Create an organization. Expects `201 Created`.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_organization(
        &self,
        request: &OrganizationRequest,
    ) -> Result<OrganizationResponseV1, ProviderError> {
        let call = ApiRequest::post("/v1/org")
            .version(ORGANIZATIONS_VERSION)
            .media_type(MediaType::Json)
            .json(request)?;
        let body = self.api.execute(call).await?;
        let created: OrganizationResponseV1 = decode(&body)?;
        debug!(organization_id = %created.id, "organization created");
        Ok(created)
    }

    /// Read an organization. Expects `200 OK`.
    #[instrument(skip(self))]
    pub async fn get_organization(&self, org_id: &str) -> Result<Organization, ProviderError> {
        let call = ApiRequest::get(format!("/rest/orgs/{}", org_id)).version(ORGANIZATIONS_VERSION);
        let body = self.api.execute(call).await?;
        let document: OrganizationDocument = decode(&body)?;
        Ok(document.into())
    }

    /// Delete an organization. Expects `204 No Content`.
    #[instrument(skip(self))]
    pub async fn delete_organization(&self, org_id: &str) -> Result<(), ProviderError> {
        let call = ApiRequest::delete(format!("/v1/org/{}", org_id)).media_type(MediaType::Json);
        self.api.execute(call).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::api_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn orgs(server: &MockServer) -> OrganizationApi {
        OrganizationApi::new(api_client(server))
    }

    #[test]
    fn test_request_encoding() {
        let request = OrganizationRequest::new("acme")
            .with_group_id("g-1")
            .with_source_org_id("o-1");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"name": "acme", "groupId": "g-1", "sourceOrgId": "o-1"})
        );
        assert_eq!(
            serde_json::to_value(OrganizationRequest::new("solo")).unwrap(),
            json!({"name": "solo"})
        );
    }

    #[tokio::test]
    async fn test_create_organization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/org"))
            .and(query_param("version", ORGANIZATIONS_VERSION))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "acme", "groupId": "g-1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "org-1",
                "name": "acme",
                "slug": "acme",
                "url": "https://app.snyk.io/org/acme",
                "created": "2023-10-01T00:00:00.000Z",
                "group": {"id": "g-1", "name": "Group"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = orgs(&server)
            .create_organization(&OrganizationRequest::new("acme").with_group_id("g-1"))
            .await
            .unwrap();
        assert_eq!(created.id, "org-1");
        assert_eq!(created.group.unwrap().id, "g-1");
    }

    #[tokio::test]
    async fn test_create_organization_error_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("name is taken"))
            .mount(&server)
            .await;

        let err = orgs(&server)
            .create_organization(&OrganizationRequest::new("acme"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("name is taken"));
    }

    #[tokio::test]
    async fn test_get_organization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/orgs/org-1"))
            .and(query_param("version", ORGANIZATIONS_VERSION))
            .and(header("content-type", "application/vnd.api+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonapi": {"version": "1.0"},
                "data": {
                    "type": "org",
                    "id": "org-1",
                    "attributes": {"name": "acme", "slug": "acme", "is_personal": false, "group_id": "g-1"}
                },
                "links": {"self": "/orgs/org-1"}
            })))
            .mount(&server)
            .await;

        let org = orgs(&server).get_organization("org-1").await.unwrap();
        assert_eq!(
            org,
            Organization {
                id: "org-1".into(),
                name: "acme".into(),
                group_id: "g-1".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_delete_organization_without_version() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/org/org-1"))
            .and(header("authorization", "token test-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        orgs(&server).delete_organization("org-1").await.unwrap();

        let received = &server.received_requests().await.unwrap()[0];
        assert!(received.url.query().is_none());
    }

    #[tokio::test]
    async fn test_delete_organization_names_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = orgs(&server).delete_organization("org-1").await.unwrap_err();
        assert!(err.message().contains("500"));
    }
}
