//! Organization service-account endpoints.
//!
//! The secret API key is only returned by the create call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::OrganizationApi;
use crate::client::{decode, ApiRequest};
use crate::error::ProviderError;

/// API version of the service-account endpoints.
pub const SERVICE_ACCOUNTS_VERSION: &str = "2022-09-15~experimental";

/// How a service account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// A long-lived API key, returned once at creation.
    ApiKey,
    /// OAuth 2.0 client credentials with a private-key JWT.
    OauthPrivateKeyJwt,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::OauthPrivateKeyJwt => "oauth_private_key_jwt",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api_key" => Ok(Self::ApiKey),
            "oauth_private_key_jwt" => Ok(Self::OauthPrivateKeyJwt),
            other => Err(ProviderError::Validation(format!(
                "Unable to parse auth_type {:?}. auth_type should be one of [api_key,oauth_private_key_jwt]",
                other
            ))),
        }
    }
}

/// Attributes of a service-account create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_ttl_seconds: Option<i64>,
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<String>,
    pub name: String,
    pub role_id: String,
}

impl ServiceAccountRequest {
    pub fn new(name: impl Into<String>, role_id: impl Into<String>, auth_type: AuthType) -> Self {
        Self {
            access_token_ttl_seconds: None,
            auth_type,
            jwks_url: None,
            name: name.into(),
            role_id: role_id.into(),
        }
    }

    pub fn with_jwks_url(mut self, jwks_url: impl Into<String>) -> Self {
        self.jwks_url = Some(jwks_url.into());
        self
    }

    pub fn with_access_token_ttl_seconds(mut self, ttl: i64) -> Self {
        self.access_token_ttl_seconds = Some(ttl);
        self
    }
}

#[derive(Debug, Serialize)]
struct ServiceAccountEnvelope<'a> {
    data: ServiceAccountRequestObject<'a>,
}

#[derive(Debug, Serialize)]
struct ServiceAccountRequestObject<'a> {
    attributes: &'a ServiceAccountRequest,
    #[serde(rename = "type")]
    object_type: &'static str,
}

/// A created service account.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServiceAccount {
    pub id: String,
    pub name: String,
    pub role_id: String,
    pub auth_type: String,
    /// Secret key for `api_key` accounts; empty otherwise.
    pub api_key: String,
    /// OAuth client id for `oauth_private_key_jwt` accounts.
    pub client_id: String,
    pub jwks_url: String,
    pub access_token_ttl_seconds: Option<i64>,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role_id", &self.role_id)
            .field("auth_type", &self.auth_type)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccountDocument {
    data: ServiceAccountObject,
}

#[derive(Debug, Deserialize)]
struct ServiceAccountObject {
    id: String,
    #[serde(default)]
    attributes: ServiceAccountAttributes,
}

#[derive(Default, Deserialize)]
struct ServiceAccountAttributes {
    #[serde(default)]
    name: String,
    #[serde(default)]
    role_id: String,
    #[serde(default)]
    auth_type: String,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    jwks_url: String,
    #[serde(default)]
    access_token_ttl_seconds: Option<i64>,
}

impl fmt::Debug for ServiceAccountAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountAttributes")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl From<ServiceAccountDocument> for ServiceAccount {
    fn from(document: ServiceAccountDocument) -> Self {
        let attributes = document.data.attributes;
        Self {
            id: document.data.id,
            name: attributes.name,
            role_id: attributes.role_id,
            auth_type: attributes.auth_type,
            api_key: attributes.api_key,
            client_id: attributes.client_id,
            jwks_url: attributes.jwks_url,
            access_token_ttl_seconds: attributes.access_token_ttl_seconds,
        }
    }
}

fn service_accounts_path(org_id: &str) -> String {
    format!("/rest/orgs/{}/service_accounts", org_id)
}

impl OrganizationApi {
    /// Create a service account. Expects `201 Created`.
    #[instrument(skip(self, request), fields(name = %request.name, auth_type = %request.auth_type))]
    pub async fn create_service_account(
        &self,
        org_id: &str,
        request: &ServiceAccountRequest,
    ) -> Result<ServiceAccount, ProviderError> {
        let envelope = ServiceAccountEnvelope {
            data: ServiceAccountRequestObject {
                attributes: request,
                object_type: "service_account",
            },
        };
        let call = ApiRequest::post(service_accounts_path(org_id))
            .version(SERVICE_ACCOUNTS_VERSION)
            .json(&envelope)?;
        let body = self.api.execute(call).await?;
        let document: ServiceAccountDocument = decode(&body)?;
        let account = ServiceAccount::from(document);
        debug!(service_account_id = %account.id, "service account created");
        Ok(account)
    }

    /// Delete a service account. Expects `204 No Content`.
    #[instrument(skip(self))]
    pub async fn delete_service_account(
        &self,
        org_id: &str,
        service_account_id: &str,
    ) -> Result<(), ProviderError> {
        let call = ApiRequest::delete(format!(
            "/v1/orgs/{}/service_accounts/{}",
            org_id, service_account_id
        ));
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
    fn test_auth_type_parsing() {
        assert_eq!("api_key".parse::<AuthType>().unwrap(), AuthType::ApiKey);
        assert_eq!(
            "oauth_private_key_jwt".parse::<AuthType>().unwrap(),
            AuthType::OauthPrivateKeyJwt
        );
        assert!("password".parse::<AuthType>().is_err());
        assert_eq!(
            serde_json::to_value(AuthType::OauthPrivateKeyJwt).unwrap(),
            json!("oauth_private_key_jwt")
        );
    }

    #[tokio::test]
    async fn test_create_service_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/orgs/org-1/service_accounts"))
            .and(query_param("version", SERVICE_ACCOUNTS_VERSION))
            .and(body_json(json!({
                "data": {
                    "type": "service_account",
                    "attributes": {
                        "auth_type": "api_key",
                        "name": "ci",
                        "role_id": "role-1"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {
                    "id": "sa-1",
                    "type": "service_account",
                    "attributes": {
                        "auth_type": "api_key",
                        "name": "ci",
                        "role_id": "role-1",
                        "api_key": "s3cr3t"
                    }
                },
                "jsonapi": {"version": "1.0"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let account = orgs(&server)
            .create_service_account(
                "org-1",
                &ServiceAccountRequest::new("ci", "role-1", AuthType::ApiKey),
            )
            .await
            .unwrap();
        assert_eq!(account.id, "sa-1");
        assert_eq!(account.api_key, "s3cr3t");
        assert!(!format!("{:?}", account).contains("s3cr3t"));
    }

    #[tokio::test]
    async fn test_create_oauth_service_account_sends_optional_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "data": {
                    "type": "service_account",
                    "attributes": {
                        "access_token_ttl_seconds": 3600,
                        "auth_type": "oauth_private_key_jwt",
                        "jwks_url": "https://example.com/jwks.json",
                        "name": "oauth",
                        "role_id": "role-1"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "sa-2", "attributes": {"client_id": "client-9"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ServiceAccountRequest::new("oauth", "role-1", AuthType::OauthPrivateKeyJwt)
            .with_jwks_url("https://example.com/jwks.json")
            .with_access_token_ttl_seconds(3600);
        let account = orgs(&server)
            .create_service_account("org-1", &request)
            .await
            .unwrap();
        assert_eq!(account.client_id, "client-9");
        assert!(account.api_key.is_empty());
    }

    #[tokio::test]
    async fn test_create_service_account_error_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("role not found"))
            .mount(&server)
            .await;

        let err = orgs(&server)
            .create_service_account(
                "org-1",
                &ServiceAccountRequest::new("ci", "missing", AuthType::ApiKey),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("role not found"));
    }

    #[tokio::test]
    async fn test_delete_service_account_sends_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/orgs/org-1/service_accounts/sa-1"))
            .and(header("authorization", "token test-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        orgs(&server).delete_service_account("org-1", "sa-1").await.unwrap();
    }
}
