//! Cloud environment endpoints.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::options::EnvironmentAttributes;
use super::CloudApi;
use crate::client::{decode, ApiRequest};
use crate::error::ProviderError;

/// API version of the environment endpoints.
pub const ENVIRONMENTS_VERSION: &str = "2022-12-21~beta";

/// JSON:API resource type of an environment.
pub const ENVIRONMENT_TYPE: &str = "environment";

/// A single environment resource object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub object_type: String,
    pub attributes: EnvironmentAttributes,
}

/// Request and response envelope: `{"data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDocument {
    pub data: EnvironmentObject,
}

impl EnvironmentDocument {
    /// Envelope for a create or update request.
    pub fn request(attributes: EnvironmentAttributes) -> Self {
        Self {
            data: EnvironmentObject {
                id: String::new(),
                object_type: ENVIRONMENT_TYPE.to_string(),
                attributes,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct EnvironmentCollection {
    #[serde(default)]
    data: Vec<EnvironmentObject>,
}

fn environments_path(org_id: &str) -> String {
    format!("/rest/orgs/{}/cloud/environments", org_id)
}

impl CloudApi {
    /// Register a new environment. Expects `201 Created`.
    #[instrument(skip(self, request), fields(kind = %request.data.attributes.kind))]
    pub async fn create_environment(
        &self,
        org_id: &str,
        request: &EnvironmentDocument,
    ) -> Result<EnvironmentDocument, ProviderError> {
        let call = ApiRequest::post(environments_path(org_id))
            .version(ENVIRONMENTS_VERSION)
            .json(request)?;
        let body = self.api.execute(call).await?;
        let created: EnvironmentDocument = decode(&body)?;
        debug!(environment_id = %created.data.id, "environment created");
        Ok(created)
    }

    /// Fetch one environment by id.
    ///
    /// The API only offers a filtered collection query; an empty result is
    /// reported as [`ProviderError::NotFound`].
    #[instrument(skip(self))]
    pub async fn get_environment(
        &self,
        org_id: &str,
        environment_id: &str,
    ) -> Result<EnvironmentObject, ProviderError> {
        let call = ApiRequest::get(environments_path(org_id))
            .query("id", environment_id)
            .version(ENVIRONMENTS_VERSION);
        let body = self.api.execute(call).await?;
        let collection: EnvironmentCollection = decode(&body)?;
        collection.data.into_iter().next().ok_or_else(|| {
            ProviderError::NotFound(format!(
                "environment {} not found in organization {}",
                environment_id, org_id
            ))
        })
    }

    /// Change the name or options of an environment. Expects `200 OK`.
    #[instrument(skip(self, request))]
    pub async fn update_environment(
        &self,
        org_id: &str,
        environment_id: &str,
        request: &EnvironmentDocument,
    ) -> Result<EnvironmentDocument, ProviderError> {
        let mut request = request.clone();
        request.data.id = environment_id.to_string();
        let call = ApiRequest::patch(format!("{}/{}", environments_path(org_id), environment_id))
            .version(ENVIRONMENTS_VERSION)
            .json(&request)?;
        let body = self.api.execute(call).await?;
        decode(&body)
    }

    /// Remove an environment. Expects `204 No Content`.
    #[instrument(skip(self))]
    pub async fn delete_environment(
        &self,
        org_id: &str,
        environment_id: &str,
    ) -> Result<(), ProviderError> {
        let call = ApiRequest::delete(format!("{}/{}", environments_path(org_id), environment_id))
            .version(ENVIRONMENTS_VERSION);
        self.api.execute(call).await?;
        Ok(())
    }
}
