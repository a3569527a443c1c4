//! Snyk Cloud API: environments and permissions templates.

pub mod environment;
pub mod options;
pub mod permissions;

pub use environment::{EnvironmentDocument, EnvironmentObject, ENVIRONMENTS_VERSION};
pub use options::{
    AwsOptions, AzureOptions, EnvironmentAttributes, EnvironmentKind, EnvironmentMetadata,
    EnvironmentOptions, GoogleOptions,
};
pub use permissions::{PermissionsObject, PermissionsRequest, PERMISSIONS_VERSION};

use crate::client::ApiClient;

/// Client for the `/rest/orgs/{org}/cloud` endpoints.
#[derive(Debug, Clone)]
pub struct CloudApi {
    api: ApiClient,
}

impl CloudApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}
