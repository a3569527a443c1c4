//! Snyk organizations and their service accounts.

pub mod org;
pub mod service_account;

pub use org::{
    Organization, OrganizationGroup, OrganizationRequest, OrganizationResponseV1,
    ORGANIZATIONS_VERSION,
};
pub use service_account::{
    AuthType, ServiceAccount, ServiceAccountRequest, SERVICE_ACCOUNTS_VERSION,
};

use crate::client::ApiClient;

/// Client for organization and service-account endpoints.
#[derive(Debug, Clone)]
pub struct OrganizationApi {
    api: ApiClient,
}

impl OrganizationApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}
