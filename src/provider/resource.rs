//! The per-resource seam [`crate::provider::SnykProvider`] dispatches through.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::SnykClient;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

/// Lifecycle callbacks of one resource type.
///
/// States are JSON objects shaped by [`Resource::schema`]. Schema validation
/// has already passed when `validate`, `create` or `update` are called.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// Full resource type name, e.g. `snyk_environment`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Semantic checks beyond the schema. Must not touch the network.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    async fn create(&self, client: &SnykClient, planned: Value) -> Result<Value, ProviderError>;

    async fn read(&self, client: &SnykClient, current: Value) -> Result<Value, ProviderError>;

    async fn update(
        &self,
        client: &SnykClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    async fn delete(&self, client: &SnykClient, current: Value) -> Result<(), ProviderError>;

    /// Build a state from an import id.
    async fn import(&self, client: &SnykClient, id: &str) -> Result<Value, ProviderError> {
        let _ = (client, id);
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            self.type_name()
        )))
    }
}

pub(crate) fn decode_state<T: DeserializeOwned>(state: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(state)?)
}

pub(crate) fn encode_state<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

/// A configuration error diagnostic pinned to `attribute`.
pub(crate) fn config_error(attribute: &str, detail: impl Into<String>) -> Diagnostic {
    Diagnostic::error("Configuration Error")
        .with_detail(detail)
        .with_attribute(attribute)
}

/// Check that `value` is a UUID, naming `what` in the diagnostic.
pub(crate) fn check_uuid(attribute: &str, what: &str, value: &str) -> Option<Diagnostic> {
    uuid::Uuid::parse_str(value).err().map(|err| {
        config_error(
            attribute,
            format!("Unable to parse {} GUID {:?}, got error: {}", what, value, err),
        )
    })
}

/// Reject an import id segment that is not a UUID before it reaches a URL path.
pub(crate) fn ensure_import_uuid(what: &str, value: &str) -> Result<(), ProviderError> {
    uuid::Uuid::parse_str(value).map(|_| ()).map_err(|err| {
        ProviderError::InvalidRequest(format!(
            "invalid {} {:?} in import id: {}",
            what, value, err
        ))
    })
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Fold error diagnostics into a single validation error.
pub(crate) fn ensure_valid(diagnostics: Vec<Diagnostic>) -> Result<(), ProviderError> {
    let messages: Vec<String> = diagnostics
        .into_iter()
        .filter(Diagnostic::is_error)
        .map(|d| match d.detail {
            Some(detail) => format!("{}: {}", d.summary, detail),
            None => d.summary,
        })
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::Validation(messages.join("; ")))
    }
}

/// The non-empty string at `key` of a state object.
pub(crate) fn state_str<'a>(state: &'a Value, key: &str) -> Result<&'a str, ProviderError> {
    state
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::InvalidRequest(format!("state has no {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_uuid() {
        assert!(check_uuid("organization_id", "Organization", "5f6e3d4b-2a1c-4b8e-9f0a-1b2c3d4e5f60").is_none());
        let diag = check_uuid("organization_id", "Organization", "not-a-guid").unwrap();
        assert_eq!(diag.attribute.as_deref(), Some("organization_id"));
        assert!(diag.detail.unwrap().contains("not-a-guid"));
    }

    #[test]
    fn test_ensure_valid() {
        assert!(ensure_valid(vec![Diagnostic::warning("deprecated")]).is_ok());

        let err = ensure_valid(vec![
            config_error("name", "name must not be blank"),
            config_error("kind", "bad kind"),
        ])
        .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.message().contains("name must not be blank; Configuration Error: bad kind"));
    }

    #[test]
    fn test_ensure_import_uuid() {
        assert!(ensure_import_uuid("organization id", "5f6e3d4b-2a1c-4b8e-9f0a-1b2c3d4e5f60").is_ok());

        let err = ensure_import_uuid("organization id", "../v1/groups").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(err.message().contains("invalid organization id \"../v1/groups\""));
    }

    #[test]
    fn test_state_str() {
        let state = json!({"id": "x", "empty": ""});
        assert_eq!(state_str(&state, "id").unwrap(), "x");
        assert!(state_str(&state, "empty").is_err());
        assert!(state_str(&state, "missing").is_err());
        assert!(is_blank("  "));
    }
}
