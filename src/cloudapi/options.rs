//! Kind-tagged environment options.
//!
//! On the wire an environment carries a `kind` string and a generic `options`
//! object whose shape depends on that kind. Here the pairing is a closed sum
//! type: an [`EnvironmentOptions`] value always knows its own kind, so two
//! option shapes can never be set at once.
//!
//! The raw `kind` string is kept on [`EnvironmentAttributes`] so that kinds
//! unknown to this crate survive decoding; for those, options are dropped.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ProviderError;

/// Cloud provider an environment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    Aws,
    Azure,
    Google,
}

impl EnvironmentKind {
    /// Every known kind, in documentation order.
    pub const ALL: [EnvironmentKind; 3] = [Self::Aws, Self::Azure, Self::Google];

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Google => "google",
        }
    }

    /// Parse a wire name; `None` for anything unknown.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "aws" => Some(Self::Aws),
            "azure" => Some(Self::Azure),
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            ProviderError::Validation(
                "Unable to parse Environment kind. Kind should be one of [aws,azure,google]"
                    .to_string(),
            )
        })
    }
}

/// Options for an AWS account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsOptions {
    /// ARN of the role Snyk assumes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role_arn: String,
}

/// Options for an Azure subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subscription_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
}

/// Options for a Google Cloud project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account_email: String,
}

/// Exactly one provider-specific options shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnvironmentOptions {
    Aws(AwsOptions),
    Azure(AzureOptions),
    Google(GoogleOptions),
}

impl EnvironmentOptions {
    /// Kind these options belong to.
    pub fn kind(&self) -> EnvironmentKind {
        match self {
            Self::Aws(_) => EnvironmentKind::Aws,
            Self::Azure(_) => EnvironmentKind::Azure,
            Self::Google(_) => EnvironmentKind::Google,
        }
    }

    /// Empty options of the given kind.
    pub fn empty(kind: EnvironmentKind) -> Self {
        match kind {
            EnvironmentKind::Aws => Self::Aws(AwsOptions::default()),
            EnvironmentKind::Azure => Self::Azure(AzureOptions::default()),
            EnvironmentKind::Google => Self::Google(GoogleOptions::default()),
        }
    }

    /// Decode a raw `options` payload as the shape selected by `kind`.
    ///
    /// An absent or `null` payload yields `None`.
    pub fn decode(kind: EnvironmentKind, raw: Option<&Value>) -> Result<Option<Self>, serde_json::Error> {
        let raw = match raw {
            None | Some(Value::Null) => return Ok(None),
            Some(raw) => raw,
        };
        let options = match kind {
            EnvironmentKind::Aws => Self::Aws(AwsOptions::deserialize(raw)?),
            EnvironmentKind::Azure => Self::Azure(AzureOptions::deserialize(raw)?),
            EnvironmentKind::Google => Self::Google(GoogleOptions::deserialize(raw)?),
        };
        Ok(Some(options))
    }

    pub fn aws(&self) -> Option<&AwsOptions> {
        match self {
            Self::Aws(options) => Some(options),
            _ => None,
        }
    }

    pub fn azure(&self) -> Option<&AzureOptions> {
        match self {
            Self::Azure(options) => Some(options),
            _ => None,
        }
    }

    pub fn google(&self) -> Option<&GoogleOptions> {
        match self {
            Self::Google(options) => Some(options),
            _ => None,
        }
    }
}

impl From<AwsOptions> for EnvironmentOptions {
    fn from(options: AwsOptions) -> Self {
        Self::Aws(options)
    }
}

impl From<AzureOptions> for EnvironmentOptions {
    fn from(options: AzureOptions) -> Self {
        Self::Azure(options)
    }
}

impl From<GoogleOptions> for EnvironmentOptions {
    fn from(options: GoogleOptions) -> Self {
        Self::Google(options)
    }
}

/// Server-owned environment metadata. Never sent by this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

/// The `attributes` object of an environment document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentAttributes {
    /// Raw discriminator as sent or received.
    pub kind: String,
    pub name: String,
    /// `None` when the kind is unknown or the server sent no options.
    pub options: Option<EnvironmentOptions>,
    pub metadata: EnvironmentMetadata,
}

impl EnvironmentAttributes {
    /// Attributes for a known kind, taken from the options themselves.
    pub fn new(name: impl Into<String>, options: EnvironmentOptions) -> Self {
        Self {
            kind: options.kind().as_str().to_string(),
            name: name.into(),
            options: Some(options),
            metadata: EnvironmentMetadata::default(),
        }
    }

    /// Parsed kind, if known.
    pub fn known_kind(&self) -> Option<EnvironmentKind> {
        EnvironmentKind::parse(&self.kind)
    }
}

#[derive(Serialize)]
struct WireAttributesRef<'a> {
    kind: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a EnvironmentOptions>,
    #[serde(flatten)]
    metadata: &'a EnvironmentMetadata,
}

#[derive(Deserialize)]
struct WireAttributes {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    options: Option<Value>,
    #[serde(flatten)]
    metadata: EnvironmentMetadata,
}

impl Serialize for EnvironmentAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let options = match (self.known_kind(), self.options.as_ref()) {
            (Some(kind), Some(options)) if options.kind() != kind => {
                return Err(S::Error::custom(format!(
                    "{} options cannot be sent for kind {}",
                    options.kind(),
                    kind
                )))
            }
            (Some(_), options) => options,
            (None, _) => None,
        };

        WireAttributesRef {
            kind: &self.kind,
            name: &self.name,
            options,
            metadata: &self.metadata,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EnvironmentAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireAttributes::deserialize(deserializer)?;
        let options = match EnvironmentKind::parse(&wire.kind) {
            Some(kind) => {
                EnvironmentOptions::decode(kind, wire.options.as_ref()).map_err(D::Error::custom)?
            }
            None => None,
        };

        Ok(Self {
            kind: wire.kind,
            name: wire.name,
            options,
            metadata: wire.metadata,
        })
    }
}
