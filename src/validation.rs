//! Schema validation of resource and provider configuration.
//!
//! Validation is local and synchronous: it runs before any API call and
//! reports every problem it finds as a [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use snyk_provider::schema::{Attribute, Schema};
//! use snyk_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::new()
//!     .with_attribute("platform", Attribute::required_string().with_one_of(["aws"]))
//!     .with_attribute("ttl", Attribute::optional_int64());
//!
//! assert!(validate(&schema, &json!({"platform": "aws", "ttl": 3600})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"platform": "gcp"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("platform".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes are skipped (the provider sets these)
/// - Attribute types must match, and `one_of` restricts string values
/// - Keys unknown to the schema are rejected
/// - Nested blocks are validated recursively; required blocks must be present
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Like [`validate`], returning `Err` with the diagnostics if there are any.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diag =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        }
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested, obj.get(name), &block_path, diagnostics);
    }

    for key in obj.keys() {
        if !block.attributes.contains_key(key) && !block.blocks.contains_key(key) {
            let key_path = join_path(path, key);
            diagnostics.push(
                Diagnostic::error(format!("Unsupported argument '{}'", key_path))
                    .with_detail("An argument with this name is not expected here")
                    .with_attribute(key_path),
            );
        }
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => {
            if !type_matches(attr.attr_type, v) {
                diagnostics.push(type_error(path, attr.attr_type, v));
                return;
            }
            if attr.one_of.is_empty() {
                return;
            }
            if let Some(s) = v.as_str() {
                if !attr.one_of.iter().any(|allowed| allowed == s) {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                            .with_detail(format!(
                                "Value must be one of [{}], got \"{}\"",
                                attr.one_of.join(","),
                                s
                            ))
                            .with_attribute(path),
                    );
                }
            }
        }
    }
}

/// An absent block is always allowed; a present one must match its schema.
fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Some(v) = value.filter(|v| !v.is_null()) {
        validate_block(&nested.block, v, path, diagnostics);
    }
}

fn type_matches(attr_type: AttributeType, value: &Value) -> bool {
    match attr_type {
        AttributeType::String => value.is_string(),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::Int64 => is_int64(value),
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() => true,
        Value::Number(n) => n
            .as_f64()
            .map(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
            .unwrap_or(false),
        _ => false,
    }
}

fn type_error(path: &str, expected: AttributeType, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!(
            "Expected {}, got {}",
            expected.as_str(),
            value_type_name(got)
        ))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Block, NestedBlock, Schema};
    use serde_json::json;

    fn environment_like() -> Schema {
        Schema::new()
            .with_attribute("kind", Attribute::required_string())
            .with_attribute("id", Attribute::computed_string())
            .with_block(
                "azure",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("tenant_id", Attribute::optional_string())
                        .with_attribute("application_id", Attribute::optional_string()),
                ),
            )
    }

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::new().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "prod"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_int64() {
        let schema = Schema::new().with_attribute("ttl", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"ttl": 3600})).is_empty());
        assert!(validate(&schema, &json!({"ttl": 3600.0})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"ttl": null})).is_empty());
        assert_eq!(validate(&schema, &json!({"ttl": 36.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"ttl": "3600"})).len(), 1);
    }

    #[test]
    fn test_validate_bool() {
        let schema = Schema::new().with_attribute("tls_skip_verify", Attribute::optional_bool());
        assert!(validate(&schema, &json!({"tls_skip_verify": true})).is_empty());
        assert_eq!(validate(&schema, &json!({"tls_skip_verify": "yes"})).len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::new().with_attribute("id", Attribute::computed_string());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_one_of() {
        let schema = Schema::new().with_attribute(
            "type",
            Attribute::required_string().with_one_of(["cf"]),
        );

        assert!(validate(&schema, &json!({"type": "cf"})).is_empty());

        let diagnostics = validate(&schema, &json!({"type": "tf"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].detail.as_deref().unwrap().contains("[cf]"));
    }

    #[test]
    fn test_validate_nested_block() {
        let schema = environment_like();

        let diagnostics = validate(
            &schema,
            &json!({"kind": "azure", "azure": {"tenant_id": "t", "application_id": "a"}}),
        );
        assert!(diagnostics.is_empty());

        let diagnostics = validate(&schema, &json!({"kind": "azure", "azure": {"tenant_id": 7}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("azure.tenant_id".to_string()));

        let diagnostics = validate(&schema, &json!({"kind": "azure", "azure": "nope"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Expected object");
    }

    #[test]
    fn test_validate_unknown_keys() {
        let schema = environment_like();
        let diagnostics = validate(&schema, &json!({"kind": "aws", "awz": {"role_arn": "x"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("awz".to_string()));

        let diagnostics = validate(
            &schema,
            &json!({"kind": "azure", "azure": {"subscription": "s"}}),
        );
        assert_eq!(diagnostics[0].attribute, Some("azure.subscription".to_string()));
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = Schema::new()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("role_id", Attribute::required_string());
        assert_eq!(validate(&schema, &json!({})).len(), 2);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::new().with_attribute("name", Attribute::required_string());
        let diagnostics = validate(&schema, &json!("a string"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].attribute.is_none());
    }

    #[test]
    fn test_helpers() {
        let schema = Schema::new().with_attribute("name", Attribute::required_string());
        assert!(is_valid(&schema, &json!({"name": "x"})));
        assert!(!is_valid(&schema, &json!({})));
        assert!(validate_result(&schema, &json!({"name": "x"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }
}
