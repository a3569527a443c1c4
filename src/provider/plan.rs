//! Schema-driven planning shared by every resource.
//!
//! A plan compares the proposed state with the prior state over the
//! attributes and blocks the schema declares:
//!
//! - no prior state plans a create;
//! - a `null` proposed state plans a destroy;
//! - otherwise computed attributes left unset are carried over from the prior
//!   state, and a change to any `force_new` attribute requires replacement.

use serde_json::{Map, Value};

use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};

/// Plan the transition from `prior` to `proposed` for a resource with `schema`.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    match prior {
        None => plan_create(schema, proposed),
        Some(prior) if proposed.is_null() => plan_destroy(schema, prior),
        Some(prior) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: &Value) -> PlanResult {
    let changes = schema_keys(schema)
        .filter_map(|name| {
            present(proposed, name).map(|value| AttributeChange::added(name, value.clone()))
        })
        .collect();
    PlanResult::with_changes(proposed.clone(), changes, false)
}

fn plan_destroy(schema: &Schema, prior: &Value) -> PlanResult {
    let changes = schema_keys(schema)
        .filter_map(|name| {
            present(prior, name).map(|value| AttributeChange::removed(name, value.clone()))
        })
        .collect();
    PlanResult::with_changes(Value::Null, changes, false)
}

fn plan_update(schema: &Schema, prior: &Value, proposed: &Value) -> PlanResult {
    let mut planned = match proposed {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    for (name, attr) in &schema.block.attributes {
        if !attr.flags.computed || present(proposed, name).is_some() {
            continue;
        }
        if let Some(value) = present(prior, name) {
            planned.insert(name.clone(), value.clone());
        }
    }
    let planned = Value::Object(planned);

    let mut changes = Vec::new();
    let mut requires_replace = false;

    for name in schema_keys(schema) {
        let before = present(prior, name);
        let after = present(&planned, name);
        if before == after {
            continue;
        }

        if schema.attribute(name).is_some_and(|attr| attr.force_new) {
            requires_replace = true;
        }
        changes.push(AttributeChange::new(name, before.cloned(), after.cloned()));
    }

    if changes.is_empty() {
        return PlanResult::no_change(planned);
    }
    PlanResult::with_changes(planned, changes, requires_replace)
}

fn schema_keys(schema: &Schema) -> impl Iterator<Item = &str> {
    schema
        .block
        .attributes
        .keys()
        .chain(schema.block.blocks.keys())
        .map(String::as_str)
}

/// The value at `name`, treating a missing key and `null` alike.
fn present<'a>(state: &'a Value, name: &str) -> Option<&'a Value> {
    state.get(name).filter(|value| !value.is_null())
}
