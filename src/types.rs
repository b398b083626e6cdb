//! Plan, import and metadata types returned by provider hooks.

use crate::schema::Block;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Plan a resource against its schema block.
    ///
    /// - Unset attributes with a default receive it, so defaulted fields are
    ///   part of the planned state and are sent on create.
    /// - Computed-only attributes (`id`, task ids) carry over from the prior
    ///   state.
    /// - A `Null` proposed state plans a destroy.
    pub fn compute(block: &Block, prior: Option<&Value>, proposed: &Value) -> Self {
        if proposed.is_null() {
            let changes = prior
                .and_then(Value::as_object)
                .map(|obj| {
                    obj.iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(k, v)| AttributeChange::new(k.clone(), Some(v.clone()), None))
                        .collect()
                })
                .unwrap_or_default();
            return Self {
                planned_state: Value::Null,
                changes,
                requires_replace: false,
            };
        }

        let mut planned = proposed.as_object().cloned().unwrap_or_default();
        block.fill_defaults(&mut planned);

        let empty = Map::new();
        let prior_obj = prior.and_then(Value::as_object);
        if let Some(prior_obj) = prior_obj {
            for (name, attr) in &block.attributes {
                if attr.flags.is_computed_only() {
                    if let Some(v) = prior_obj.get(name) {
                        planned.insert(name.clone(), v.clone());
                    }
                }
            }
        }
        let before = prior_obj.unwrap_or(&empty);

        let mut changes = Vec::new();
        let mut requires_replace = false;
        let keys = block
            .attributes
            .iter()
            .filter(|(_, attr)| !attr.flags.is_computed_only())
            .map(|(name, attr)| (name, attr.force_new))
            .chain(block.blocks.iter().map(|(name, nested)| (name, nested.force_new)));

        for (name, force_new) in keys {
            let old = before.get(name).filter(|v| !is_empty(v));
            let new = planned.get(name).filter(|v| !is_empty(v));
            if old == new {
                continue;
            }
            changes.push(AttributeChange::new(name.clone(), old.cloned(), new.cloned()));
            // Setting a force-new field on a fresh object is not a replacement.
            if force_new && prior_obj.is_some() {
                requires_replace = true;
            }
        }
        changes.sort_by(|a, b| a.path.cmp(&b.path));

        Self {
            planned_state: Value::Object(planned),
            changes,
            requires_replace,
        }
    }

    /// Whether the plan changes anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Unset, empty collections and empty strings all plan the same.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata: the resource and data source types it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}
