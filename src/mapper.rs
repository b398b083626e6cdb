//! Attribute mapper between provider state and management API payloads.
//!
//! State uses the schema's snake_case names; the management API uses
//! kebab-case field names. Single nested blocks are one-element lists in
//! state and plain objects on the wire.
//!
//! ```
//! use checkpoint_provider::mapper::to_payload;
//! use checkpoint_provider::schema::{Attribute, Block, NestedBlock};
//! use serde_json::json;
//!
//! let block = Block::new()
//!     .with_attribute("ipv4_address", Attribute::optional_string())
//!     .with_block(
//!         "nat_settings",
//!         NestedBlock::single(Block::new().with_attribute("auto_rule", Attribute::optional_bool())),
//!     );
//! let state = json!({"ipv4_address": "1.2.3.4", "nat_settings": [{"auto_rule": true}]});
//!
//! let payload = to_payload(&block, state.as_object().unwrap());
//! assert_eq!(
//!     serde_json::Value::Object(payload),
//!     json!({"ipv4-address": "1.2.3.4", "nat-settings": {"auto-rule": true}})
//! );
//! ```

use crate::schema::{Attribute, AttributeType, Block, BlockNestingMode, NestedBlock};
use heck::ToKebabCase;
use serde_json::{Map, Value};
use tracing::trace;

/// The API field name for a schema attribute or block.
pub fn wire_key(name: &str, explicit: Option<&str>) -> String {
    match explicit {
        Some(wire) => wire.to_string(),
        None => name.to_kebab_case(),
    }
}

/// How returned values are written back into state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Managed resource: values equal to a default the user never set are
    /// left out.
    Resource,
    /// Data source: every returned value is written.
    DataSource,
}

// ============================================================================
// Outbound
// ============================================================================

/// Build a request payload from every field present in `state`.
///
/// Absent (missing or null) fields and empty collections are not sent.
/// Computed-only attributes are never sent.
pub fn to_payload(block: &Block, state: &Map<String, Value>) -> Map<String, Value> {
    let mut payload = Map::new();

    for (name, attr) in &block.attributes {
        if attr.flags.is_computed_only() {
            continue;
        }
        if let Some(value) = state.get(name).filter(|v| !is_unset(v)) {
            payload.insert(wire_key(name, attr.wire_name.as_deref()), value.clone());
        }
    }

    for (name, nested) in &block.blocks {
        if let Some(value) = state.get(name).and_then(|v| block_to_wire(nested, v)) {
            payload.insert(wire_key(name, nested.wire_name.as_deref()), value);
        }
    }

    payload
}

/// Build an update payload holding only the fields that differ between
/// `prior` and `planned`.
///
/// A changed nested block is sent whole. A collection that was emptied is
/// sent as `[]` so the server clears it. A changed `name` is sent as
/// `new-name`; the caller identifies the object by uid.
pub fn changed_payload(
    block: &Block,
    prior: &Map<String, Value>,
    planned: &Map<String, Value>,
) -> Map<String, Value> {
    let mut payload = Map::new();

    for (name, attr) in &block.attributes {
        if attr.flags.is_computed_only() || !has_change(prior.get(name), planned.get(name)) {
            continue;
        }
        let key = if name == "name" {
            "new-name".to_string()
        } else {
            wire_key(name, attr.wire_name.as_deref())
        };
        match planned.get(name).filter(|v| !v.is_null()) {
            Some(value) => {
                payload.insert(key, value.clone());
            },
            None if attr.attr_type.is_collection() => {
                payload.insert(key, Value::Array(Vec::new()));
            },
            None => {},
        }
    }

    for (name, nested) in &block.blocks {
        if !has_change(prior.get(name), planned.get(name)) {
            continue;
        }
        let key = wire_key(name, nested.wire_name.as_deref());
        match planned.get(name).and_then(|v| block_to_wire(nested, v)) {
            Some(value) => {
                payload.insert(key, value);
            },
            None if nested.nesting_mode != BlockNestingMode::Single => {
                payload.insert(key, Value::Array(Vec::new()));
            },
            None => {},
        }
    }

    payload
}

fn block_to_wire(nested: &NestedBlock, value: &Value) -> Option<Value> {
    match (nested.nesting_mode, value) {
        (BlockNestingMode::Single, Value::Array(items)) => items
            .first()
            .and_then(Value::as_object)
            .map(|child| Value::Object(to_payload(&nested.block, child))),
        (BlockNestingMode::Single, Value::Object(child)) => {
            Some(Value::Object(to_payload(&nested.block, child)))
        },
        (_, Value::Array(items)) if !items.is_empty() => Some(Value::Array(
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|child| Value::Object(to_payload(&nested.block, child)))
                .collect(),
        )),
        _ => None,
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn has_change(before: Option<&Value>, after: Option<&Value>) -> bool {
    let blank = |v: &&Value| is_unset(v) || v.as_str() == Some("");
    before.filter(|v| !blank(v)) != after.filter(|v| !blank(v))
}

/// Replace sensitive values in a payload before it is logged.
pub fn redacted(block: &Block, payload: &Map<String, Value>) -> Value {
    let mut copy = payload.clone();
    for name in block.sensitive_attributes() {
        let attr = &block.attributes[name];
        let key = wire_key(name, attr.wire_name.as_deref());
        if let Some(value) = copy.get_mut(&key) {
            *value = Value::String("***".to_string());
        }
    }
    Value::Object(copy)
}

// ============================================================================
// Inbound
// ============================================================================

/// Map an API response into state fields.
///
/// Only fields to be written are returned; see [`apply_read`] for merging
/// them over the prior state. In [`ReadMode::Resource`], a returned value
/// equal to the attribute's default is dropped unless the user set the
/// attribute (see [`is_arg_default`]). A nested block whose fields were all
/// dropped is not written either, nor is a single block that equals its
/// block default when the user never configured it.
pub fn to_state(
    block: &Block,
    response: &Map<String, Value>,
    prior: &Map<String, Value>,
    mode: ReadMode,
) -> Map<String, Value> {
    map_block(block, response, prior, "", mode)
}

/// Merge freshly read fields over the prior state.
///
/// Fields the read did not write keep their prior value.
pub fn apply_read(
    block: &Block,
    prior: &Map<String, Value>,
    response: &Map<String, Value>,
) -> Map<String, Value> {
    let mut state = prior.clone();
    state.extend(to_state(block, response, prior, ReadMode::Resource));
    state
}

fn map_block(
    block: &Block,
    response: &Map<String, Value>,
    prior: &Map<String, Value>,
    prefix: &str,
    mode: ReadMode,
) -> Map<String, Value> {
    let mut state = Map::new();

    for (name, attr) in &block.attributes {
        let key = wire_key(name, attr.wire_name.as_deref());
        let Some(raw) = response.get(&key).filter(|v| !v.is_null()) else {
            continue;
        };
        let Some(value) = convert_attribute(&attr.attr_type, raw) else {
            trace!(attribute = %key, "skipping value of unexpected type");
            continue;
        };
        let path = join_path(prefix, name);
        if mode == ReadMode::Resource && !keep_returned(attr, &value, prior, &path) {
            continue;
        }
        state.insert(name.clone(), value);
    }

    for (name, nested) in &block.blocks {
        let key = wire_key(name, nested.wire_name.as_deref());
        let path = join_path(prefix, name);
        let mapped = match response.get(&key) {
            Some(Value::Object(child)) => {
                let child = map_block(&nested.block, child, prior, &format!("{}.0", path), mode);
                if child.is_empty() {
                    continue;
                }
                if mode == ReadMode::Resource && !keep_returned_block(nested, &child, prior, &path) {
                    continue;
                }
                vec![Value::Object(child)]
            },
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| item.as_object().map(|child| (i, child)))
                .map(|(i, child)| {
                    Value::Object(map_block(
                        &nested.block,
                        child,
                        prior,
                        &format!("{}.{}", path, i),
                        mode,
                    ))
                })
                .collect(),
            _ => continue,
        };
        state.insert(name.clone(), Value::Array(mapped));
    }

    state
}

fn keep_returned(attr: &Attribute, value: &Value, prior: &Map<String, Value>, path: &str) -> bool {
    match &attr.default {
        Some(default) => is_arg_default(value, prior, path, default),
        None => true,
    }
}

fn keep_returned_block(
    nested: &NestedBlock,
    child: &Map<String, Value>,
    prior: &Map<String, Value>,
    path: &str,
) -> bool {
    let Some(Value::Object(default)) = &nested.default else {
        return true;
    };
    let matches = child.len() == default.len()
        && child
            .iter()
            .all(|(k, v)| default.get(k).is_some_and(|d| canonical(d) == canonical(v)));
    !matches || lookup_path(prior, path).is_some_and(|v| !is_unset(v))
}

fn convert_attribute(attr_type: &AttributeType, raw: &Value) -> Option<Value> {
    match attr_type {
        AttributeType::String => match raw {
            Value::String(_) => Some(raw.clone()),
            // Object references come back as full objects.
            Value::Object(obj) => obj.get("name").filter(|v| v.is_string()).cloned(),
            Value::Bool(_) | Value::Number(_) => Some(Value::String(canonical(raw))),
            _ => None,
        },
        AttributeType::Int64 => match raw {
            Value::Number(n) if n.is_i64() => Some(raw.clone()),
            Value::String(s) => s.parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        AttributeType::Bool => match raw {
            Value::Bool(_) => Some(raw.clone()),
            Value::String(s) => s.parse::<bool>().ok().map(Value::Bool),
            _ => None,
        },
        AttributeType::List(element) | AttributeType::Set(element) => {
            let items = raw.as_array()?;
            Some(Value::Array(
                items
                    .iter()
                    .filter_map(|item| convert_attribute(element, item))
                    .collect(),
            ))
        },
        AttributeType::Map(element) => {
            let obj = raw.as_object()?;
            Some(Value::Object(
                obj.iter()
                    .filter_map(|(k, v)| convert_attribute(element, v).map(|v| (k.clone(), v)))
                    .collect(),
            ))
        },
    }
}

// ============================================================================
// Default suppression
// ============================================================================

/// Decide whether a returned value may be written to state.
///
/// Returns `true` (keep) when `returned` differs from `default`, or when the
/// user set `path` in `state`. Returns `false` (suppress) when the server
/// returned exactly the default for a field the user never set, which
/// would otherwise show up as a permanent diff.
///
/// Values compare by their canonical string form, so a string-encoded
/// `"false"` or `"0"` equals a typed `false` or `0` default.
///
/// `path` uses `.` separators with list indices, e.g.
/// `nat_settings.0.auto_rule`.
pub fn is_arg_default(
    returned: &Value,
    state: &Map<String, Value>,
    path: &str,
    default: &Value,
) -> bool {
    if canonical(returned) != canonical(default) {
        return true;
    }
    lookup_path(state, path).is_some_and(|v| !v.is_null())
}

/// Canonical string form used to compare API values with schema defaults.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Look up a `.`-separated path in a state object.
///
/// Numeric segments index lists; a single block stored as a bare object
/// answers to index `0`.
pub fn lookup_path<'a>(state: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = state.get(segments.next()?)?;
    for segment in segments {
        current = match (current, segment.parse::<usize>()) {
            (Value::Array(items), Ok(index)) => items.get(index)?,
            (Value::Object(_), Ok(0)) => current,
            (Value::Object(obj), Err(_)) => obj.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Block, NestedBlock};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn host_block() -> Block {
        Block::new()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("ipv4_address", Attribute::optional_string())
            .with_attribute("color", Attribute::optional_string().with_default("black"))
            .with_attribute("tags", Attribute::string_set())
            .with_attribute("password", Attribute::optional_string().sensitive())
            .with_block(
                "nat_settings",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("auto_rule", Attribute::optional_bool().with_default(false))
                        .with_attribute("method", Attribute::optional_string())
                        .with_attribute("install_on", Attribute::optional_string()),
                ),
            )
            .with_block(
                "interfaces",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("name", Attribute::required_string())
                        .with_attribute("subnet4", Attribute::optional_string())
                        .with_attribute("mask_length4", Attribute::optional_int64()),
                ),
            )
    }

    #[test]
    fn test_wire_key() {
        assert_eq!(wire_key("ipv4_address", None), "ipv4-address");
        assert_eq!(wire_key("mask_length4", None), "mask-length4");
        assert_eq!(wire_key("auto_rule", None), "auto-rule");
        assert_eq!(wire_key("name", None), "name");
        assert_eq!(wire_key("cluster_members", Some("members")), "members");
    }

    #[test]
    fn test_to_payload_renames_present_fields() {
        let state = obj(json!({
            "id": "uid-1",
            "name": "host1",
            "ipv4_address": "1.2.3.4",
            "color": "black",
            "tags": ["a", "b"],
            "nat_settings": [{"auto_rule": true, "method": "static", "install_on": null}],
            "interfaces": [
                {"name": "eth0", "subnet4": "10.0.0.0", "mask_length4": 24},
                {"name": "eth1"}
            ]
        }));

        let payload = to_payload(&host_block(), &state);

        assert_eq!(
            Value::Object(payload),
            json!({
                "name": "host1",
                "ipv4-address": "1.2.3.4",
                "color": "black",
                "tags": ["a", "b"],
                "nat-settings": {"auto-rule": true, "method": "static"},
                "interfaces": [
                    {"name": "eth0", "subnet4": "10.0.0.0", "mask-length4": 24},
                    {"name": "eth1"}
                ]
            })
        );
    }

    #[test]
    fn test_to_payload_skips_absent_and_empty() {
        let state = obj(json!({
            "name": "host1",
            "ipv4_address": null,
            "tags": [],
            "nat_settings": [],
        }));
        let payload = to_payload(&host_block(), &state);
        assert_eq!(Value::Object(payload), json!({"name": "host1"}));
    }

    #[test]
    fn test_explicit_false_is_sent() {
        let state = obj(json!({"name": "h", "nat_settings": [{"auto_rule": false}]}));
        let payload = to_payload(&host_block(), &state);
        assert_eq!(payload["nat-settings"], json!({"auto-rule": false}));
    }

    #[test]
    fn test_changed_payload() {
        let prior = obj(json!({
            "id": "uid-1",
            "name": "host1",
            "ipv4_address": "1.2.3.4",
            "color": "black",
            "tags": ["a"],
            "nat_settings": [{"auto_rule": true, "method": "static"}]
        }));
        let planned = obj(json!({
            "id": "uid-1",
            "name": "host2",
            "ipv4_address": "1.2.3.4",
            "color": "black",
            "tags": [],
            "nat_settings": [{"auto_rule": true, "method": "hide"}]
        }));

        let payload = changed_payload(&host_block(), &prior, &planned);

        assert_eq!(
            Value::Object(payload),
            json!({
                "new-name": "host2",
                "tags": [],
                "nat-settings": {"auto-rule": true, "method": "hide"}
            })
        );
    }

    #[test]
    fn test_redacted() {
        let payload = obj(json!({"name": "h", "password": "s3cret"}));
        let logged = redacted(&host_block(), &payload);
        assert_eq!(logged, json!({"name": "h", "password": "***"}));
    }

    #[test]
    fn test_to_state_wraps_single_block() {
        let response = obj(json!({
            "uid": "uid-1",
            "name": "host1",
            "ipv4-address": "1.2.3.4",
            "nat-settings": {"auto-rule": true, "method": "static"},
            "interfaces": [{"name": "eth0", "subnet4": "10.0.0.0", "mask-length4": 24}]
        }));

        let state = to_state(&host_block(), &response, &Map::new(), ReadMode::Resource);

        assert_eq!(state["nat_settings"], json!([{"auto_rule": true, "method": "static"}]));
        assert_eq!(
            state["interfaces"],
            json!([{"name": "eth0", "subnet4": "10.0.0.0", "mask_length4": 24}])
        );
        assert!(!state.contains_key("id"));
    }

    #[test]
    fn test_to_state_flattens_object_references() {
        let response = obj(json!({
            "name": "host1",
            "tags": [{"name": "prod", "uid": "t1"}, {"name": "dmz", "uid": "t2"}],
            "nat-settings": {"install-on": {"name": "gw1", "uid": "g1"}, "method": "hide"}
        }));
        let state = to_state(&host_block(), &response, &Map::new(), ReadMode::Resource);
        assert_eq!(state["tags"], json!(["prod", "dmz"]));
        assert_eq!(state["nat_settings"][0]["install_on"], "gw1");
    }

    #[test]
    fn test_to_state_suppresses_unset_defaults() {
        let response = obj(json!({
            "name": "host1",
            "color": "black",
            "nat-settings": {"auto-rule": false}
        }));

        let state = to_state(&host_block(), &response, &Map::new(), ReadMode::Resource);
        assert!(!state.contains_key("color"));
        assert!(!state.contains_key("nat_settings"));

        let state = to_state(&host_block(), &response, &Map::new(), ReadMode::DataSource);
        assert_eq!(state["color"], "black");
        assert_eq!(state["nat_settings"], json!([{"auto_rule": false}]));
    }

    #[test]
    fn test_to_state_keeps_defaults_the_user_set() {
        let response = obj(json!({"name": "host1", "nat-settings": {"auto-rule": false}}));
        let prior = obj(json!({"name": "host1", "nat_settings": [{"auto_rule": false}]}));
        let state = to_state(&host_block(), &response, &prior, ReadMode::Resource);
        assert_eq!(state["nat_settings"], json!([{"auto_rule": false}]));
    }

    #[test]
    fn test_to_state_suppresses_unconfigured_block_default() {
        let block = Block::new().with_attribute("name", Attribute::required_string()).with_block(
            "nat_settings",
            NestedBlock::single(
                Block::new()
                    .with_attribute("auto_rule", Attribute::optional_bool())
                    .with_attribute("method", Attribute::optional_string()),
            )
            .with_default(json!({"auto_rule": false})),
        );

        let response = obj(json!({"name": "host1", "nat-settings": {"auto-rule": "false"}}));
        let state = to_state(&block, &response, &Map::new(), ReadMode::Resource);
        assert!(!state.contains_key("nat_settings"));

        // Configured by the user: kept even though it equals the default.
        let prior = obj(json!({"name": "host1", "nat_settings": [{"auto_rule": false}]}));
        let state = to_state(&block, &response, &prior, ReadMode::Resource);
        assert_eq!(state["nat_settings"], json!([{"auto_rule": false}]));

        // Anything beyond the default is kept.
        let response = obj(json!({"name": "host1", "nat-settings": {"auto-rule": false, "method": "hide"}}));
        let state = to_state(&block, &response, &Map::new(), ReadMode::Resource);
        assert_eq!(state["nat_settings"], json!([{"auto_rule": false, "method": "hide"}]));

        let state = to_state(&block, &response, &Map::new(), ReadMode::DataSource);
        assert_eq!(state["nat_settings"][0]["method"], "hide");
    }

    #[test]
    fn test_apply_read_keeps_unwritten_prior_fields() {
        let prior = obj(json!({"id": "uid-1", "name": "host1", "color": "black"}));
        let response = obj(json!({"name": "host1", "ipv4-address": "1.2.3.4", "color": "black"}));
        let state = apply_read(&host_block(), &prior, &response);
        assert_eq!(
            Value::Object(state),
            json!({"id": "uid-1", "name": "host1", "color": "black", "ipv4_address": "1.2.3.4"})
        );
    }

    #[test]
    fn test_is_arg_default() {
        let empty = Map::new();
        // Returned the default and never set: suppress.
        assert!(!is_arg_default(&json!("black"), &empty, "color", &json!("black")));
        // Returned something else: keep.
        assert!(is_arg_default(&json!("red"), &empty, "color", &json!("black")));
        // User set the path explicitly: keep.
        let state = obj(json!({"color": "black"}));
        assert!(is_arg_default(&json!("black"), &state, "color", &json!("black")));
    }

    #[test]
    fn test_is_arg_default_compares_string_encoded_values() {
        let empty = Map::new();
        assert!(!is_arg_default(&json!("false"), &empty, "a", &json!(false)));
        assert!(!is_arg_default(&json!(0), &empty, "a", &json!("0")));
        assert!(is_arg_default(&json!("true"), &empty, "a", &json!(false)));
    }

    #[test]
    fn test_is_arg_default_nested_path() {
        let state = obj(json!({"nat_settings": [{"auto_rule": false}]}));
        assert!(is_arg_default(
            &json!(false),
            &state,
            "nat_settings.0.auto_rule",
            &json!(false)
        ));
        assert!(!is_arg_default(
            &json!(false),
            &state,
            "nat_settings.0.method",
            &json!(false)
        ));
    }

    #[test]
    fn test_lookup_path() {
        let state = obj(json!({
            "interfaces": [{"name": "eth0"}, {"name": "eth1"}],
            "nat_settings": {"method": "hide"}
        }));
        assert_eq!(lookup_path(&state, "interfaces.1.name"), Some(&json!("eth1")));
        assert_eq!(lookup_path(&state, "nat_settings.0.method"), Some(&json!("hide")));
        assert_eq!(lookup_path(&state, "interfaces.5.name"), None);
        assert_eq!(lookup_path(&state, "missing"), None);
    }
}
