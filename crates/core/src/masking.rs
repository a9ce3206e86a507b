//! Secret masking codec.
//!
//! Replaces values of arguments declared with `format: "password"` by a
//! constant-length placeholder, recursing into object and array arguments
//! through their nested schema. Keys without a schema entry pass through
//! untouched. On import the same schema decides which placeholders are
//! stripped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::extension_spec::{ArgumentKind, ArgumentSpec};

/// The placeholder that replaces every secret value.
///
/// Its length is fixed so the mask does not leak the secret's length.
pub const MASKED_VALUE: &str = "********";

/// Whether a value is exactly the masking placeholder.
pub fn is_masked(value: &Value) -> bool {
    value.as_str() == Some(MASKED_VALUE)
}

/// Return a copy of `values` with every secret argument replaced by
/// [`MASKED_VALUE`].
pub fn mask(
    values: &Map<String, Value>,
    arguments: &BTreeMap<String, ArgumentSpec>,
) -> Map<String, Value> {
    values
        .iter()
        .map(|(key, value)| {
            let masked = match arguments.get(key) {
                Some(spec) => mask_value(value, spec),
                None => value.clone(),
            };
            (key.clone(), masked)
        })
        .collect()
}

fn mask_value(value: &Value, spec: &ArgumentSpec) -> Value {
    if spec.is_secret() {
        return Value::String(MASKED_VALUE.to_string());
    }
    match (&spec.kind, value) {
        (ArgumentKind::Object { properties }, Value::Object(inner)) => {
            Value::Object(mask(inner, properties))
        }
        (ArgumentKind::Array { items: Some(items) }, Value::Array(elements)) => {
            Value::Array(elements.iter().map(|e| mask_value(e, items)).collect())
        }
        _ => value.clone(),
    }
}

/// Values left after [`strip_masked`], with the paths of the secrets it removed.
#[derive(Debug, Clone, PartialEq)]
pub struct StrippedValues {
    pub values: Map<String, Value>,
    pub dropped: Vec<String>,
}

/// Remove placeholders found where the schema declares a secret.
///
/// Used on import: a masked secret carries no information, so it is treated
/// as absent and must be supplied again. A masked array element is removed
/// from its array, and an array left empty that way is removed entirely.
/// Placeholders under non-secret arguments or unknown keys are kept.
pub fn strip_masked(
    values: &Map<String, Value>,
    arguments: &BTreeMap<String, ArgumentSpec>,
) -> StrippedValues {
    let mut dropped = Vec::new();
    let values = strip_map(values, arguments, "", &mut dropped);
    StrippedValues { values, dropped }
}

fn strip_map(
    values: &Map<String, Value>,
    arguments: &BTreeMap<String, ArgumentSpec>,
    prefix: &str,
    dropped: &mut Vec<String>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in values {
        let kept = match arguments.get(key) {
            Some(spec) => {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                strip_value(value, spec, &path, dropped)
            }
            None => Some(value.clone()),
        };
        if let Some(kept) = kept {
            out.insert(key.clone(), kept);
        }
    }
    out
}

fn strip_value(
    value: &Value,
    spec: &ArgumentSpec,
    path: &str,
    dropped: &mut Vec<String>,
) -> Option<Value> {
    if spec.is_secret() && is_masked(value) {
        dropped.push(path.to_string());
        return None;
    }
    match (&spec.kind, value) {
        (ArgumentKind::Object { properties }, Value::Object(inner)) => {
            Some(Value::Object(strip_map(inner, properties, path, dropped)))
        }
        (ArgumentKind::Array { items: Some(items) }, Value::Array(elements)) => {
            let kept: Vec<Value> = elements
                .iter()
                .enumerate()
                .filter_map(|(i, e)| strip_value(e, items, &format!("{path}[{i}]"), dropped))
                .collect();
            if kept.is_empty() && !elements.is_empty() {
                None
            } else {
                Some(Value::Array(kept))
            }
        }
        _ => Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension_spec::ExtensionSpec;
    use serde_json::json;

    fn spec() -> ExtensionSpec {
        serde_json::from_value(json!({
            "name": "rag-tool",
            "arguments": {
                "apiKey": { "type": "string", "format": "password", "required": true },
                "endpoint": { "type": "string" },
                "pin": { "type": "integer", "format": "password" },
                "auth": {
                    "type": "object",
                    "properties": {
                        "user": { "type": "string" },
                        "token": { "type": "string", "format": "password" }
                    }
                },
                "accounts": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "secret": { "type": "string", "format": "password" } }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn masks_top_level_secret_and_keeps_the_rest() {
        let input = values(json!({ "apiKey": "sk-real-123", "endpoint": "https://x" }));
        let out = mask(&input, &spec().arguments);

        assert_eq!(out["apiKey"], MASKED_VALUE);
        assert_eq!(out["endpoint"], "https://x");
    }

    #[test]
    fn placeholder_length_is_independent_of_secret() {
        let short = mask(&values(json!({ "apiKey": "a" })), &spec().arguments);
        let long = mask(
            &values(json!({ "apiKey": "a".repeat(500) })),
            &spec().arguments,
        );
        assert_eq!(short["apiKey"], long["apiKey"]);
    }

    #[test]
    fn non_string_secret_is_masked() {
        let out = mask(&values(json!({ "pin": 1234 })), &spec().arguments);
        assert_eq!(out["pin"], MASKED_VALUE);
    }

    #[test]
    fn recurses_into_objects_and_arrays() {
        let input = values(json!({
            "auth": { "user": "bot", "token": "t0k3n" },
            "accounts": [{ "secret": "one" }, { "secret": "two", "label": "b" }]
        }));
        let out = mask(&input, &spec().arguments);

        assert_eq!(out["auth"]["user"], "bot");
        assert_eq!(out["auth"]["token"], MASKED_VALUE);
        assert_eq!(out["accounts"][0]["secret"], MASKED_VALUE);
        assert_eq!(out["accounts"][1]["secret"], MASKED_VALUE);
        assert_eq!(out["accounts"][1]["label"], "b");
    }

    #[test]
    fn unknown_keys_pass_through() {
        let input = values(json!({ "password": "still-visible", "extra": { "token": "x" } }));
        let out = mask(&input, &spec().arguments);
        assert_eq!(out, input);
    }

    #[test]
    fn input_is_not_mutated() {
        let input = values(json!({ "apiKey": "sk" }));
        let _ = mask(&input, &spec().arguments);
        assert_eq!(input["apiKey"], "sk");
    }

    #[test]
    fn strip_removes_secret_placeholders_recursively() {
        let input = values(json!({
            "apiKey": MASKED_VALUE,
            "endpoint": "https://x",
            "auth": { "user": "bot", "token": MASKED_VALUE },
            "accounts": [{ "secret": MASKED_VALUE, "label": "a" }]
        }));
        let out = strip_masked(&input, &spec().arguments);

        assert!(!out.values.contains_key("apiKey"));
        assert_eq!(out.values["endpoint"], "https://x");
        assert_eq!(out.values["auth"], json!({ "user": "bot" }));
        assert_eq!(out.values["accounts"], json!([{ "label": "a" }]));
        assert_eq!(
            out.dropped,
            vec!["accounts[0].secret", "apiKey", "auth.token"]
        );
    }

    #[test]
    fn strip_removes_masked_elements_of_secret_arrays() {
        let mut spec = spec();
        spec.arguments.insert(
            "keys".into(),
            serde_json::from_value(json!({
                "type": "array",
                "items": { "type": "string", "format": "password" }
            }))
            .unwrap(),
        );

        let out = strip_masked(
            &values(json!({ "keys": ["live", MASKED_VALUE] })),
            &spec.arguments,
        );
        assert_eq!(out.values["keys"], json!(["live"]));
        assert_eq!(out.dropped, vec!["keys[1]"]);

        let out = strip_masked(
            &values(json!({ "keys": [MASKED_VALUE, MASKED_VALUE] })),
            &spec.arguments,
        );
        assert!(!out.values.contains_key("keys"));
        assert_eq!(out.dropped, vec!["keys[0]", "keys[1]"]);
    }

    #[test]
    fn strip_keeps_placeholders_outside_secrets() {
        let input = values(json!({
            "endpoint": MASKED_VALUE,
            "auth": { "user": MASKED_VALUE },
            "undeclared": MASKED_VALUE
        }));
        let out = strip_masked(&input, &spec().arguments);

        assert_eq!(out.values, input);
        assert!(out.dropped.is_empty());
    }
}
