//! Schema Catalog (C1): a searchable, read-only set of Draft-07 input
//! schemas, one per tool. Populated once by the Registry at startup and
//! never mutated afterwards (spec §4.1, §5).

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable catalog of tool input schemas.
///
/// Every returned schema is a deep clone; callers cannot observe or cause
/// mutation of the catalog's internal state through the returned value.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: Arc<HashMap<String, Value>>,
}

impl SchemaCatalog {
    /// Build a catalog from a finished `(name, schema)` set. Used by the
    /// Registry once, during `initialize`.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            schemas: Arc::new(entries.into_iter().collect()),
        }
    }

    /// Look up the schema for `name`, deep-cloned.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.schemas.get(name).cloned()
    }

    /// All schemas, keyed by tool name, deep-cloned.
    pub fn list_all(&self) -> HashMap<String, Value> {
        self.schemas.as_ref().clone()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// A single hygiene violation found by [`check_hygiene`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HygieneViolation {
    pub tool: String,
    pub path: String,
    pub reason: String,
}

/// Verify the schema-hygiene invariants from spec §8 item 2:
/// every object schema disables `additionalProperties`, every property has
/// a non-empty `description`, and every `default` matches its declared
/// `type`. Returns every violation found (empty means the catalog is
/// clean).
pub fn check_hygiene(catalog: &SchemaCatalog) -> Vec<HygieneViolation> {
    let mut violations = Vec::new();
    for (tool, schema) in catalog.list_all() {
        walk_schema(&tool, "$", &schema, &mut violations);
    }
    violations
}

fn walk_schema(tool: &str, path: &str, schema: &Value, out: &mut Vec<HygieneViolation>) {
    let Some(obj) = schema.as_object() else {
        return;
    };

    let is_object_type = obj.get("type").and_then(Value::as_str) == Some("object");
    if is_object_type && obj.get("additionalProperties") != Some(&Value::Bool(false)) {
        out.push(HygieneViolation {
            tool: tool.to_string(),
            path: path.to_string(),
            reason: "object schema must set additionalProperties:false".to_string(),
        });
    }

    if let Some(default) = obj.get("default") {
        if let Some(declared_type) = obj.get("type").and_then(Value::as_str) {
            if !default_matches_type(default, declared_type) {
                out.push(HygieneViolation {
                    tool: tool.to_string(),
                    path: path.to_string(),
                    reason: format!(
                        "default value does not match declared type '{declared_type}'"
                    ),
                });
            }
        }
    }

    if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
        for (prop_name, prop_schema) in properties {
            let prop_path = format!("{path}.{prop_name}");
            let description_ok = prop_schema
                .get("description")
                .and_then(Value::as_str)
                .is_some_and(|d| !d.trim().is_empty());
            if !description_ok {
                out.push(HygieneViolation {
                    tool: tool.to_string(),
                    path: prop_path.clone(),
                    reason: "property is missing a non-empty description".to_string(),
                });
            }
            walk_schema(tool, &prop_path, prop_schema, out);
        }
    }

    if let Some(items) = obj.get("items") {
        walk_schema(tool, &format!("{path}[]"), items, out);
    }

    for combinator in ["anyOf", "allOf", "oneOf"] {
        if let Some(variants) = obj.get(combinator).and_then(Value::as_array) {
            for (i, variant) in variants.iter().enumerate() {
                walk_schema(tool, &format!("{path}.{combinator}[{i}]"), variant, out);
            }
        }
    }
    if let Some(not_schema) = obj.get("not") {
        walk_schema(tool, &format!("{path}.not"), not_schema, out);
    }
}

fn default_matches_type(value: &Value, declared_type: &str) -> bool {
    match declared_type {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_deep_clone() {
        let catalog = SchemaCatalog::from_entries([(
            "echo".to_string(),
            json!({"type": "object", "additionalProperties": false}),
        )]);
        let mut schema = catalog.get("echo").unwrap();
        schema["patched"] = json!(true);
        // original is untouched
        assert!(catalog.get("echo").unwrap().get("patched").is_none());
    }

    #[test]
    fn detects_missing_additional_properties_false() {
        let catalog = SchemaCatalog::from_entries([(
            "bad".to_string(),
            json!({"type": "object", "properties": {}}),
        )]);
        let violations = check_hygiene(&catalog);
        assert!(violations.iter().any(|v| v.reason.contains("additionalProperties")));
    }

    #[test]
    fn detects_missing_description() {
        let catalog = SchemaCatalog::from_entries([(
            "bad".to_string(),
            json!({
                "type": "object",
                "additionalProperties": false,
                "properties": { "x": { "type": "string" } }
            }),
        )]);
        let violations = check_hygiene(&catalog);
        assert!(violations.iter().any(|v| v.path == "$.x"));
    }

    #[test]
    fn detects_default_type_mismatch() {
        let catalog = SchemaCatalog::from_entries([(
            "bad".to_string(),
            json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "x": { "type": "integer", "description": "x", "default": "not-an-int" }
                }
            }),
        )]);
        let violations = check_hygiene(&catalog);
        assert!(violations.iter().any(|v| v.reason.contains("default value")));
    }

    #[test]
    fn clean_schema_has_no_violations() {
        let catalog = SchemaCatalog::from_entries([(
            "good".to_string(),
            json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "x": { "type": "integer", "description": "an x", "default": 1 }
                }
            }),
        )]);
        assert!(check_hygiene(&catalog).is_empty());
    }
}
