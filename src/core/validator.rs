//! Input Validator (C2): schema evaluation plus cross-field business rules
//! that a bare Draft-07 evaluator cannot express (spec §4.2).

use serde_json::Value;

use crate::core::cancel::CancellationToken;
use crate::core::schema::SchemaCatalog;
use crate::errors::{ValidationError, Violation};

/// Validates tool-call arguments against the Schema Catalog and the
/// cross-field rules listed in spec §4.2.
#[derive(Debug, Clone)]
pub struct InputValidator {
    catalog: SchemaCatalog,
}

impl InputValidator {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Validate `input` against `tool_name`'s schema and cross-field rules.
    /// Returns every violation found rather than failing fast, per spec
    /// §4.2's "first error per path retained, all paths reported".
    pub fn validate(
        &self,
        token: &CancellationToken,
        tool_name: &str,
        input: &Value,
    ) -> Result<(), ValidationError> {
        let schema = self
            .catalog
            .get(tool_name)
            .ok_or_else(|| ValidationError::UnknownTool(tool_name.to_string()))?;

        let mut violations = schema_violations(&schema, input);
        if token.is_cancelled() {
            return Ok(());
        }

        violations.extend(cross_field_violations(tool_name, input));

        let mut seen = std::collections::HashSet::new();
        violations.retain(|v| seen.insert(v.field_path.clone()));

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Invalid(violations))
        }
    }
}

fn schema_violations(schema: &Value, input: &Value) -> Vec<Violation> {
    let validator = match jsonschema::validator_for(schema) {
        Ok(v) => v,
        Err(e) => {
            return vec![Violation {
                field_path: "$".to_string(),
                message: format!("schema failed to compile: {e}"),
                rule_violated: "schema_compile".to_string(),
                received_value: input.clone(),
            }];
        }
    };

    validator
        .iter_errors(input)
        .map(|error| Violation {
            field_path: json_pointer_to_field_path(&error.instance_path.to_string()),
            message: error.to_string(),
            rule_violated: format!("{:?}", error.kind),
            received_value: error.instance.clone().into_owned(),
        })
        .collect()
}

/// jsonschema reports paths as RFC 6901 JSON pointers (`/client_name`);
/// this server's error contract reports dotted field paths (`$.client_name`).
fn json_pointer_to_field_path(pointer: &str) -> String {
    if pointer.is_empty() {
        return "$".to_string();
    }
    let dotted = pointer.trim_start_matches('/').replace('/', ".");
    format!("$.{dotted}")
}

fn has_any(input: &Value, fields: &[&str]) -> bool {
    fields.iter().any(|f| {
        input
            .get(f)
            .is_some_and(|v| !v.is_null())
    })
}

fn violation(field: &str, message: &str, rule: &str, received: &Value) -> Violation {
    Violation {
        field_path: format!("${field}"),
        message: message.to_string(),
        rule_violated: rule.to_string(),
        received_value: received.clone(),
    }
}

/// The cross-field rules enumerated in spec §4.2, evaluated only when the
/// tool name matches one that carries such a rule.
fn cross_field_violations(tool_name: &str, input: &Value) -> Vec<Violation> {
    let mut out = Vec::new();
    let obj = input.as_object().cloned().unwrap_or_default();
    let input = Value::Object(obj);

    match tool_name {
        "invoice_create" => {
            if !has_any(&input, &["client_name", "client_id", "client_email"]) {
                out.push(violation(
                    "client_name",
                    "at least one of client_name, client_id, client_email is required",
                    "any_of_client_identity",
                    &input,
                ));
            }
        }
        "invoice_show" | "invoice_update" | "invoice_delete" | "invoice_add_item"
        | "invoice_remove_item" => {
            if !has_any(&input, &["invoice_id", "invoice_number"]) {
                out.push(violation(
                    "invoice_id",
                    "at least one of invoice_id, invoice_number is required",
                    "any_of_invoice_identity",
                    &input,
                ));
            }
            if tool_name == "invoice_update"
                && !has_any(&input, &["status", "due_date", "description"])
            {
                out.push(violation(
                    "status",
                    "at least one updatable field (status, due_date, description) is required",
                    "any_of_updatable_field",
                    &input,
                ));
            }
            if tool_name == "invoice_remove_item"
                && !has_any(
                    &input,
                    &["work_item_id", "work_item_description", "work_item_date"],
                )
            {
                out.push(violation(
                    "work_item_id",
                    "at least one of work_item_id, work_item_description, work_item_date is required",
                    "any_of_work_item_identity",
                    &input,
                ));
            }
        }
        "client_delete" => {
            let soft = input.get("soft_delete").and_then(Value::as_bool).unwrap_or(false);
            let hard = input.get("hard_delete").and_then(Value::as_bool).unwrap_or(false);
            if soft && hard {
                out.push(violation(
                    "soft_delete",
                    "soft_delete and hard_delete must not both be true",
                    "not_both",
                    &input,
                ));
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools;
    use serde_json::json;

    fn validator() -> InputValidator {
        let catalog = tools::build_schema_catalog();
        InputValidator::new(catalog)
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let v = validator();
        let token = CancellationToken::new();
        let err = v.validate(&token, "does_not_exist", &json!({})).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownTool(_)));
    }

    #[test]
    fn invoice_create_requires_one_client_identity_field() {
        let v = validator();
        let token = CancellationToken::new();
        let err = v
            .validate(&token, "invoice_create", &json!({"description": "x"}))
            .unwrap_err();
        match err {
            ValidationError::Invalid(violations) => {
                assert!(violations.iter().any(|vi| vi.rule_violated == "any_of_client_identity"));
            }
            _ => panic!("expected Invalid"),
        }
    }

    #[test]
    fn invoice_create_with_client_name_passes_cross_field_rule() {
        let v = validator();
        let token = CancellationToken::new();
        let result = v.validate(&token, "invoice_create", &json!({"client_name": "Acme"}));
        assert!(result.is_ok());
    }

    #[test]
    fn invoice_update_requires_identity_and_updatable_field() {
        let v = validator();
        let token = CancellationToken::new();
        let err = v
            .validate(&token, "invoice_update", &json!({"invoice_id": "INV-1"}))
            .unwrap_err();
        match err {
            ValidationError::Invalid(violations) => {
                assert!(violations.iter().any(|vi| vi.rule_violated == "any_of_updatable_field"));
            }
            _ => panic!("expected Invalid"),
        }
    }

    #[test]
    fn client_delete_rejects_both_flags() {
        let v = validator();
        let token = CancellationToken::new();
        let err = v
            .validate(
                &token,
                "client_delete",
                &json!({"client_id": "c1", "soft_delete": true, "hard_delete": true}),
            )
            .unwrap_err();
        match err {
            ValidationError::Invalid(violations) => {
                assert!(violations.iter().any(|vi| vi.rule_violated == "not_both"));
            }
            _ => panic!("expected Invalid"),
        }
    }

    #[test]
    fn invoice_remove_item_requires_one_work_item_identity_field() {
        let v = validator();
        let token = CancellationToken::new();
        let err = v
            .validate(&token, "invoice_remove_item", &json!({"invoice_id": "INV-1"}))
            .unwrap_err();
        match err {
            ValidationError::Invalid(violations) => {
                assert!(violations
                    .iter()
                    .any(|vi| vi.rule_violated == "any_of_work_item_identity"));
            }
            _ => panic!("expected Invalid"),
        }
    }

    #[test]
    fn unknown_additional_property_is_rejected_by_schema() {
        let v = validator();
        let token = CancellationToken::new();
        let err = v
            .validate(
                &token,
                "invoice_create",
                &json!({"client_name": "Acme", "bogus_field": 1}),
            )
            .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid(_)));
    }

    #[test]
    fn cancelled_token_short_circuits_before_cross_field_rules() {
        let v = validator();
        let token = CancellationToken::new();
        token.cancel();
        // The schema itself does not require a client identity field (that
        // is purely a cross-field rule), so a cancelled token skips that
        // rule and lets an otherwise-empty input through.
        let result = v.validate(&token, "invoice_create", &json!({}));
        assert!(result.is_ok());
    }
}
