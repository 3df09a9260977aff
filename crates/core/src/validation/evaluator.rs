//! Rule evaluator. Pure logic, no database access.

use serde_json::Value;
use validator::ValidateEmail;

use super::rules::{Constraint, FieldViolation, RuleSet, ValidationResult};
use crate::types::Record;

/// Evaluate every rule in `rules` against a single payload.
///
/// Only `Required` enforces presence; every other constraint passes when the
/// field is absent, null or an empty string.
pub fn evaluate(rules: &RuleSet, data: &Record) -> ValidationResult {
    let mut errors = Vec::new();

    for (field, constraints) in rules.iter() {
        let value = data.get(field);
        for constraint in constraints {
            if let Some(message) = check(field, constraint, value) {
                errors.push(FieldViolation {
                    field: field.to_string(),
                    rule: constraint.name().to_string(),
                    message,
                    value: value.cloned(),
                });
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check(field: &str, constraint: &Constraint, value: Option<&Value>) -> Option<String> {
    if let Constraint::Required = constraint {
        return is_blank(value).then(|| format!("O campo {field} é obrigatório."));
    }
    if is_blank(value) {
        return None;
    }
    let value = value?;

    match constraint {
        Constraint::Required => None,
        Constraint::Min(min) => match value {
            Value::Number(n) => (n.as_f64().unwrap_or(0.0) < *min as f64)
                .then(|| format!("O campo {field} não pode ser menor que {min}.")),
            other => (as_text(other).chars().count() < *min as usize)
                .then(|| format!("O campo {field} deve ter pelo menos {min} caracteres.")),
        },
        Constraint::Max(max) => match value {
            Value::Number(n) => (n.as_f64().unwrap_or(0.0) > *max as f64)
                .then(|| format!("O campo {field} não pode ser maior que {max}.")),
            other => (as_text(other).chars().count() > *max as usize)
                .then(|| format!("O campo {field} não pode ter mais que {max} caracteres.")),
        },
        Constraint::Email => {
            let text = as_text(value);
            (!text.as_str().validate_email())
                .then(|| format!("O campo {field} deve ser um endereço de e-mail válido."))
        }
        Constraint::Numeric => as_number(value)
            .is_none()
            .then(|| format!("O campo {field} deve ser um número.")),
        Constraint::Integer => {
            let ok = match value {
                Value::Number(n) => n.is_i64() || n.is_u64(),
                Value::String(s) => s.trim().parse::<i64>().is_ok(),
                _ => false,
            };
            (!ok).then(|| format!("O campo {field} deve ser um número inteiro."))
        }
        Constraint::Boolean => {
            let ok = match value {
                Value::Bool(_) => true,
                Value::Number(n) => matches!(n.as_i64(), Some(0 | 1)),
                Value::String(s) => matches!(s.trim(), "0" | "1" | "true" | "false"),
                _ => false,
            };
            (!ok).then(|| format!("O campo {field} deve ser verdadeiro ou falso."))
        }
        Constraint::In(allowed) => {
            let text = as_text(value);
            (!allowed.iter().any(|a| *a == text))
                .then(|| format!("O campo {field} selecionado é inválido."))
        }
        Constraint::Regex(pattern) => (!pattern.is_match(&as_text(value)))
            .then(|| format!("O formato do campo {field} é inválido.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn rules(field: &str, spec: &str) -> RuleSet {
        RuleSet::new().with_spec(field, spec).unwrap()
    }

    #[test]
    fn required_passes_with_value() {
        let result = evaluate(&rules("name", "required"), &data(&[("name", json!("Alice"))]));
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn required_fails_when_missing_null_or_blank() {
        let r = rules("name", "required");
        for d in [
            data(&[]),
            data(&[("name", Value::Null)]),
            data(&[("name", json!("   "))]),
        ] {
            let result = evaluate(&r, &d);
            assert!(!result.is_valid);
            assert_eq!(result.errors[0].field, "name");
            assert_eq!(result.errors[0].rule, "required");
        }
    }

    #[test]
    fn optional_constraints_skip_blank_values() {
        let result = evaluate(&rules("email", "email|max:5"), &data(&[("email", json!(""))]));
        assert!(result.is_valid);
    }

    #[test]
    fn email_rejects_malformed_address() {
        let r = rules("email", "email");
        assert!(evaluate(&r, &data(&[("email", json!("a@x.com"))])).is_valid);
        assert!(!evaluate(&r, &data(&[("email", json!("not-an-email"))])).is_valid);
    }

    #[test]
    fn max_counts_characters_for_strings_and_value_for_numbers() {
        let r = rules("f", "max:3");
        assert!(evaluate(&r, &data(&[("f", json!("ção"))])).is_valid);
        assert!(!evaluate(&r, &data(&[("f", json!("abcd"))])).is_valid);
        assert!(evaluate(&r, &data(&[("f", json!(3))])).is_valid);
        assert!(!evaluate(&r, &data(&[("f", json!(4))])).is_valid);
    }

    #[test]
    fn numeric_accepts_numeric_strings() {
        let r = rules("qty", "numeric");
        assert!(evaluate(&r, &data(&[("qty", json!("12.5"))])).is_valid);
        assert!(!evaluate(&r, &data(&[("qty", json!("twelve"))])).is_valid);
    }

    #[test]
    fn boolean_accepts_checkbox_encodings() {
        let r = rules("active", "boolean");
        for v in [json!(true), json!(0), json!("1"), json!("false")] {
            assert!(evaluate(&r, &data(&[("active", v)])).is_valid);
        }
        assert!(!evaluate(&r, &data(&[("active", json!("yes"))])).is_valid);
    }

    #[test]
    fn in_rule_matches_listed_values_only() {
        let r = rules("status", "in:draft,published");
        assert!(evaluate(&r, &data(&[("status", json!("draft"))])).is_valid);
        assert!(!evaluate(&r, &data(&[("status", json!("archived"))])).is_valid);
    }

    #[test]
    fn regex_rule_rejects_non_matching_text() {
        let r = rules("code", "regex:^[A-Z]{3}$");
        assert!(evaluate(&r, &data(&[("code", json!("ABC"))])).is_valid);
        let result = evaluate(&r, &data(&[("code", json!("anything at all"))]));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].rule, "regex");
    }

    #[test]
    fn collects_violations_across_fields() {
        let r = rules("name", "required")
            .with_spec("email", "required|email")
            .unwrap();
        let result = evaluate(&r, &data(&[("email", json!("bad"))]));
        assert_eq!(result.errors.len(), 2);
        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"email"));
    }
}
