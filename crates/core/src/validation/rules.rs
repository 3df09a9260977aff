//! Constraint and rule-set types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single constraint attached to a field.
///
/// Constraints can be written in the compact pipe syntax used by resource
/// manifests, e.g. `"required|email|max:255"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Required,
    /// Minimum string length, or minimum value for numbers.
    Min(i64),
    /// Maximum string length, or maximum value for numbers.
    Max(i64),
    Email,
    Numeric,
    Integer,
    Boolean,
    In(Vec<String>),
    Regex(Pattern),
}

/// A compiled `regex:` constraint pattern. Compares by source text.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, CoreError> {
        Regex::new(source).map(Pattern).map_err(|e| {
            CoreError::Validation(format!("Invalid regex rule pattern '{source}': {e}"))
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl Constraint {
    /// Short rule name reported in violations.
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Required => "required",
            Constraint::Min(_) => "min",
            Constraint::Max(_) => "max",
            Constraint::Email => "email",
            Constraint::Numeric => "numeric",
            Constraint::Integer => "integer",
            Constraint::Boolean => "boolean",
            Constraint::In(_) => "in",
            Constraint::Regex(_) => "regex",
        }
    }
}

impl FromStr for Constraint {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (name, arg) = match raw.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (raw, None),
        };

        let int_arg = |arg: Option<&str>| -> Result<i64, CoreError> {
            arg.and_then(|a| a.parse().ok()).ok_or_else(|| {
                CoreError::Validation(format!("Rule '{raw}' requires an integer argument"))
            })
        };

        match name {
            "required" => Ok(Constraint::Required),
            "min" => Ok(Constraint::Min(int_arg(arg)?)),
            "max" => Ok(Constraint::Max(int_arg(arg)?)),
            "email" => Ok(Constraint::Email),
            "numeric" => Ok(Constraint::Numeric),
            "integer" => Ok(Constraint::Integer),
            "boolean" => Ok(Constraint::Boolean),
            "in" => Ok(Constraint::In(
                arg.unwrap_or_default()
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect(),
            )),
            "regex" => match arg {
                Some(pattern) if !pattern.is_empty() => Ok(Constraint::Regex(Pattern::new(pattern)?)),
                _ => Err(CoreError::Validation(format!(
                    "Rule '{raw}' requires a pattern"
                ))),
            },
            other => Err(CoreError::Validation(format!("Unknown validation rule '{other}'"))),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Min(n) => write!(f, "min:{n}"),
            Constraint::Max(n) => write!(f, "max:{n}"),
            Constraint::In(values) => write!(f, "in:{}", values.join(",")),
            Constraint::Regex(pattern) => write!(f, "regex:{}", pattern.as_str()),
            other => f.write_str(other.name()),
        }
    }
}

/// Constraints for every validated field of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<String, Vec<Constraint>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add constraints for `field`, appending to any already declared.
    pub fn with(mut self, field: impl Into<String>, constraints: Vec<Constraint>) -> Self {
        self.rules.entry(field.into()).or_default().extend(constraints);
        self
    }

    /// Parse a pipe-separated rule string (`"required|max:255"`) for `field`.
    pub fn with_spec(self, field: impl Into<String>, spec: &str) -> Result<Self, CoreError> {
        let constraints = spec
            .split('|')
            .filter(|part| !part.trim().is_empty())
            .map(Constraint::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with(field, constraints))
    }

    pub fn get(&self, field: &str) -> Option<&[Constraint]> {
        self.rules.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Constraint])> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Aggregated result of evaluating a rule set against one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldViolation>,
}

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Group violations by field, the shape form front-ends expect.
pub fn violations_by_field(violations: &[FieldViolation]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for v in violations {
        grouped.entry(v.field.clone()).or_default().push(v.message.clone());
    }
    grouped
}
