//! Field metadata and per-kind value formatting.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The closed set of field kinds a resource can declare.
///
/// Serialized with a `type` tag so form payloads read
/// `{"type": "belongsTo", "resource": "categories", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    TextArea,
    Number,
    Email,
    Hidden,
    Check,
    /// Foreign key into another registered resource (by slug).
    BelongsTo { resource: String },
}

impl FieldKind {
    /// Format a raw attribute for read-only display.
    ///
    /// Returns `None` for kinds whose display value cannot be derived from
    /// the raw attribute alone (belongs-to needs a lookup).
    pub fn display(&self, raw: Option<&Value>) -> Option<Value> {
        match self {
            FieldKind::Check => Some(check_badge(is_truthy(raw))),
            FieldKind::BelongsTo { .. } => None,
            FieldKind::Text
            | FieldKind::TextArea
            | FieldKind::Number
            | FieldKind::Email
            | FieldKind::Hidden => Some(raw.cloned().unwrap_or(Value::Null)),
        }
    }

    pub fn related_resource(&self) -> Option<&str> {
        match self {
            FieldKind::BelongsTo { resource } => Some(resource),
            _ => None,
        }
    }
}

/// One attribute of a resource as shown in forms and detail views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Column name.
    pub field: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Current value, attached per request for edit forms.
    #[serde(default)]
    pub value: Option<Value>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind, field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            label: label.into(),
            placeholder: None,
            value: None,
        }
    }

    pub fn text(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::Text, field, label)
    }

    pub fn check(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::Check, field, label)
    }

    pub fn belongs_to(
        field: impl Into<String>,
        label: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self::new(
            FieldKind::BelongsTo {
                resource: resource.into(),
            },
            field,
            label,
        )
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Loose truthiness for checkbox columns (`1`, `"1"`, `true`, non-empty text).
pub fn is_truthy(raw: Option<&Value>) -> bool {
    match raw {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !matches!(s.trim(), "" | "0" | "false"),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn check_badge(on: bool) -> Value {
    if on {
        json!({ "badge": "success", "text": "Sim" })
    } else {
        json!({ "badge": "danger", "text": "Não" })
    }
}
