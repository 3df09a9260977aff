//! Declarative list filters.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::query::{CompareOp, ListQuery, Predicate, QueryParams};

/// Description of a filter for the list-view payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterInfo {
    /// Request parameter(s) the filter reads.
    pub params: Vec<String>,
    pub label: String,
    pub kind: &'static str,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// A filter narrows a list query based on request parameters.
///
/// Filters are applied in declaration order and each one may only add
/// conditions, so the result is always the AND of every active filter.
pub trait ResourceFilter: Send + Sync + Debug {
    fn apply(&self, query: ListQuery, params: &QueryParams) -> ListQuery;

    fn info(&self) -> FilterInfo;
}

fn param_value<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Equality on `field`, read from the parameter of the same name.
#[derive(Debug, Clone)]
pub struct SelectFilter {
    pub field: String,
    pub label: String,
    pub options: Vec<FilterOption>,
}

impl SelectFilter {
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(FilterOption {
            value: value.into(),
            label: label.into(),
        });
        self
    }
}

impl ResourceFilter for SelectFilter {
    fn apply(&self, query: ListQuery, params: &QueryParams) -> ListQuery {
        match param_value(params, &self.field) {
            Some(value) => query.filter(Predicate::eq(self.field.as_str(), value)),
            None => query,
        }
    }

    fn info(&self) -> FilterInfo {
        FilterInfo {
            params: vec![self.field.clone()],
            label: self.label.clone(),
            kind: "select",
            options: self.options.clone(),
        }
    }
}

/// Inclusive bounds on `field` from `<field>_from` and `<field>_to`.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    pub field: String,
    pub label: String,
}

impl RangeFilter {
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
        }
    }

    fn from_param(&self) -> String {
        format!("{}_from", self.field)
    }

    fn to_param(&self) -> String {
        format!("{}_to", self.field)
    }
}

impl ResourceFilter for RangeFilter {
    fn apply(&self, mut query: ListQuery, params: &QueryParams) -> ListQuery {
        if let Some(from) = param_value(params, &self.from_param()) {
            query = query.filter(Predicate::compare(
                self.field.as_str(),
                CompareOp::Gte,
                from,
            ));
        }
        if let Some(to) = param_value(params, &self.to_param()) {
            query = query.filter(Predicate::compare(self.field.as_str(), CompareOp::Lte, to));
        }
        query
    }

    fn info(&self) -> FilterInfo {
        FilterInfo {
            params: vec![self.from_param(), self.to_param()],
            label: self.label.clone(),
            kind: "range",
            options: Vec::new(),
        }
    }
}
