//! List query composition.
//!
//! A [`ListQuery`] is the store-agnostic description of one page of a
//! resource listing: ordering, an AND-list of [`Predicate`]s and pagination.
//! Stores translate it into SQL or evaluate it in memory; nothing in here
//! touches persistence.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::ResourceDefinition;
use crate::types::Record;

/// Raw request parameters (`?order_by=...&_=...&status=...`).
pub type QueryParams = BTreeMap<String, String>;

/// Parameter carrying the free-text search term.
pub const SEARCH_PARAM: &str = "_";
pub const ORDER_BY_PARAM: &str = "order_by";
pub const ORDER_TYPE_PARAM: &str = "order_type";
pub const PAGE_PARAM: &str = "page";

/// Column used for ordering when none (or an unknown one) is requested.
pub const DEFAULT_ORDER_COLUMN: &str = "id";

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse a requested direction; anything but `asc`/`desc` yields `Desc`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl Default for OrderBy {
    fn default() -> Self {
        Self {
            field: DEFAULT_ORDER_COLUMN.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match (`LIKE '%term%'`).
    Contains,
}

/// A boolean condition over a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn contains(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Contains, Value::String(term.into()))
    }

    /// Evaluate against an in-memory record.
    ///
    /// `All([])` is true and `Any([])` is false, matching SQL's neutral
    /// elements for `AND` / `OR`.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::All(children) => children.iter().all(|p| p.matches(record)),
            Predicate::Any(children) => children.iter().any(|p| p.matches(record)),
            Predicate::Compare { field, op, value } => {
                let actual = record.get(field).unwrap_or(&Value::Null);
                match op {
                    CompareOp::Eq => loose_eq(actual, value),
                    CompareOp::Ne => !actual.is_null() && !loose_eq(actual, value),
                    CompareOp::Gt => loose_cmp(actual, value) == Some(Ordering::Greater),
                    CompareOp::Gte => matches!(
                        loose_cmp(actual, value),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    CompareOp::Lt => loose_cmp(actual, value) == Some(Ordering::Less),
                    CompareOp::Lte => matches!(
                        loose_cmp(actual, value),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    CompareOp::Contains => match (value_text(actual), value_text(value)) {
                        (Some(haystack), Some(needle)) => haystack
                            .to_lowercase()
                            .contains(&needle.to_lowercase()),
                        _ => false,
                    },
                }
            }
        }
    }
}

/// Textual form of a scalar, as a SQL `::text` cast would produce it.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Equality that tolerates request parameters arriving as strings.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(x), other) | (other, Value::Bool(x)) => match other {
            Value::Bool(y) => x == y,
            _ => value_text(other).is_some_and(|t| {
                matches!(
                    (*x, t.trim()),
                    (true, "1" | "true") | (false, "0" | "false")
                )
            }),
        },
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x == y,
            _ => value_text(a) == value_text(b),
        },
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric comparison when both sides are numeric, text comparison otherwise.
pub fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => Some(value_text(a)?.cmp(&value_text(b)?)),
    }
}

// ---------------------------------------------------------------------------
// ListQuery
// ---------------------------------------------------------------------------

/// One page of a resource listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub order: OrderBy,
    /// Conditions combined with AND.
    pub predicates: Vec<Predicate>,
    /// 1-based page number.
    pub page: u64,
    pub per_page: u64,
}

impl ListQuery {
    pub fn new(order: OrderBy, per_page: u64) -> Self {
        Self {
            order,
            predicates: Vec::new(),
            page: 1,
            per_page: per_page.max(1),
        }
    }

    /// Narrow the result set with one more AND-ed condition.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    /// Rows to skip. Saturates at `i64::MAX`, the largest SQL `OFFSET`.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.per_page)
            .min(i64::MAX as u64)
    }

    /// The AND of all predicates as a single tree.
    pub fn condition(&self) -> Predicate {
        Predicate::All(self.predicates.clone())
    }
}

/// A materialized page with total-count metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, current_page: u64, per_page: u64) -> Self {
        let last_page = if total == 0 {
            1
        } else {
            total.div_ceil(per_page.max(1))
        };
        Self {
            data,
            total,
            current_page,
            per_page,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            current_page: self.current_page,
            per_page: self.per_page,
            last_page: self.last_page,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Compose the list query for `resource` from request parameters.
///
/// - ordering is restricted to `id` and declared columns; unknown columns
///   fall back to `id`, unknown directions to `desc`
/// - declared filters narrow the set in declaration order (AND)
/// - the free-text term is matched against every search column (OR)
/// - each lens whose field appears in `params` adds an equality (AND)
pub fn build_list(resource: &ResourceDefinition, params: &QueryParams) -> ListQuery {
    let order_field = params
        .get(ORDER_BY_PARAM)
        .map(|f| f.trim())
        .filter(|f| !f.is_empty() && resource.is_orderable(f))
        .unwrap_or(DEFAULT_ORDER_COLUMN);

    let order = OrderBy {
        field: order_field.to_string(),
        direction: SortDirection::parse(params.get(ORDER_TYPE_PARAM).map(String::as_str)),
    };

    let page = params
        .get(PAGE_PARAM)
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(1);

    let mut query = ListQuery::new(order, resource.results_per_page).page(page);

    for filter in &resource.filters {
        query = filter.apply(query, params);
    }

    if !resource.search.is_empty() {
        let term = params.get(SEARCH_PARAM).cloned().unwrap_or_default();
        query = query.filter(Predicate::Any(
            resource
                .search
                .iter()
                .map(|column| Predicate::contains(column.as_str(), term.as_str()))
                .collect(),
        ));
    }

    for lens in &resource.lenses {
        if let Some(value) = params.get(&lens.field) {
            query = query.filter(Predicate::eq(lens.field.as_str(), value.as_str()));
        }
    }

    query
}
