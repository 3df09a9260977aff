//! Global search query composition and result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{value_text, CompareOp, Predicate};
use crate::resource::ResourceDefinition;
use crate::types::{record_id, Record};

/// Default cap on the number of global search hits returned.
pub const DEFAULT_GLOBAL_SEARCH_LIMIT: usize = 100;

/// One global search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSearchHit {
    /// Singular label of the resource the record belongs to.
    pub resource: String,
    pub name: String,
    pub link: String,
}

/// Condition selecting global search matches in `resource`.
///
/// Every search column must contain `term` (AND), restricted to records with
/// a positive id. Returns `None` when the resource declares no search
/// columns or the term is blank.
pub fn global_search_condition(resource: &ResourceDefinition, term: &str) -> Option<Predicate> {
    let term = term.trim();
    if term.is_empty() || resource.search.is_empty() {
        return None;
    }

    let mut predicates = vec![Predicate::compare("id", CompareOp::Gt, 0)];
    predicates.extend(
        resource
            .search
            .iter()
            .map(|column| Predicate::contains(column.as_str(), term)),
    );
    Some(Predicate::All(predicates))
}

/// Build the hit for a matched record.
pub fn hit_for(resource: &ResourceDefinition, record: &Record) -> GlobalSearchHit {
    let name = record
        .get(&resource.display_column)
        .and_then(value_text)
        .unwrap_or_default();

    let code = record
        .get(&resource.code_column)
        .filter(|v| !matches!(v, Value::Null))
        .and_then(value_text)
        .or_else(|| record_id(record).map(|id| id.to_string()))
        .unwrap_or_default();

    GlobalSearchHit {
        resource: resource.singular_label.clone(),
        name,
        link: resource.record_route(&code),
    }
}
