//! Resource metadata.
//!
//! A [`ResourceDefinition`] describes one domain entity once (fields,
//! filters, search columns, lenses, permissions, labels and validation
//! rules) and every generic CRUD operation is derived from it.

pub mod field;
pub mod filter;
pub mod lens;
pub mod policy;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use field::{FieldKind, FieldSpec};
pub use filter::{FilterInfo, FilterOption, RangeFilter, ResourceFilter, SelectFilter};
pub use lens::LensSpec;
pub use policy::{Abilities, AbilityRule, AllowAll, ResourcePolicy};

use crate::actor::Actor;
use crate::validation::RuleSet;

/// Mount point of the resource routes; links are built beneath it.
pub const RESOURCE_ROUTE_PREFIX: &str = "/api/v1/resources";

/// Default page size for resource listings.
pub const DEFAULT_RESULTS_PER_PAGE: u64 = 20;

/// Columns never offered as CSV import targets.
pub const NON_IMPORTABLE_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "deleted_at",
    "updated_at",
    "email_verified_at",
    "confirmation_token",
    "recovery_token",
    "password",
];

/// Numeric identity of a registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static description of one admin resource.
///
/// Built once at startup with the chained setters below and never mutated
/// after it is handed to the registry.
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub id: ResourceId,
    /// Route segment, e.g. `customers`.
    pub slug: String,
    /// Plural label.
    pub label: String,
    pub singular_label: String,
    pub icon: Option<String>,
    /// Backing table.
    pub table: String,
    /// Column shown when the record is referenced elsewhere.
    pub display_column: String,
    /// Public code column used in links; falls back to `id`.
    pub code_column: String,
    pub fields: Vec<FieldSpec>,
    pub filters: Vec<Arc<dyn ResourceFilter>>,
    pub search: Vec<String>,
    pub lenses: Vec<LensSpec>,
    pub results_per_page: u64,
    pub rules: RuleSet,
    pub globally_searchable: bool,
    pub policy: Arc<dyn ResourcePolicy>,
}

impl ResourceDefinition {
    pub fn new(id: ResourceId, slug: impl Into<String>, table: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id,
            label: slug.clone(),
            singular_label: slug.clone(),
            slug,
            icon: None,
            table: table.into(),
            display_column: "name".to_string(),
            code_column: "code".to_string(),
            fields: Vec::new(),
            filters: Vec::new(),
            search: Vec::new(),
            lenses: Vec::new(),
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            rules: RuleSet::new(),
            globally_searchable: false,
            policy: Arc::new(AllowAll),
        }
    }

    pub fn labels(mut self, plural: impl Into<String>, singular: impl Into<String>) -> Self {
        self.label = plural.into();
        self.singular_label = singular.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn display_column(mut self, column: impl Into<String>) -> Self {
        self.display_column = column.into();
        self
    }

    pub fn code_column(mut self, column: impl Into<String>) -> Self {
        self.code_column = column.into();
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn filter(mut self, filter: Arc<dyn ResourceFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn search<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn lens(mut self, lens: LensSpec) -> Self {
        self.lenses.push(lens);
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.results_per_page = per_page.max(1);
        self
    }

    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn globally_searchable(mut self, searchable: bool) -> Self {
        self.globally_searchable = searchable;
        self
    }

    pub fn policy(mut self, policy: Arc<dyn ResourcePolicy>) -> Self {
        self.policy = policy;
        self
    }

    // -----------------------------------------------------------------------
    // Permission predicates
    // -----------------------------------------------------------------------

    pub fn can_view_list(&self, actor: &Actor) -> bool {
        self.policy.can_view_list(actor)
    }

    pub fn can_view(&self, actor: &Actor) -> bool {
        self.policy.can_view(actor)
    }

    pub fn can_create(&self, actor: &Actor) -> bool {
        self.policy.can_create(actor)
    }

    pub fn can_update(&self, actor: &Actor) -> bool {
        self.policy.can_update(actor)
    }

    pub fn can_delete(&self, actor: &Actor) -> bool {
        self.policy.can_delete(actor)
    }

    /// Importing creates records, so it also requires `can_create`.
    pub fn can_import(&self, actor: &Actor) -> bool {
        self.policy.can_import(actor) && self.policy.can_create(actor)
    }

    // -----------------------------------------------------------------------
    // Derived metadata
    // -----------------------------------------------------------------------

    /// Base route of this resource, e.g. `/api/v1/resources/customers`.
    pub fn route(&self) -> String {
        format!("{RESOURCE_ROUTE_PREFIX}/{}", self.slug)
    }

    /// Link to a single record, identified by its public code.
    pub fn record_route(&self, code: &str) -> String {
        format!("{}/{code}", self.route())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// Whether `column` may be used for ordering a list.
    pub fn is_orderable(&self, column: &str) -> bool {
        column == "id"
            || column == self.display_column
            || self.fields.iter().any(|f| f.field == column)
            || self.search.iter().any(|s| s == column)
    }

    /// Field columns a CSV import may target, in declaration order.
    pub fn importable_columns(&self) -> Vec<String> {
        self.field_names()
            .filter(|name| !NON_IMPORTABLE_COLUMNS.contains(name))
            .map(str::to_string)
            .collect()
    }

    pub fn filter_info(&self) -> Vec<FilterInfo> {
        self.filters.iter().map(|f| f.info()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> ResourceDefinition {
        ResourceDefinition::new(ResourceId(3), "users", "users")
            .labels("Usuários", "Usuário")
            .field(FieldSpec::text("name", "Nome"))
            .field(FieldSpec::text("email", "Email"))
            .field(FieldSpec::text("password", "Senha"))
            .field(FieldSpec::check("active", "Ativo"))
    }

    #[test]
    fn routes_are_built_from_slug() {
        let r = users();
        assert_eq!(r.route(), "/api/v1/resources/users");
        assert_eq!(r.record_route("abc"), "/api/v1/resources/users/abc");
    }

    #[test]
    fn importable_columns_skip_system_columns() {
        assert_eq!(users().importable_columns(), vec!["name", "email", "active"]);
    }

    #[test]
    fn orderable_columns_are_restricted() {
        let r = users();
        assert!(r.is_orderable("id"));
        assert!(r.is_orderable("email"));
        assert!(!r.is_orderable("created_at; --"));
    }

    #[test]
    fn import_requires_create_permission() {
        let abilities = Abilities {
            create: AbilityRule::Fixed(false),
            ..Abilities::default()
        };
        let r = users().policy(Arc::new(abilities));
        assert!(!r.can_import(&Actor::anonymous()));
    }
}
