//! JSON resource manifests.
//!
//! Lets a deployment declare its resources in a file instead of code. Only
//! the built-in filter kinds are available here; custom filters and
//! policies need a [`ResourceDefinition`] built in Rust.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::CoreError;
use crate::registry::ResourceRegistry;
use crate::resource::{
    Abilities, FieldSpec, FilterOption, LensSpec, RangeFilter, ResourceDefinition, ResourceId,
    SelectFilter,
};
use crate::validation::RuleSet;

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceManifest {
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterEntry {
    Select {
        field: String,
        label: String,
        #[serde(default)]
        options: Vec<FilterOption>,
    },
    Range {
        field: String,
        label: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    pub id: u32,
    pub slug: String,
    /// Defaults to the slug.
    #[serde(default)]
    pub table: Option<String>,
    pub label: String,
    pub singular_label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_column: Option<String>,
    #[serde(default)]
    pub code_column: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
    #[serde(default)]
    pub search: Vec<String>,
    #[serde(default)]
    pub lenses: Vec<LensSpec>,
    #[serde(default)]
    pub results_per_page: Option<u64>,
    /// Field → pipe-separated rules, e.g. `{"email": "required|email"}`.
    #[serde(default)]
    pub rules: BTreeMap<String, String>,
    #[serde(default)]
    pub globally_searchable: bool,
    #[serde(default)]
    pub permissions: Abilities,
}

impl ResourceEntry {
    pub fn into_definition(self) -> Result<ResourceDefinition, CoreError> {
        let mut rules = RuleSet::new();
        for (field, spec) in &self.rules {
            rules = rules.with_spec(field.as_str(), spec)?;
        }

        let table = self.table.unwrap_or_else(|| self.slug.clone());
        let mut def = ResourceDefinition::new(ResourceId(self.id), self.slug, table)
            .labels(self.label, self.singular_label)
            .search(self.search)
            .rules(rules)
            .globally_searchable(self.globally_searchable)
            .policy(Arc::new(self.permissions));

        if let Some(icon) = self.icon {
            def = def.icon(icon);
        }
        if let Some(column) = self.display_column {
            def = def.display_column(column);
        }
        if let Some(column) = self.code_column {
            def = def.code_column(column);
        }
        if let Some(per_page) = self.results_per_page {
            def = def.per_page(per_page);
        }
        for field in self.fields {
            def = def.field(field);
        }
        for lens in self.lenses {
            def = def.lens(lens);
        }
        for filter in self.filters {
            def = match filter {
                FilterEntry::Select {
                    field,
                    label,
                    options,
                } => {
                    let mut select = SelectFilter::new(field, label);
                    select.options = options;
                    def.filter(Arc::new(select))
                }
                FilterEntry::Range { field, label } => {
                    def.filter(Arc::new(RangeFilter::new(field, label)))
                }
            };
        }
        Ok(def)
    }
}

impl ResourceManifest {
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("Invalid resource manifest: {e}")))
    }

    /// Build the registry, checking that every belongs-to target exists.
    pub fn into_registry(self) -> Result<ResourceRegistry, CoreError> {
        let mut builder = ResourceRegistry::builder();
        for entry in self.resources {
            builder = builder.register(entry.into_definition()?);
        }
        let registry = builder.build()?;

        for resource in registry.all() {
            for field in &resource.fields {
                if let Some(target) = field.kind.related_resource() {
                    if registry.find(target).is_err() {
                        return Err(CoreError::Validation(format!(
                            "Field '{}' of '{}' references unknown resource '{target}'",
                            field.field, resource.slug
                        )));
                    }
                }
            }
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::actor::Actor;
    use crate::query::{build_list, Predicate, QueryParams};
    use crate::resource::FieldKind;

    const MANIFEST: &str = r#"{
        "resources": [
            {
                "id": 1,
                "slug": "categories",
                "label": "Categorias",
                "singular_label": "Categoria",
                "fields": [{"type": "text", "field": "name", "label": "Nome"}]
            },
            {
                "id": 2,
                "slug": "products",
                "label": "Produtos",
                "singular_label": "Produto",
                "results_per_page": 5,
                "fields": [
                    {"type": "text", "field": "name", "label": "Nome"},
                    {"type": "check", "field": "active", "label": "Ativo"},
                    {"type": "belongsTo", "field": "category_id", "label": "Categoria",
                     "resource": "categories"}
                ],
                "filters": [{"kind": "select", "field": "status", "label": "Status"}],
                "search": ["name"],
                "lenses": [{"field": "active", "label": "Ativos", "value": "1"}],
                "rules": {"name": "required|max:80"},
                "globally_searchable": true,
                "permissions": {"delete": ["admin"]}
            }
        ]
    }"#;

    #[test]
    fn builds_registry_from_json() {
        let registry = ResourceManifest::from_json(MANIFEST)
            .unwrap()
            .into_registry()
            .unwrap();
        let products = registry.find("products").unwrap();
        assert_eq!(products.table, "products");
        assert_eq!(products.results_per_page, 5);
        assert_eq!(
            products.fields[2].kind,
            FieldKind::BelongsTo {
                resource: "categories".into()
            }
        );
        assert!(products.globally_searchable);
        assert!(!products.can_delete(&Actor::user(1, "creator")));
        assert!(products.can_delete(&Actor::user(1, "admin")));
        assert!(products.rules.get("name").is_some());

        let params: QueryParams = [("status".to_string(), "on".to_string())].into();
        let q = build_list(products, &params);
        assert_eq!(q.predicates[0], Predicate::eq("status", "on"));
    }

    #[test]
    fn unknown_belongs_to_target_is_rejected() {
        let raw = r#"{"resources": [{
            "id": 1, "slug": "products", "label": "P", "singular_label": "P",
            "fields": [{"type": "belongsTo", "field": "x_id", "label": "X", "resource": "nope"}]
        }]}"#;
        assert_matches!(
            ResourceManifest::from_json(raw).unwrap().into_registry(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn bad_rule_is_rejected() {
        let raw = r#"{"resources": [{
            "id": 1, "slug": "a", "label": "A", "singular_label": "A",
            "rules": {"name": "required|frobnicate"}
        }]}"#;
        assert_matches!(
            ResourceManifest::from_json(raw).unwrap().into_registry(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn broken_regex_rule_is_rejected() {
        let raw = r#"{"resources": [{
            "id": 1, "slug": "a", "label": "A", "singular_label": "A",
            "rules": {"code": "required|regex:[A-Z"}
        }]}"#;
        assert_matches!(
            ResourceManifest::from_json(raw).unwrap().into_registry(),
            Err(CoreError::Validation(_))
        );
    }
}
