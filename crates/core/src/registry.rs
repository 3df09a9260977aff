//! Typed, immutable registry of resource definitions.
//!
//! The registry is built once at startup and then shared read-only
//! (`Arc<ResourceRegistry>` in request state, or the process-wide instance
//! installed with [`ResourceRegistry::install`]).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::error::CoreError;
use crate::resource::{ResourceDefinition, ResourceId};

static GLOBAL: OnceLock<Arc<ResourceRegistry>> = OnceLock::new();

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<Arc<ResourceDefinition>>,
    by_slug: HashMap<String, usize>,
    by_id: HashMap<ResourceId, usize>,
}

impl ResourceRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolve a resource by slug or by numeric id.
    ///
    /// An identifier made only of digits is looked up as an id, anything
    /// else as a slug. There is no fallback between the two.
    pub fn find(&self, identifier: &str) -> Result<&Arc<ResourceDefinition>, CoreError> {
        let identifier = identifier.trim();
        let is_numeric =
            !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit());
        let index = if is_numeric {
            identifier
                .parse::<u32>()
                .ok()
                .and_then(|id| self.by_id.get(&ResourceId(id)))
        } else {
            self.by_slug.get(identifier)
        };
        index
            .map(|&i| &self.resources[i])
            .ok_or_else(|| CoreError::not_found("Resource", identifier))
    }

    /// All resources in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<ResourceDefinition>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Install `registry` as the process-wide instance.
    ///
    /// Fails if one is already installed; the installed registry lives until
    /// process exit.
    pub fn install(registry: Arc<ResourceRegistry>) -> Result<&'static Arc<ResourceRegistry>, CoreError> {
        GLOBAL
            .set(registry)
            .map_err(|_| CoreError::Conflict("Resource registry already installed".into()))?;
        let installed = GLOBAL
            .get()
            .ok_or_else(|| CoreError::Internal("Resource registry missing after install".into()))?;
        tracing::info!(resources = installed.len(), "Resource registry installed");
        Ok(installed)
    }
}

/// Collects definitions and rejects duplicate ids or slugs.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    resources: Vec<ResourceDefinition>,
}

impl RegistryBuilder {
    pub fn register(mut self, resource: ResourceDefinition) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn build(self) -> Result<ResourceRegistry, CoreError> {
        let mut registry = ResourceRegistry::default();

        for resource in self.resources {
            if resource.slug.trim().is_empty() || resource.slug.parse::<u32>().is_ok() {
                return Err(CoreError::Validation(format!(
                    "Resource {} needs a non-numeric slug",
                    resource.id
                )));
            }
            if registry.by_slug.contains_key(&resource.slug) {
                return Err(CoreError::Conflict(format!(
                    "Duplicate resource slug '{}'",
                    resource.slug
                )));
            }
            if registry.by_id.contains_key(&resource.id) {
                return Err(CoreError::Conflict(format!(
                    "Duplicate resource id {}",
                    resource.id
                )));
            }

            let index = registry.resources.len();
            registry.by_slug.insert(resource.slug.clone(), index);
            registry.by_id.insert(resource.id, index);
            registry.resources.push(Arc::new(resource));
        }

        Ok(registry)
    }
}
