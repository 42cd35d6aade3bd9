//! In-memory email template store.

use std::time::Instant;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::metrics::StoreMetrics;

use super::store::{name_filter, EmailTemplateStore};
use super::types::{EmailTemplate, TemplateError, TemplateResult};

const BACKEND: &str = "memory";

/// In-memory template storage.
///
/// Keeps a secondary name index so that the uniqueness check and the insert
/// happen under the same shard lock.
pub struct MemoryTemplateStore {
    /// Templates keyed by id
    templates: DashMap<String, EmailTemplate>,

    /// Name -> id index over live templates
    names: DashMap<String, String>,
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
            names: DashMap::new(),
        }
    }

    fn insert(&self, template: EmailTemplate) -> TemplateResult<EmailTemplate> {
        match self.names.entry(template.name.clone()) {
            Entry::Occupied(_) => Err(TemplateError::NameConflict(template.name)),
            Entry::Vacant(name_slot) => match self.templates.entry(template.id.clone()) {
                Entry::Occupied(_) => Err(TemplateError::DuplicateId(template.id)),
                Entry::Vacant(id_slot) => {
                    name_slot.insert(template.id.clone());
                    id_slot.insert(template.clone());
                    Ok(template)
                }
            },
        }
    }

    /// Lock order matches `insert`: name entry, then id.
    fn remove(&self, id: &str) -> TemplateResult<()> {
        let name = self
            .templates
            .get(id)
            .map(|t| t.name.clone())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;

        match self.names.entry(name) {
            Entry::Occupied(name_slot) if name_slot.get() == id => {
                self.templates.remove(id);
                name_slot.remove();
                Ok(())
            }
            // Deleted concurrently
            _ => Err(TemplateError::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl EmailTemplateStore for MemoryTemplateStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, id: &str) -> TemplateResult<EmailTemplate> {
        let start = Instant::now();
        let result = self
            .templates
            .get(id)
            .map(|t| t.clone())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()));

        StoreMetrics::observe(BACKEND, "get", start, &result);
        result
    }

    async fn get_by_name(&self, name: &str) -> TemplateResult<EmailTemplate> {
        let start = Instant::now();
        let id = self.names.get(name).map(|entry| entry.value().clone());

        let result = id
            .and_then(|id| self.templates.get(&id).map(|t| t.clone()))
            .ok_or_else(|| TemplateError::NotFound(name.to_string()));

        StoreMetrics::observe(BACKEND, "get_by_name", start, &result);
        result
    }

    async fn list(&self, name: Option<&str>) -> TemplateResult<Vec<EmailTemplate>> {
        let start = Instant::now();
        let filter = name_filter(name);

        let mut templates: Vec<EmailTemplate> = self
            .templates
            .iter()
            .filter(|entry| filter.map_or(true, |n| entry.value().name == n))
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let result = Ok(templates);
        StoreMetrics::observe(BACKEND, "list", start, &result);
        result
    }

    async fn create(&self, template: EmailTemplate) -> TemplateResult<EmailTemplate> {
        let start = Instant::now();
        let result = self.insert(template);

        match &result {
            Ok(created) => tracing::debug!(
                template_id = %created.id,
                name = %created.name,
                "Email template stored in memory"
            ),
            Err(e) => tracing::debug!(error = %e, "Email template rejected"),
        }

        StoreMetrics::observe(BACKEND, "create", start, &result);
        result
    }

    async fn delete(&self, id: &str) -> TemplateResult<()> {
        let start = Instant::now();
        let result = self.remove(id);

        StoreMetrics::observe(BACKEND, "delete", start, &result);
        result
    }

    async fn count(&self) -> TemplateResult<usize> {
        Ok(self.templates.len())
    }
}
