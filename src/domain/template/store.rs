//! Storage trait for email templates.
//!
//! This module defines the abstraction layer for template storage, allowing
//! different implementations (memory, PostgreSQL) to be used interchangeably.

use async_trait::async_trait;

use super::types::{EmailTemplate, TemplateResult};

/// Backend trait for email template storage.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`) as they are shared
/// across request handlers.
///
/// # Uniqueness
///
/// `create` rejects a record whose `name` is already used by a live template
/// with `TemplateError::NameConflict`. Implementations backed by a real
/// database should also enforce this with a storage-level constraint and map
/// its duplicate-key error to the same variant.
///
/// # Errors
///
/// Lookups and deletes of unknown ids return `TemplateError::NotFound`.
/// Timeouts and driver failures are reported as persistence errors
/// (see `TemplateError::is_persistence`).
#[async_trait]
pub trait EmailTemplateStore: Send + Sync {
    /// Short backend identifier used in logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Get a template by ID.
    async fn get(&self, id: &str) -> TemplateResult<EmailTemplate>;

    /// Get a template by name.
    async fn get_by_name(&self, name: &str) -> TemplateResult<EmailTemplate>;

    /// List templates, optionally only those with the given name.
    ///
    /// `None` and `Some("")` both list everything.
    async fn list(&self, name: Option<&str>) -> TemplateResult<Vec<EmailTemplate>>;

    /// Persist a new template. The id is supplied by the caller.
    async fn create(&self, template: EmailTemplate) -> TemplateResult<EmailTemplate>;

    /// Permanently delete a template by ID.
    async fn delete(&self, id: &str) -> TemplateResult<()>;

    /// Number of stored templates.
    async fn count(&self) -> TemplateResult<usize>;
}

/// Normalize a list filter so that an empty name means "no filter".
pub(crate) fn name_filter(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}
