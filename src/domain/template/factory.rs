//! Template store factory

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::postgres::PostgresPool;

use super::memory_store::MemoryTemplateStore;
use super::postgres_store::PostgresTemplateStore;
use super::store::EmailTemplateStore;
use super::types::TemplateResult;

/// Create a template store based on configuration.
///
/// Returns the appropriate backend implementation based on `store.backend`:
/// - `"postgres"`: a `PostgresTemplateStore` if a PostgreSQL pool is provided.
///   The table is created when missing.
/// - `"memory"`: a `MemoryTemplateStore`
///
/// # Example
///
/// ```rust,ignore
/// let store = create_template_store(&settings, Some(&pg_pool)).await?;
/// ```
pub async fn create_template_store(
    settings: &Settings,
    postgres_pool: Option<&PostgresPool>,
) -> TemplateResult<Arc<dyn EmailTemplateStore>> {
    match settings.store.backend.as_str() {
        "postgres" => match (postgres_pool, settings.database.as_ref()) {
            (Some(pool), Some(database)) => {
                tracing::info!(
                    backend = "postgres",
                    table = %database.table,
                    timeout_seconds = settings.store.timeout,
                    "Creating PostgreSQL template store"
                );
                let store = PostgresTemplateStore::new(
                    pool.pool().clone(),
                    database.table.clone(),
                    Duration::from_secs(settings.store.timeout),
                )?;
                store.ensure_schema().await?;
                Ok(Arc::new(store))
            }
            _ => {
                tracing::warn!(
                    "PostgreSQL backend requested but no pool provided, falling back to memory"
                );
                Ok(Arc::new(MemoryTemplateStore::new()))
            }
        },
        _ => {
            tracing::info!(backend = "memory", "Creating memory template store");
            Ok(Arc::new(MemoryTemplateStore::new()))
        }
    }
}
