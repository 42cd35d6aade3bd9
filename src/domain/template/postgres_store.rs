//! PostgreSQL-based email template store.
//!
//! Templates live in a single table whose name comes from configuration.
//! Tokens are stored as JSONB. The table carries a `UNIQUE` constraint on
//! `name`, which is the authoritative uniqueness guarantee; the read-by-name
//! performed before each insert only exists to produce a `NameConflict`
//! without hitting the constraint in the common case.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::metrics::StoreMetrics;

use super::store::{name_filter, EmailTemplateStore};
use super::types::{EmailTemplate, TemplateError, TemplateResult, Token};

const BACKEND: &str = "postgres";

/// Longest table name that still leaves room for the constraint suffix
/// within PostgreSQL's 63-byte identifier limit.
const MAX_TABLE_NAME_LEN: usize = 50;

/// Check that `name` is a plain, unquoted SQL identifier.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');

    starts_ok
        && name.len() <= MAX_TABLE_NAME_LEN
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: String,
    name: String,
    subject: String,
    html_content: String,
    plain_text_content: String,
    tokens: Json<Vec<Token>>,
    created_at: DateTime<Utc>,
}

impl From<TemplateRow> for EmailTemplate {
    fn from(row: TemplateRow) -> Self {
        EmailTemplate {
            id: row.id,
            name: row.name,
            subject: row.subject,
            html_content: row.html_content,
            plain_text_content: row.plain_text_content,
            tokens: row.tokens.0,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-based template store.
///
/// Every query is bounded by `operation_timeout`; an expired timeout is
/// reported as `TemplateError::Timeout`.
pub struct PostgresTemplateStore {
    /// PostgreSQL connection pool
    pool: PgPool,

    /// Table holding the templates
    table: String,

    /// Upper bound for each store operation
    operation_timeout: Duration,
}

impl PostgresTemplateStore {
    /// Create a new PostgreSQL template store.
    pub fn new(
        pool: PgPool,
        table: impl Into<String>,
        operation_timeout: Duration,
    ) -> TemplateResult<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(TemplateError::Validation(format!(
                "Invalid table name: {}",
                table
            )));
        }

        Ok(Self {
            pool,
            table,
            operation_timeout,
        })
    }

    /// Name of the unique constraint on the `name` column.
    fn name_constraint(&self) -> String {
        format!("{}_name_unique", self.table)
    }

    /// Create the templates table if it does not exist yet.
    pub async fn ensure_schema(&self) -> TemplateResult<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                subject TEXT NOT NULL,
                html_content TEXT NOT NULL,
                plain_text_content TEXT NOT NULL,
                tokens JSONB NOT NULL DEFAULT '[]'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT {constraint} UNIQUE (name)
            )
            "#,
            table = self.table,
            constraint = self.name_constraint(),
        );

        self.bounded("ensure_schema", sqlx::query(&ddl).execute(&self.pool))
            .await?;

        tracing::info!(table = %self.table, "Email template table ready");
        Ok(())
    }

    /// Run a query under the operation timeout.
    async fn bounded<T, F>(&self, operation: &'static str, query: F) -> TemplateResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.operation_timeout, query).await {
            Ok(result) => result.map_err(TemplateError::Postgres),
            Err(_) => {
                tracing::warn!(
                    operation = operation,
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "PostgreSQL template operation timed out"
                );
                Err(TemplateError::timeout(operation, self.operation_timeout))
            }
        }
    }

    /// Translate insert failures, mapping duplicate keys onto domain errors.
    fn map_insert_error(&self, err: TemplateError, template: &EmailTemplate) -> TemplateError {
        if let TemplateError::Postgres(sqlx::Error::Database(db_err)) = &err {
            if db_err.is_unique_violation() {
                return if db_err.constraint() == Some(self.name_constraint().as_str()) {
                    TemplateError::NameConflict(template.name.clone())
                } else {
                    TemplateError::DuplicateId(template.id.clone())
                };
            }
        }
        err
    }

    fn select_columns(&self) -> String {
        format!(
            "SELECT id, name, subject, html_content, plain_text_content, tokens, created_at FROM {}",
            self.table
        )
    }

    async fn fetch_one_by(
        &self,
        operation: &'static str,
        column: &str,
        value: &str,
    ) -> TemplateResult<Option<EmailTemplate>> {
        let sql = format!("{} WHERE {} = $1 LIMIT 1", self.select_columns(), column);

        let row: Option<TemplateRow> = self
            .bounded(
                operation,
                sqlx::query_as::<_, TemplateRow>(&sql)
                    .bind(value)
                    .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(EmailTemplate::from))
    }

    async fn insert(&self, template: EmailTemplate) -> TemplateResult<EmailTemplate> {
        if self
            .fetch_one_by("create", "name", &template.name)
            .await?
            .is_some()
        {
            return Err(TemplateError::NameConflict(template.name));
        }

        let sql = format!(
            r#"
            INSERT INTO {} (id, name, subject, html_content, plain_text_content, tokens, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            self.table
        );

        self.bounded(
            "create",
            sqlx::query(&sql)
                .bind(&template.id)
                .bind(&template.name)
                .bind(&template.subject)
                .bind(&template.html_content)
                .bind(&template.plain_text_content)
                .bind(Json(&template.tokens))
                .bind(template.created_at)
                .execute(&self.pool),
        )
        .await
        .map_err(|e| self.map_insert_error(e, &template))?;

        tracing::debug!(
            template_id = %template.id,
            name = %template.name,
            table = %self.table,
            "Email template inserted into PostgreSQL"
        );

        Ok(template)
    }
}

#[async_trait]
impl EmailTemplateStore for PostgresTemplateStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, id: &str) -> TemplateResult<EmailTemplate> {
        let start = Instant::now();
        let result = self
            .fetch_one_by("get", "id", id)
            .await
            .and_then(|row| row.ok_or_else(|| TemplateError::NotFound(id.to_string())));

        StoreMetrics::observe(BACKEND, "get", start, &result);
        result
    }

    async fn get_by_name(&self, name: &str) -> TemplateResult<EmailTemplate> {
        let start = Instant::now();
        let result = self
            .fetch_one_by("get_by_name", "name", name)
            .await
            .and_then(|row| row.ok_or_else(|| TemplateError::NotFound(name.to_string())));

        StoreMetrics::observe(BACKEND, "get_by_name", start, &result);
        result
    }

    async fn list(&self, name: Option<&str>) -> TemplateResult<Vec<EmailTemplate>> {
        let start = Instant::now();

        let rows: TemplateResult<Vec<TemplateRow>> = match name_filter(name) {
            Some(name) => {
                let sql = format!(
                    "{} WHERE name = $1 ORDER BY created_at ASC, id ASC",
                    self.select_columns()
                );
                self.bounded(
                    "list",
                    sqlx::query_as::<_, TemplateRow>(&sql)
                        .bind(name)
                        .fetch_all(&self.pool),
                )
                .await
            }
            None => {
                let sql = format!("{} ORDER BY created_at ASC, id ASC", self.select_columns());
                self.bounded(
                    "list",
                    sqlx::query_as::<_, TemplateRow>(&sql).fetch_all(&self.pool),
                )
                .await
            }
        };

        let result = rows.map(|rows| rows.into_iter().map(EmailTemplate::from).collect());
        StoreMetrics::observe(BACKEND, "list", start, &result);
        result
    }

    async fn create(&self, template: EmailTemplate) -> TemplateResult<EmailTemplate> {
        let start = Instant::now();
        let result = self.insert(template).await;

        StoreMetrics::observe(BACKEND, "create", start, &result);
        result
    }

    async fn delete(&self, id: &str) -> TemplateResult<()> {
        let start = Instant::now();
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);

        let result = self
            .bounded("delete", sqlx::query(&sql).bind(id).execute(&self.pool))
            .await
            .and_then(|done| {
                if done.rows_affected() == 0 {
                    Err(TemplateError::NotFound(id.to_string()))
                } else {
                    Ok(())
                }
            });

        StoreMetrics::observe(BACKEND, "delete", start, &result);
        result
    }

    async fn count(&self) -> TemplateResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = self
            .bounded(
                "count",
                sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool),
            )
            .await?;

        Ok(count as usize)
    }
}
