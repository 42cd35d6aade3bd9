//! Template types and error definitions

use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum subject length, in characters (RFC 5322 recommended line length)
pub const MAX_SUBJECT_CHARS: usize = 78;

/// Content bodies must be strictly smaller than this many bytes
pub const MAX_CONTENT_BYTES: usize = 1_048_576;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("A template with the same name already exists: {0}")]
    NameConflict(String),

    #[error("Template id already in use: {0}")]
    DuplicateId(String),

    #[error("Substitution token mismatch, no value supplied for token: {0}")]
    SubstitutionTokenMismatch(String),

    #[error("Invalid template: {0}")]
    Validation(String),

    #[error("Store operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TemplateError {
    /// Build a timeout error for the given store operation.
    pub fn timeout(operation: &'static str, timeout: Duration) -> Self {
        TemplateError::Timeout {
            operation,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// True for failures of the persistence layer itself (timeouts, driver errors).
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            TemplateError::DuplicateId(_)
                | TemplateError::Timeout { .. }
                | TemplateError::Postgres(_)
                | TemplateError::Serialization(_)
        )
    }
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A substitutable marker inside template content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Literal text replaced in the template content
    pub value: String,

    /// Order in which substitutions are applied (ascending)
    pub sequence_number: u8,
}

impl Token {
    pub fn new(value: impl Into<String>, sequence_number: u8) -> Self {
        Self {
            value: value.into(),
            sequence_number,
        }
    }
}

/// An email template with subject, HTML and plain-text bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    /// Unique template identifier, assigned at creation
    pub id: String,

    /// Human-readable name, unique among live templates
    pub name: String,

    /// Email subject line
    pub subject: String,

    /// HTML body
    pub html_content: String,

    /// Plain-text body
    pub plain_text_content: String,

    /// Tokens substituted into every content field
    #[serde(default)]
    pub tokens: Vec<Token>,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Request to create a new email template
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmailTemplateRequest {
    pub name: String,

    pub subject: String,

    pub html_content: String,

    pub plain_text_content: String,

    /// Tokens (optional, null or missing means no tokens)
    #[serde(default)]
    pub tokens: Option<Vec<Token>>,
}

impl CreateEmailTemplateRequest {
    /// Validate field presence and size limits.
    pub fn validate(&self) -> TemplateResult<()> {
        if self.name.is_empty() {
            return Err(TemplateError::Validation("Name is required".to_string()));
        }

        if self.html_content.is_empty() {
            return Err(TemplateError::Validation(
                "Html content is required".to_string(),
            ));
        }

        if self.html_content.len() >= MAX_CONTENT_BYTES {
            return Err(TemplateError::Validation(
                "Html content must be under 1 megabyte".to_string(),
            ));
        }

        if self.plain_text_content.is_empty() {
            return Err(TemplateError::Validation(
                "Plain text content is required".to_string(),
            ));
        }

        if self.plain_text_content.len() >= MAX_CONTENT_BYTES {
            return Err(TemplateError::Validation(
                "Plain text content must be under 1 megabyte".to_string(),
            ));
        }

        if self.subject.is_empty() {
            return Err(TemplateError::Validation("Subject is required".to_string()));
        }

        if self.subject.chars().count() > MAX_SUBJECT_CHARS {
            return Err(TemplateError::Validation(format!(
                "Subject must be at most {} characters",
                MAX_SUBJECT_CHARS
            )));
        }

        if let Some(tokens) = &self.tokens {
            if tokens.iter().any(|t| t.value.is_empty()) {
                return Err(TemplateError::Validation(
                    "Token values must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Validate the request and turn it into a record with a fresh id.
    pub fn into_template(self) -> TemplateResult<EmailTemplate> {
        self.validate()?;

        Ok(EmailTemplate {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            subject: self.subject,
            html_content: self.html_content,
            plain_text_content: self.plain_text_content,
            tokens: self.tokens.unwrap_or_default(),
            // PostgreSQL stores microseconds
            created_at: Utc::now().trunc_subsecs(6),
        })
    }
}

/// Request body for rendering a stored template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderRequest {
    /// Token value -> replacement text
    #[serde(default)]
    pub substitutions: std::collections::HashMap<String, String>,
}

/// A fully substituted email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEmail {
    pub template_id: String,
    pub name: String,
    pub subject: String,
    pub html_content: String,
    pub plain_text_content: String,
}
