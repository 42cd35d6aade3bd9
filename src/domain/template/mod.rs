//! Email template system.
//!
//! This module provides:
//! - Email template definition with ordered substitution tokens
//! - A storage trait with in-memory and PostgreSQL implementations
//! - The token substitution engine used to render templates
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryTemplateStore::new();
//!
//! let template = CreateEmailTemplateRequest {
//!     name: "welcome".to_string(),
//!     subject: "Hi {{NAME}}".to_string(),
//!     html_content: "<p>Welcome, {{NAME}}</p>".to_string(),
//!     plain_text_content: "Welcome, {{NAME}}".to_string(),
//!     tokens: Some(vec![Token::new("{{NAME}}", 0)]),
//! }
//! .into_template()?;
//!
//! let created = store.create(template).await?;
//!
//! let substitutions = HashMap::from([("{{NAME}}".to_string(), "Alice".to_string())]);
//! let rendered = created.render(&substitutions)?;
//! assert_eq!(rendered.subject, "Hi Alice");
//! ```

mod factory;
mod memory_store;
mod postgres_store;
mod store;
mod substitution;
mod types;

pub use factory::create_template_store;
pub use memory_store::MemoryTemplateStore;
pub use postgres_store::{is_valid_table_name, PostgresTemplateStore};
pub use store::EmailTemplateStore;
pub use substitution::substitute;
pub use types::{
    CreateEmailTemplateRequest, EmailTemplate, RenderRequest, RenderedEmail, TemplateError,
    TemplateResult, Token, MAX_CONTENT_BYTES, MAX_SUBJECT_CHARS,
};
