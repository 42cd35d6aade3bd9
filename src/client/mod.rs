//! HTTP client for fetching templates from a running template service.
//!
//! ```ignore
//! let client = HttpTemplateServiceClient::new("http://templates:8080")
//!     .with_api_key("secret");
//! let template = client.get_email_template_by_id("3f0c...").await?;
//! ```

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::template::EmailTemplate;

/// Path segments of the template routes.
const API_SEGMENTS: [&str; 3] = ["api", "template-service", "email-templates"];

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Could not retrieve template, service returned {0}")]
    CouldNotRetrieveTemplate(StatusCode),

    #[error("Could not read template response: {0}")]
    CouldNotReadTemplate(String),

    #[error("Invalid template service URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Read access to templates held by a template service.
#[async_trait]
pub trait TemplateServiceClient: Send + Sync {
    async fn get_email_template_by_id(&self, id: &str) -> Result<EmailTemplate, ClientError>;
}

/// `TemplateServiceClient` over HTTP.
#[derive(Clone)]
pub struct HttpTemplateServiceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTemplateServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies, TLS).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Send `X-API-Key` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The id is percent-encoded as a single path segment.
    fn email_template_url(&self, id: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(API_SEGMENTS)
            .push(id);

        Ok(url)
    }
}

#[async_trait]
impl TemplateServiceClient for HttpTemplateServiceClient {
    async fn get_email_template_by_id(&self, id: &str) -> Result<EmailTemplate, ClientError> {
        let mut request = self.http.get(self.email_template_url(id)?);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(ClientError::TemplateNotFound(id.to_string())),
            status => {
                tracing::warn!(template_id = %id, status = %status, "Template service returned an error");
                return Err(ClientError::CouldNotRetrieveTemplate(status));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::CouldNotReadTemplate(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(template_id = %id, error = %e, "Could not decode template response");
            ClientError::CouldNotReadTemplate(e.to_string())
        })
    }
}
