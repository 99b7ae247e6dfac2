//! HTTP client for the hosted generation service.
//!
//! The service takes a [`GenerationRequest`] as JSON and answers with either
//! `{"images": [...]}` or `{"image": "..."}`, each entry a data URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{GenerationError, GenerationResult};
use crate::request::GenerationRequest;

/// Anything that can turn a request into generated images.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Run one generation and return the resulting images as data URLs.
    async fn generate(&self, request: GenerationRequest) -> GenerationResult<Vec<String>>;
}

/// Configuration for [`HttpImageGenerator`].
#[derive(Debug, Clone)]
pub struct HttpGeneratorConfig {
    /// Full URL of the generation endpoint.
    pub endpoint: String,
    /// Bearer token, if the service needs one.
    pub token: Option<String>,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Overall request timeout.
    pub timeout: Duration,
}

impl HttpGeneratorConfig {
    /// Configuration for an endpoint with default settings.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            user_agent: format!("layer-composer/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(120),
        }
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(alias = "message")]
    error: String,
}

/// Generator backed by an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpImageGenerator {
    http: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpImageGenerator {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidUrl`] if the URL is malformed and
    /// [`GenerationError::Http`] if the HTTP client fails to build.
    pub fn new(config: HttpGeneratorConfig) -> GenerationResult<Self> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|e| GenerationError::InvalidUrl(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(GenerationError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                endpoint.scheme()
            )));
        }

        let http = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            endpoint,
            token: config.token,
        })
    }

    /// Endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, request: GenerationRequest) -> GenerationResult<Vec<String>> {
        tracing::info!(
            "Submitting generation with {} images to {}",
            request.images.len(),
            self.endpoint
        );

        let mut builder = self.http.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ServiceErrorBody>(&body)
                .map_or(body, |parsed| parsed.error);
            tracing::warn!("Generation failed with {status}: {message}");
            return Err(GenerationError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerationResponse = serde_json::from_str(&body)?;
        let mut images = parsed.images;
        images.extend(parsed.image);
        images.retain(|image| !image.is_empty());
        if images.is_empty() {
            return Err(GenerationError::EmptyResult);
        }
        tracing::info!("Generation returned {} images", images.len());
        Ok(images)
    }
}
