//! Outbound requests for async bindings.
//!
//! The engine only ever talks to a [`Fetcher`]. Which implementation is used
//! is decided once, at construction, from [`HttpConfig::backend`] through
//! [`fetcher_for`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use formrender_config::{FetchBackend, HttpConfig};
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::{FieldsError, Result};
use crate::template::stringify;
use crate::types::HttpMethod;

/// A fully resolved request: tokens substituted, params evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Map<String, Value>,
}

impl FetchRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Map::new(),
        }
    }
}

/// Issues binding requests and returns the decoded JSON body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<Value>;
}

/// Pick the fetcher for the configured backend.
pub fn fetcher_for(config: &HttpConfig) -> Result<Arc<dyn Fetcher>> {
    match config.backend {
        FetchBackend::Http => Ok(Arc::new(HttpFetcher::with_config(config)?)),
        FetchBackend::Disabled => Ok(Arc::new(DisabledFetcher)),
    }
}

/// reqwest-backed fetcher. GET sends params as the query string, every
/// other method as a JSON body.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Option<String>,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpFetcher {
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(&config.user_agent)
            .build()
            .map_err(FieldsError::Client)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn resolve_url(&self, url: &str) -> Result<Url> {
        let full = match &self.base_url {
            Some(base) if url.starts_with('/') => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url.to_string(),
        };
        Url::parse(&full).map_err(|source| FieldsError::InvalidUrl { url: full, source })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<Value> {
        let mut url = self.resolve_url(&request.url)?;
        debug!(method = request.method.as_str(), %url, "issuing binding request");

        let builder = match request.method {
            HttpMethod::Get => {
                if !request.params.is_empty() {
                    let mut pairs = url.query_pairs_mut();
                    for (name, value) in &request.params {
                        if !value.is_null() {
                            pairs.append_pair(name, &stringify(value));
                        }
                    }
                }
                self.client.get(url.clone())
            }
            HttpMethod::Post => self.client.post(url.clone()).json(&request.params),
            HttpMethod::Put => self.client.put(url.clone()).json(&request.params),
            HttpMethod::Delete => self.client.delete(url.clone()).json(&request.params),
        };

        let response = builder.send().await.map_err(|source| FieldsError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FieldsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| FieldsError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

/// Rejects every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFetcher;

#[async_trait]
impl Fetcher for DisabledFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<Value> {
        Err(FieldsError::FetchDisabled { url: request.url })
    }
}
