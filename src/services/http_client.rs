//! HTTP plumbing shared by the vendor backends
//!
//! Every backend owns one [`VendorHttpClient`] built from its instance
//! entry. The client applies the instance credentials and timeout, appends
//! path segments to the base URL and maps non-2xx responses to
//! [`BackendError::Status`]. Each segment is percent-encoded on its own,
//! so a `/`, `?` or `..` inside a job name or issue key never changes
//! which resource is addressed. Connection pooling comes from the underlying
//! `reqwest::Client`.

use crate::config::{Credentials, InstanceConfig};
use crate::plugins::BackendError;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::Value;
use std::time::Duration;

/// Longest error body echoed back to callers
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct VendorHttpClient {
    client: reqwest::Client,
    base_url: String,
    base: Url,
    credentials: Credentials,
}

/// Status and headers of a response whose body is not needed
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: HeaderMap,
}

impl VendorHttpClient {
    pub fn new(instance: &InstanceConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(instance.timeout_secs))
            .user_agent(concat!("toolgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Client(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = instance.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| BackendError::Client(format!("Invalid base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            base,
            credentials: instance.credentials(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for path segments below the base URL
    pub fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Client(format!("Base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone());
        match &self.credentials {
            Credentials::Basic { username, token } => builder.basic_auth(username, Some(token)),
            Credentials::Bearer { token } => builder.bearer_auth(token),
        }
    }

    async fn send(&self, url: &Url, builder: RequestBuilder) -> Result<Response, BackendError> {
        tracing::debug!(url = %url, "Calling backend");

        let response = builder.send().await.map_err(|e| BackendError::Request {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        })
    }

    /// GET returning a JSON document
    pub async fn get_json(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Value, BackendError> {
        let url = self.url(segments)?;
        let builder = self
            .request(Method::GET, &url)
            .header(ACCEPT, "application/json")
            .query(query);

        let response = self.send(&url, builder).await?;
        response.json::<Value>().await.map_err(|e| BackendError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// GET returning plain text
    pub async fn get_text(&self, segments: &[&str], query: &[(&str, String)]) -> Result<String, BackendError> {
        let url = self.url(segments)?;
        let builder = self.request(Method::GET, &url).query(query);

        let response = self.send(&url, builder).await?;
        response.text().await.map_err(|e| BackendError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// POST with query parameters and no body
    pub async fn post(&self, segments: &[&str], query: &[(&str, String)]) -> Result<ResponseMeta, BackendError> {
        let url = self.url(segments)?;
        let builder = self.request(Method::POST, &url).query(query);

        let response = self.send(&url, builder).await?;
        Ok(ResponseMeta {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        })
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }

    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
