//! Shared HTTP client for the artdrop character service.
//!
//! Provides a minimal client with configurable auth (Bearer token or
//! X-API-Key), generic GET/POST helpers, and domain methods (batch upload,
//! similarity check, search, random names, health). Request failures come
//! back as [`TransportError`] so callers can tell "service unreachable"
//! apart from "service said no"; the upload executor aborts on the former
//! and continues on the latter.

pub mod api;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

use artdrop_core::{TransportError, UploaderConfig};

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
    /// No auth header (local development servers).
    None,
}

/// API version prefix (e.g. "/api/v1"). Set ARTDROP_API_VERSION to match the server.
pub fn api_prefix() -> String {
    let version = std::env::var("ARTDROP_API_VERSION").unwrap_or_else(|_| "v1".to_string());
    format!("/api/{}", version)
}

/// HTTP client for the character service with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
    timeout_secs: u64,
    name_service_url: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            timeout_secs: timeout.as_secs(),
            name_service_url: None,
        })
    }

    /// Build a client from an [`UploaderConfig`]: X-API-Key auth when a key
    /// is configured, unauthenticated otherwise.
    pub fn from_config(config: &UploaderConfig) -> Result<Self> {
        let auth = match &config.api_key {
            Some(key) => Auth::XApiKey(key.clone()),
            None => Auth::None,
        };
        let mut client = Self::new(config.api_url.clone(), auth, config.request_timeout())?;
        client.name_service_url = config.name_service_url.clone();
        Ok(client)
    }

    /// Create client from environment: ARTDROP_API_URL, ARTDROP_API_KEY.
    pub fn from_env() -> Result<Self> {
        let config = UploaderConfig::from_env()?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn name_service_url(&self) -> Option<&str> {
        self.name_service_url.as_deref()
    }

    pub fn with_name_service_url(mut self, url: Option<String>) -> Self {
        self.name_service_url = url;
        self
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
            Auth::None => request,
        }
    }

    /// Classify a reqwest send failure into a transport error.
    fn classify_send_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            // Request errors without a response (DNS, TLS, aborted sockets)
            // all mean the service was not reached.
            TransportError::Connect(err.to_string())
        }
    }

    async fn read_success<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);
        request = self.apply_auth(request);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        self.read_success(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let request = self.client.post(&url).json(body);
        let request = self.apply_auth(request);

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        self.read_success(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let request = self.client.post(&url).multipart(form);
        let request = self.apply_auth(request);

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        self.read_success(response).await
    }

    /// Raw client for custom requests. Caller must apply auth via build_url and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

// Re-export domain wire types for convenience.
pub use artdrop_core::models::{
    BatchItem, BatchUploadResponse, CharacterHit, CharacterMeta, FileOutcome, OutcomeStatus,
    SearchResponse, SimilarityRequest, SimilarityVerdict,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = ApiClient::new(
            "http://localhost:4000/".to_string(),
            Auth::None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000");
        assert_eq!(
            client.build_url("/api/v1/characters/batch"),
            "http://localhost:4000/api/v1/characters/batch"
        );
    }

    #[test]
    fn test_from_config_carries_name_service_url() {
        let config = UploaderConfig {
            name_service_url: Some("http://names.test/api".to_string()),
            ..Default::default()
        };
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.name_service_url(), Some("http://names.test/api"));
    }
}
