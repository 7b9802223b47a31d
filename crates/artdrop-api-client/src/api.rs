//! Domain methods for the character service client.
//!
//! Request and response types live in `artdrop_core::models::wire` so the
//! pipeline's trait seams and test doubles speak exactly the same shapes.
//! This module also provides the production implementations of the
//! pipeline seams ([`UploadTransport`], [`SimilarityProbe`], [`NameSource`],
//! [`HealthProbe`]) for [`ApiClient`].

use std::time::{Duration, Instant};

use async_trait::async_trait;

use artdrop_core::models::{
    BatchItem, BatchUploadResponse, SearchResponse, SimilarityRequest, SimilarityVerdict,
};
use artdrop_core::remote::{HealthProbe, NameSource, SimilarityProbe, UploadTransport};
use artdrop_core::TransportError;

use crate::{api_prefix, ApiClient};

impl ApiClient {
    /// Upload one batch of files with their metadata manifest.
    ///
    /// The form carries a `manifest` part (JSON array of metadata, one entry
    /// per file, each tagged with the client-side `ref` id) followed by one
    /// `file` part per payload. The server echoes each `ref` back in its
    /// per-file outcomes.
    pub async fn upload_character_batch(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchUploadResponse, TransportError> {
        if items.is_empty() {
            return Err(TransportError::InvalidRequest(
                "empty upload batch".to_string(),
            ));
        }

        let manifest: Vec<_> = items.iter().map(|item| item.meta.clone()).collect();
        let manifest_json = serde_json::to_string(&manifest)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().text("manifest", manifest_json);
        for item in items {
            let part = reqwest::multipart::Part::bytes(item.payload.to_vec())
                .file_name(item.filename.clone())
                .mime_str(&item.content_type)
                .map_err(|e| {
                    TransportError::InvalidRequest(format!(
                        "Invalid content type '{}': {}",
                        item.content_type, e
                    ))
                })?;
            form = form.part("file", part);
        }

        self.post_multipart(&format!("{}/characters/batch", api_prefix()), form)
            .await
    }

    /// Ask the catalog whether a file resembles an existing character.
    pub async fn check_similarity(
        &self,
        request: &SimilarityRequest,
    ) -> Result<SimilarityVerdict, TransportError> {
        self.post_json(&format!("{}/characters/similarity", api_prefix()), request)
            .await
    }

    /// Search the character catalog by name or series.
    pub async fn search_characters(
        &self,
        query: &str,
        limit: Option<u32>,
    ) -> Result<SearchResponse, TransportError> {
        let path = format!(
            "{}/characters/search?q={}",
            api_prefix(),
            urlencoding::encode(query)
        );
        let mut extra: Vec<(&str, String)> = Vec::new();
        if let Some(l) = limit {
            extra.push(("limit", l.to_string()));
        }
        self.get(&path, &extra).await
    }

    /// Fetch one random character name from the configured third-party
    /// name service. The endpoint returns a JSON array of names; the first
    /// non-empty entry wins.
    pub async fn fetch_random_name(&self) -> Result<String, TransportError> {
        let url = self
            .name_service_url()
            .ok_or_else(|| {
                TransportError::InvalidRequest("no name service URL configured".to_string())
            })?
            .to_string();

        // Third-party service: no auth header, plain GET.
        let response = self
            .client()
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        let names: Vec<String> = self.read_success(response).await?;

        names
            .into_iter()
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
            .ok_or_else(|| TransportError::Decode("name service returned no names".to_string()))
    }

    /// Probe the service health endpoint and measure round-trip latency.
    pub async fn health(&self) -> Result<Duration, TransportError> {
        let url = self.build_url(&format!("{}/health", api_prefix()));
        let started = Instant::now();

        let request = self.apply_auth(self.client().get(&url));
        let response = request
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

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

        Ok(started.elapsed())
    }
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn upload_batch(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchUploadResponse, TransportError> {
        self.upload_character_batch(items).await
    }
}

#[async_trait]
impl SimilarityProbe for ApiClient {
    async fn check(
        &self,
        request: &SimilarityRequest,
    ) -> Result<SimilarityVerdict, TransportError> {
        self.check_similarity(request).await
    }
}

#[async_trait]
impl NameSource for ApiClient {
    async fn random_name(&self) -> Result<String, TransportError> {
        self.fetch_random_name().await
    }
}

#[async_trait]
impl HealthProbe for ApiClient {
    async fn ping(&self) -> Result<Duration, TransportError> {
        self.health().await
    }
}
