//! Trait seams for the remote character service.
//!
//! The pipeline crates depend only on these traits. `artdrop-api-client`
//! provides the production implementations over HTTP; tests install
//! scripted doubles. Everything is `Send + Sync` so a single `Arc` client
//! can back all four seams at once.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{BatchItem, BatchUploadResponse, SimilarityRequest, SimilarityVerdict};

/// Sends one batch of files to the service's batch upload endpoint.
///
/// A returned `Err` with [`TransportError::is_offline`] true means the
/// service was unreachable and the whole run should abort; any other error
/// is an API rejection of just this batch.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload_batch(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchUploadResponse, TransportError>;
}

/// Asks the service whether a file resembles an existing character.
#[async_trait]
pub trait SimilarityProbe: Send + Sync {
    async fn check(&self, request: &SimilarityRequest)
        -> Result<SimilarityVerdict, TransportError>;
}

/// Supplies random character names for the "generate names" action.
#[async_trait]
pub trait NameSource: Send + Sync {
    async fn random_name(&self) -> Result<String, TransportError>;
}

/// Measures service reachability and round-trip latency.
///
/// Used by the network monitor; the returned duration classifies the link
/// as fast or slow.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<Duration, TransportError>;
}
