//! Shared test doubles for the pipeline integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use artdrop_core::models::{
    BatchItem, BatchUploadResponse, FileOutcome, OutcomeStatus, SimilarityRequest,
    SimilarityVerdict,
};
use artdrop_core::remote::{HealthProbe, NameSource, SimilarityProbe, UploadTransport};
use artdrop_core::{TransportError, UploaderConfig};
use artdrop_pipeline::FileIntake;

/// How the mock answers one `upload_batch` call.
pub enum UploadScript {
    /// Every file in the batch comes back `created`.
    AllCreated,
    /// Fail the whole request with this transport error.
    Fail(TransportError),
    /// Per-file outcomes by position within the batch.
    PerFile(Vec<(OutcomeStatus, Option<String>)>),
    /// Respond `created` but omit the last `n` results entirely.
    DropLast(usize),
}

pub enum HealthMode {
    Latency(Duration),
    Offline,
}

/// Scripted stand-in for the character service.
///
/// Unscripted calls take the happy path: uploads succeed, similarity comes
/// back clear, the health probe answers in 10ms.
pub struct MockRemote {
    pub upload_calls: Mutex<Vec<Vec<Uuid>>>,
    upload_script: Mutex<VecDeque<UploadScript>>,
    verdict_script: Mutex<VecDeque<Result<SimilarityVerdict, TransportError>>>,
    name_script: Mutex<VecDeque<Result<String, TransportError>>>,
    health: Mutex<HealthMode>,
    upload_delay: Mutex<Option<Duration>>,
    cancel_on_first_call: Mutex<Option<tokio_util::sync::CancellationToken>>,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self {
            upload_calls: Mutex::new(Vec::new()),
            upload_script: Mutex::new(VecDeque::new()),
            verdict_script: Mutex::new(VecDeque::new()),
            name_script: Mutex::new(VecDeque::new()),
            health: Mutex::new(HealthMode::Latency(Duration::from_millis(10))),
            upload_delay: Mutex::new(None),
            cancel_on_first_call: Mutex::new(None),
        }
    }
}

impl MockRemote {
    pub fn script_upload(&self, script: UploadScript) {
        self.upload_script.lock().unwrap().push_back(script);
    }

    pub fn script_verdict(&self, verdict: Result<SimilarityVerdict, TransportError>) {
        self.verdict_script.lock().unwrap().push_back(verdict);
    }

    pub fn script_name(&self, name: Result<String, TransportError>) {
        self.name_script.lock().unwrap().push_back(name);
    }

    pub fn set_health(&self, mode: HealthMode) {
        *self.health.lock().unwrap() = mode;
    }

    /// Stall each upload call, so tests can observe a run in flight.
    pub fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    /// Cancel this token as soon as the first upload call arrives.
    pub fn cancel_on_first_call(&self, token: tokio_util::sync::CancellationToken) {
        *self.cancel_on_first_call.lock().unwrap() = Some(token);
    }

    pub fn upload_call_count(&self) -> usize {
        self.upload_calls.lock().unwrap().len()
    }

    pub fn upload_call_sizes(&self) -> Vec<usize> {
        self.upload_calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.len())
            .collect()
    }

    fn respond(&self, items: &[BatchItem], script: UploadScript) -> Result<BatchUploadResponse, TransportError> {
        match script {
            UploadScript::Fail(err) => Err(err),
            UploadScript::AllCreated => Ok(all_created(items)),
            UploadScript::DropLast(n) => {
                let keep = items.len().saturating_sub(n);
                Ok(all_created(&items[..keep]))
            }
            UploadScript::PerFile(outcomes) => {
                let mut created = 0;
                let mut warnings = 0;
                let mut errors = 0;
                let results = items
                    .iter()
                    .zip(outcomes)
                    .map(|(item, (status, message))| {
                        match status {
                            OutcomeStatus::Created => created += 1,
                            OutcomeStatus::DuplicateWarning => warnings += 1,
                            OutcomeStatus::Error => errors += 1,
                        }
                        FileOutcome {
                            ref_id: item.meta.ref_id,
                            filename: item.filename.clone(),
                            status,
                            message,
                        }
                    })
                    .collect();
                Ok(BatchUploadResponse {
                    results,
                    created,
                    warnings,
                    errors,
                    message: None,
                })
            }
        }
    }
}

fn all_created(items: &[BatchItem]) -> BatchUploadResponse {
    BatchUploadResponse {
        results: items
            .iter()
            .map(|item| FileOutcome {
                ref_id: item.meta.ref_id,
                filename: item.filename.clone(),
                status: OutcomeStatus::Created,
                message: None,
            })
            .collect(),
        created: items.len() as u32,
        warnings: 0,
        errors: 0,
        message: None,
    }
}

#[async_trait]
impl UploadTransport for MockRemote {
    async fn upload_batch(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<BatchUploadResponse, TransportError> {
        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(token) = self.cancel_on_first_call.lock().unwrap().take() {
            token.cancel();
        }
        self.upload_calls
            .lock()
            .unwrap()
            .push(items.iter().map(|item| item.meta.ref_id).collect());

        let script = self
            .upload_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(UploadScript::AllCreated);
        self.respond(&items, script)
    }
}

#[async_trait]
impl SimilarityProbe for MockRemote {
    async fn check(
        &self,
        _request: &SimilarityRequest,
    ) -> Result<SimilarityVerdict, TransportError> {
        self.verdict_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SimilarityVerdict::Clear))
    }
}

#[async_trait]
impl NameSource for MockRemote {
    async fn random_name(&self) -> Result<String, TransportError> {
        self.name_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok("Nadeshiko".to_string()))
    }
}

#[async_trait]
impl HealthProbe for MockRemote {
    async fn ping(&self) -> Result<Duration, TransportError> {
        match &*self.health.lock().unwrap() {
            HealthMode::Latency(latency) => Ok(*latency),
            HealthMode::Offline => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}

pub fn png_file(filename: &str) -> FileIntake {
    FileIntake {
        filename: filename.to_string(),
        content_type: "image/png".to_string(),
        payload: Bytes::from_static(b"fake png payload"),
    }
}

/// Small batches and short windows keep the tests quick.
pub fn test_config() -> UploaderConfig {
    UploaderConfig {
        upload_batch_size: 2,
        undo_window_ms: 50,
        ..Default::default()
    }
}
