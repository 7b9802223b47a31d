//! Upload session facade.
//!
//! One [`UploadSession`] owns the whole pipeline for one operator sitting:
//! the batch store, duplicate checks, the upload executor, the network
//! monitor, and name generation. Remotes are injected through
//! [`SessionRemotes`], so tests swap in scripted doubles without touching
//! any global state.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use artdrop_core::models::{MetadataPatch, UploadResult};
use artdrop_core::remote::{HealthProbe, NameSource, SimilarityProbe, UploadTransport};
use artdrop_core::{AppError, PipelineEvent, PipelineNotifier, UploaderConfig};

use crate::checks::{run_checks, CheckSummary};
use crate::executor::UploadExecutor;
use crate::names::NameGenerator;
use crate::network::{LinkState, NetworkMonitor};
use crate::store::{BatchStore, FileIntake, IntakeReport};

/// The remote capabilities a session needs, as separate seams.
#[derive(Clone)]
pub struct SessionRemotes {
    pub transport: Arc<dyn UploadTransport>,
    pub similarity: Arc<dyn SimilarityProbe>,
    pub names: Arc<dyn NameSource>,
    pub health: Arc<dyn HealthProbe>,
}

impl SessionRemotes {
    /// Use one client for every capability. This is the production shape,
    /// where a single API client implements all four traits.
    pub fn shared<T>(remote: Arc<T>) -> Self
    where
        T: UploadTransport + SimilarityProbe + NameSource + HealthProbe + 'static,
    {
        Self {
            transport: remote.clone(),
            similarity: remote.clone(),
            names: remote.clone(),
            health: remote,
        }
    }
}

pub struct UploadSession {
    config: UploaderConfig,
    store: BatchStore,
    notifier: Arc<PipelineNotifier>,
    executor: UploadExecutor,
    monitor: NetworkMonitor,
    names: NameGenerator,
    similarity: Arc<dyn SimilarityProbe>,
    /// Holds the cancel token of the run in flight; doubles as the
    /// one-run-at-a-time guard.
    running: Mutex<Option<CancellationToken>>,
}

impl UploadSession {
    pub fn new(config: UploaderConfig, remotes: SessionRemotes) -> Self {
        let notifier = Arc::new(PipelineNotifier::default());
        let store = BatchStore::new(&config, notifier.clone());
        let executor = UploadExecutor::new(
            store.clone(),
            remotes.transport,
            notifier.clone(),
            config.upload_batch_size,
        );
        let monitor = NetworkMonitor::new(remotes.health, &config);
        let names = NameGenerator::new(remotes.names);
        Self {
            config,
            store,
            notifier,
            executor,
            monitor,
            names,
            similarity: remotes.similarity,
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    /// Observe every pipeline event of this session.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.notifier.subscribe()
    }

    pub fn link_state(&self) -> LinkState {
        self.monitor.current()
    }

    pub async fn refresh_link(&self) -> LinkState {
        self.monitor.refresh().await
    }

    /// Admit files into the batch.
    pub async fn add_files(&self, intakes: Vec<FileIntake>) -> IntakeReport {
        self.store.add_files(intakes).await
    }

    /// Run duplicate checks over everything still pending.
    pub async fn check_pending(&self) -> CheckSummary {
        run_checks(&self.store, self.similarity.as_ref()).await
    }

    /// Give one file a random name, from the service or the local fallback.
    pub async fn assign_random_name(&self, id: Uuid) -> Result<String, AppError> {
        let name = self.names.next().await;
        self.store
            .update_metadata(id, MetadataPatch::Name(name.clone()))
            .await?;
        Ok(name)
    }

    /// Name every file in the batch, one at a time, writing each name as
    /// soon as it is drawn. Files removed while the run is underway are
    /// skipped; names already written stay written. Returns how many files
    /// were named.
    pub async fn generate_names_for_all(&self) -> usize {
        let ids = self.store.ordered_ids().await;
        let mut named = 0usize;
        for id in ids {
            // Re-check per file so a name is never drawn for a removed one.
            if self.store.file(id).await.is_none() {
                continue;
            }
            let name = self.names.next().await;
            if self
                .store
                .update_metadata(id, MetadataPatch::Name(name))
                .await
                .is_ok()
            {
                named += 1;
            }
        }
        tracing::debug!(named, "Generated names for batch");
        named
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Cancel the run in flight, if any. The executor stops at the next
    /// batch boundary.
    pub async fn cancel_run(&self) -> bool {
        match &*self.running.lock().await {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Submit the batch: gate on connectivity, surface validation problems,
    /// then hand off to the executor.
    pub async fn submit(&self) -> Result<UploadResult, AppError> {
        let token = {
            let mut running = self.running.lock().await;
            if running.is_some() {
                return Err(AppError::RunInProgress);
            }
            let token = CancellationToken::new();
            *running = Some(token.clone());
            token
        };

        let result = self.submit_inner(token).await;

        *self.running.lock().await = None;
        result
    }

    async fn submit_inner(&self, token: CancellationToken) -> Result<UploadResult, AppError> {
        let link = self.monitor.refresh().await;
        if link.is_offline() {
            tracing::warn!("Submission refused: service unreachable");
            self.notifier.publish(PipelineEvent::OfflineRejected);
            return Err(AppError::Offline);
        }
        if link.is_slow() {
            tracing::warn!(
                latency_ms = link.latency.map(|l| l.as_millis() as u64),
                "Connection is slow; uploads may take a while"
            );
            self.notifier.publish(PipelineEvent::SlowConnection);
        }

        // Force every field error visible before deciding.
        self.store.touch_all_fields().await;
        if let Some(blocker) = self.store.submit_blockers().await {
            tracing::info!(error_type = blocker.error_type(), "Submission blocked");
            return Err(blocker);
        }

        match self.executor.execute(token).await {
            Ok(result) => Ok(result),
            Err(AppError::Transport(err)) => {
                if err.is_offline() {
                    self.monitor.report_offline();
                }
                Err(AppError::Transport(err))
            }
            Err(other) => Err(other),
        }
    }

    /// Clear the session for a fresh batch. Refused while a run is active.
    pub async fn reset(&self) -> Result<(), AppError> {
        if self.is_running().await {
            return Err(AppError::RunInProgress);
        }
        self.store.reset().await;
        Ok(())
    }
}
