mod helpers;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use artdrop_core::models::FileStatus;
use artdrop_core::{AppError, PipelineEvent, PipelineNotifier, TransportError};
use artdrop_pipeline::{BatchStore, UploadExecutor};

use helpers::{png_file, test_config, MockRemote, UploadScript};

async fn setup(
    file_count: usize,
) -> (
    BatchStore,
    UploadExecutor,
    Arc<MockRemote>,
    Arc<PipelineNotifier>,
    Vec<Uuid>,
) {
    let config = test_config();
    let notifier = Arc::new(PipelineNotifier::default());
    let remote = Arc::new(MockRemote::default());
    let store = BatchStore::new(&config, notifier.clone());
    let executor = UploadExecutor::new(
        store.clone(),
        remote.clone(),
        notifier.clone(),
        config.upload_batch_size,
    );

    let intakes = (0..file_count)
        .map(|i| png_file(&format!("file_{}.png", i)))
        .collect();
    let report = store.add_files(intakes).await;
    (store, executor, remote, notifier, report.added)
}

async fn drain_kinds(rx: &mut tokio::sync::broadcast::Receiver<PipelineEvent>) -> Vec<&'static str> {
    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.kind());
    }
    kinds
}

#[tokio::test]
async fn test_uploads_in_fixed_size_batches() {
    let (store, executor, remote, notifier, ids) = setup(5).await;
    let mut rx = notifier.subscribe();

    let result = executor.execute(CancellationToken::new()).await.unwrap();

    // Batch size 2 over 5 files: 2, 2, 1.
    assert_eq!(remote.upload_call_sizes(), vec![2, 2, 1]);
    assert_eq!(result.total_created, 5);
    assert_eq!(result.total_errors, 0);
    assert!(result.is_clean());
    assert_eq!(result.message, "5 uploaded, 0 duplicate warning(s), 0 failed");

    for id in &ids {
        assert_eq!(store.status_of(*id).await, Some(FileStatus::Accepted));
        assert!(store.is_uploaded(*id).await);
    }
    assert_eq!(store.last_result().await, Some(result));

    // Progress once per settled batch, in order, then exactly one completion.
    let mut progress = Vec::new();
    let mut completions = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            PipelineEvent::BatchProgress { completed, total } => progress.push((completed, total)),
            PipelineEvent::RunCompleted { .. } => completions += 1,
            _ => {}
        }
    }
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(completions, 1);
}

#[tokio::test]
async fn test_empty_batch_is_refused() {
    let (_, executor, remote, _, _) = setup(0).await;

    let err = executor.execute(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyBatch));
    assert_eq!(remote.upload_call_count(), 0);
}

#[tokio::test]
async fn test_api_rejection_fails_batch_and_continues() {
    let (store, executor, remote, _, ids) = setup(4).await;
    remote.script_upload(UploadScript::Fail(TransportError::Api {
        status: 422,
        message: "manifest malformed".to_string(),
    }));

    let result = executor.execute(CancellationToken::new()).await.unwrap();

    // Both batches were attempted; the run did not stop at the rejection.
    assert_eq!(remote.upload_call_count(), 2);
    assert_eq!(result.total_errors, 2);
    assert_eq!(result.total_created, 2);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].message.contains("422"));
    assert!(!result.errors[0].duplicate);

    for id in &ids[..2] {
        assert!(matches!(
            store.status_of(*id).await,
            Some(FileStatus::Error { .. })
        ));
        assert!(!store.is_uploaded(*id).await);
    }
    for id in &ids[2..] {
        assert_eq!(store.status_of(*id).await, Some(FileStatus::Accepted));
    }
}

#[tokio::test]
async fn test_offline_mid_run_aborts_and_restores() {
    let (store, executor, remote, notifier, ids) = setup(4).await;
    let mut rx = notifier.subscribe();
    remote.script_upload(UploadScript::AllCreated);
    remote.script_upload(UploadScript::Fail(TransportError::Connect(
        "connection reset".to_string(),
    )));

    let err = executor.execute(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, AppError::Transport(e) if e.is_offline()));

    // First batch settled and stays settled.
    for id in &ids[..2] {
        assert_eq!(store.status_of(*id).await, Some(FileStatus::Accepted));
        assert!(store.is_uploaded(*id).await);
    }
    // Second batch never settled; its files fall back to their pre-run state.
    for id in &ids[2..] {
        assert_eq!(store.status_of(*id).await, Some(FileStatus::Pending));
        assert!(!store.is_uploaded(*id).await);
    }

    let kinds = drain_kinds(&mut rx).await;
    assert!(kinds.contains(&"run_aborted"));
    assert!(!kinds.contains(&"run_completed"));

    // A later run picks up exactly the unsettled files.
    let eligible = store.eligible_files().await;
    let eligible_ids: Vec<Uuid> = eligible.iter().map(|f| f.id).collect();
    assert_eq!(eligible_ids, ids[2..].to_vec());
}

#[tokio::test]
async fn test_missing_result_ref_becomes_error() {
    let (store, executor, remote, _, ids) = setup(2).await;
    remote.script_upload(UploadScript::DropLast(1));

    let result = executor.execute(CancellationToken::new()).await.unwrap();

    assert_eq!(result.total_created, 1);
    assert_eq!(result.total_errors, 1);
    assert_eq!(result.errors[0].message, "No result returned for file");
    assert_eq!(
        store.status_of(ids[1]).await,
        Some(FileStatus::Error {
            message: "No result returned for file".to_string()
        })
    );
}

#[tokio::test]
async fn test_duplicate_warning_outcome() {
    use artdrop_core::models::OutcomeStatus;

    let (store, executor, remote, _, ids) = setup(2).await;
    remote.script_upload(UploadScript::PerFile(vec![
        (OutcomeStatus::Created, None),
        (
            OutcomeStatus::DuplicateWarning,
            Some("Very similar to Rem #1042".to_string()),
        ),
    ]));

    let result = executor.execute(CancellationToken::new()).await.unwrap();

    assert_eq!(result.total_created, 1);
    assert_eq!(result.total_warnings, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].duplicate);
    assert!(!result.is_clean());

    assert_eq!(
        store.status_of(ids[1]).await,
        Some(FileStatus::Warning {
            reason: "Very similar to Rem #1042".to_string()
        })
    );
    // Created server-side despite the warning; excluded from future runs.
    assert!(store.is_uploaded(ids[1]).await);
}

#[tokio::test]
async fn test_pre_cancelled_token_uploads_nothing() {
    let (_, executor, remote, notifier, _) = setup(3).await;
    let mut rx = notifier.subscribe();

    let token = CancellationToken::new();
    token.cancel();
    let err = executor.execute(token).await.unwrap_err();

    assert!(matches!(err, AppError::Cancelled));
    assert_eq!(remote.upload_call_count(), 0);
    assert!(drain_kinds(&mut rx).await.contains(&"run_aborted"));
}

#[tokio::test]
async fn test_cancel_takes_effect_at_batch_boundary() {
    let (store, executor, remote, _, ids) = setup(4).await;
    let token = CancellationToken::new();
    remote.cancel_on_first_call(token.clone());

    let err = executor.execute(token).await.unwrap_err();
    assert!(matches!(err, AppError::Cancelled));

    // The in-flight batch settled; the next one never started.
    assert_eq!(remote.upload_call_count(), 1);
    for id in &ids[..2] {
        assert!(store.is_uploaded(*id).await);
    }
    for id in &ids[2..] {
        assert!(!store.is_uploaded(*id).await);
        assert_eq!(store.status_of(*id).await, Some(FileStatus::Pending));
    }
}
