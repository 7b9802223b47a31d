//! Duplicate checks against the character catalog.
//!
//! Each pending file is claimed, probed, and resolved one at a time.
//! Responses land through the store's revision tickets, so a file edited
//! mid-check discards the answer instead of carrying a stale verdict. A
//! probe failure never blocks the operator: the file falls through to
//! `Accepted` and the failure is logged.

use artdrop_core::models::{FileStatus, SimilarityVerdict};
use artdrop_core::remote::SimilarityProbe;

use crate::store::{BatchStore, CheckOutcome};

/// Tally of one check sweep over the pending files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: usize,
    pub accepted: usize,
    pub warnings: usize,
    pub blocked: usize,
    /// Responses discarded because the file changed while the probe ran.
    pub stale: usize,
    /// Probe failures that fell through to `Accepted`.
    pub failed: usize,
}

fn verdict_status(verdict: SimilarityVerdict) -> FileStatus {
    match verdict {
        SimilarityVerdict::Clear => FileStatus::Accepted,
        SimilarityVerdict::Possible { matched } => FileStatus::Warning {
            reason: format!("Possibly a duplicate of {}", matched),
        },
        SimilarityVerdict::Confirmed { matched } => FileStatus::Blocked {
            reason: format!("Duplicate of {}", matched),
        },
    }
}

/// Run similarity checks for every file currently `Pending`.
///
/// Files added while the sweep is running are picked up by the next sweep,
/// not this one.
pub async fn run_checks(store: &BatchStore, probe: &dyn SimilarityProbe) -> CheckSummary {
    let ids = store.pending_ids().await;
    let mut summary = CheckSummary::default();

    for id in ids {
        let (ticket, request) = match store.begin_check(id).await {
            Some(claimed) => claimed,
            // Removed or no longer pending since the sweep started.
            None => continue,
        };
        summary.checked += 1;

        let status = match probe.check(&request).await {
            Ok(verdict) => verdict_status(verdict),
            Err(err) => {
                tracing::warn!(
                    file_id = %id,
                    error = %err,
                    "Similarity check failed; accepting file unchecked"
                );
                summary.failed += 1;
                FileStatus::Accepted
            }
        };

        match store.apply_check(ticket, status).await {
            CheckOutcome::Applied(FileStatus::Accepted) => summary.accepted += 1,
            CheckOutcome::Applied(FileStatus::Warning { .. }) => summary.warnings += 1,
            CheckOutcome::Applied(FileStatus::Blocked { .. }) => summary.blocked += 1,
            CheckOutcome::Applied(_) => {}
            CheckOutcome::Stale => summary.stale += 1,
            CheckOutcome::Gone => {}
        }
    }

    tracing::info!(
        checked = summary.checked,
        accepted = summary.accepted,
        warnings = summary.warnings,
        blocked = summary.blocked,
        stale = summary.stale,
        failed = summary.failed,
        "Duplicate check sweep finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;
    use uuid::Uuid;

    use artdrop_core::models::{MetadataPatch, SimilarityRequest};
    use artdrop_core::{PipelineNotifier, TransportError, UploaderConfig};

    use super::*;
    use crate::store::FileIntake;

    struct ScriptedProbe {
        responses: Mutex<VecDeque<Result<SimilarityVerdict, TransportError>>>,
    }

    impl ScriptedProbe {
        fn new(responses: Vec<Result<SimilarityVerdict, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl SimilarityProbe for ScriptedProbe {
        async fn check(
            &self,
            _request: &SimilarityRequest,
        ) -> Result<SimilarityVerdict, TransportError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SimilarityVerdict::Clear))
        }
    }

    /// Probe that edits the file while its check is in flight.
    struct EditingProbe {
        store: BatchStore,
        target: Uuid,
    }

    #[async_trait]
    impl SimilarityProbe for EditingProbe {
        async fn check(
            &self,
            _request: &SimilarityRequest,
        ) -> Result<SimilarityVerdict, TransportError> {
            self.store
                .update_metadata(self.target, MetadataPatch::Name("Edited mid-check".to_string()))
                .await
                .unwrap();
            Ok(SimilarityVerdict::Confirmed {
                matched: "Old Match".to_string(),
            })
        }
    }

    fn test_store() -> BatchStore {
        BatchStore::new(
            &UploaderConfig::default(),
            Arc::new(PipelineNotifier::default()),
        )
    }

    fn intake(filename: &str) -> FileIntake {
        FileIntake {
            filename: filename.to_string(),
            content_type: "image/png".to_string(),
            payload: Bytes::from_static(b"payload"),
        }
    }

    #[tokio::test]
    async fn test_sweep_maps_verdicts_to_statuses() {
        let store = test_store();
        let report = store
            .add_files(vec![intake("a.png"), intake("b.png"), intake("c.png")])
            .await;
        let probe = ScriptedProbe::new(vec![
            Ok(SimilarityVerdict::Clear),
            Ok(SimilarityVerdict::Possible {
                matched: "Asuka #77".to_string(),
            }),
            Ok(SimilarityVerdict::Confirmed {
                matched: "Rei #12".to_string(),
            }),
        ]);

        let summary = run_checks(&store, &probe).await;

        assert_eq!(summary.checked, 3);
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.stale, 0);
        assert_eq!(summary.failed, 0);

        assert_eq!(
            store.status_of(report.added[0]).await,
            Some(FileStatus::Accepted)
        );
        assert_eq!(
            store.status_of(report.added[1]).await,
            Some(FileStatus::Warning {
                reason: "Possibly a duplicate of Asuka #77".to_string()
            })
        );
        assert_eq!(
            store.status_of(report.added[2]).await,
            Some(FileStatus::Blocked {
                reason: "Duplicate of Rei #12".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_probe_failure_accepts_file() {
        let store = test_store();
        let report = store.add_files(vec![intake("a.png")]).await;
        let probe = ScriptedProbe::new(vec![Err(TransportError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })]);

        let summary = run_checks(&store, &probe).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.accepted, 1);
        assert_eq!(
            store.status_of(report.added[0]).await,
            Some(FileStatus::Accepted)
        );
    }

    #[tokio::test]
    async fn test_sweep_skips_already_resolved_files() {
        let store = test_store();
        let report = store
            .add_files(vec![intake("a.png"), intake("b.png")])
            .await;
        // Resolve the first file ahead of the sweep.
        let (ticket, _) = store.begin_check(report.added[0]).await.unwrap();
        store.apply_check(ticket, FileStatus::Accepted).await;

        let probe = ScriptedProbe::new(vec![Ok(SimilarityVerdict::Clear)]);
        let summary = run_checks(&store, &probe).await;

        assert_eq!(summary.checked, 1);
    }

    #[tokio::test]
    async fn test_edit_during_check_discards_verdict() {
        let store = test_store();
        let report = store.add_files(vec![intake("a.png")]).await;
        let id = report.added[0];
        let probe = EditingProbe {
            store: store.clone(),
            target: id,
        };

        let summary = run_checks(&store, &probe).await;

        assert_eq!(summary.stale, 1);
        assert_eq!(summary.blocked, 0);
        // Back to pending; the stale Confirmed verdict never landed.
        assert_eq!(store.status_of(id).await, Some(FileStatus::Pending));
    }
}
