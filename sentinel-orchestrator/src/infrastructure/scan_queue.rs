//! Scan queue and dispatcher
//!
//! Scans for one repository are serialized; scans across repositories run
//! concurrently up to a semaphore-bounded worker budget. Each repository
//! holds at most one pending revision: submitting while another is queued
//! replaces it (the dropped scan is recorded as superseded), and
//! submitting while a scan is running raises that scan's supersede flag.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use sentinel_core::config::ScanConfig;
use sentinel_core::domain::{GraphDelta, ScanRecord, ScanStatus, SourceRevision};

use crate::application::use_cases::RunScanUseCase;
use crate::domain::{QueuedScan, ScanError};
use crate::infrastructure::scan_store::ScanRepository;

/// Shared dependencies for the scan workers
#[derive(Clone)]
pub struct ScanWorkerContext {
    pub run_scan: Arc<RunScanUseCase>,
    pub scans: Arc<dyn ScanRepository>,
}

struct RunningScan {
    supersede: Arc<AtomicBool>,
}

#[derive(Default)]
struct RepoSlot {
    running: Option<RunningScan>,
    pending: Option<QueuedScan>,
}

struct QueueInner {
    slots: Mutex<HashMap<String, RepoSlot>>,
    wake_tx: mpsc::UnboundedSender<String>,
    context: ScanWorkerContext,
    semaphore: Arc<Semaphore>,
}

/// Handle used by HTTP controllers to submit revisions for scanning
#[derive(Clone)]
pub struct ScanQueueHandle {
    inner: Arc<QueueInner>,
}

impl ScanQueueHandle {
    /// Queue a revision. Returns the scan id immediately; the scan runs in
    /// the background. A pending revision for the same repository is
    /// replaced and recorded as superseded; a running scan is flagged for
    /// supersession.
    pub async fn submit(&self, revision: SourceRevision) -> Result<Uuid, ScanError> {
        let repo_id = revision.repo_id.clone();
        let scan_id = Uuid::new_v4();

        let dropped = {
            let mut slots = self.inner.slots.lock().await;
            let slot = slots.entry(repo_id.clone()).or_default();

            if let Some(running) = &slot.running {
                debug!(repo_id = %repo_id, "Superseding in-flight scan");
                running.supersede.store(true, Ordering::SeqCst);
            }

            slot.pending.replace(QueuedScan {
                scan_id,
                revision,
            })
        };

        // The replaced pending scan never ran; record it for audit.
        if let Some(dropped) = dropped {
            info!(
                repo_id = %repo_id,
                scan_id = %dropped.scan_id,
                "Dropping queued revision in favor of a newer one"
            );
            self.inner
                .context
                .scans
                .append(superseded_record(&dropped))
                .await?;
        }

        self.inner
            .wake_tx
            .send(repo_id)
            .map_err(|e| ScanError::Storage(format!("scan dispatcher is gone: {}", e)))?;
        Ok(scan_id)
    }
}

fn superseded_record(dropped: &QueuedScan) -> ScanRecord {
    ScanRecord {
        scan_id: dropped.scan_id,
        repo_id: dropped.revision.repo_id.clone(),
        revision_sha: dropped.revision.revision_sha.clone(),
        status: ScanStatus::Superseded,
        findings: Vec::new(),
        indeterminate: Vec::new(),
        drift: GraphDelta::default(),
        score_delta: 0.0,
        error: None,
        created_at: Utc::now(),
    }
}

/// Spawn the dispatcher that drains the queue into scan workers.
///
/// Worker concurrency is bounded by `max_concurrent_scans`; repositories
/// are independent but each runs at most one scan at a time.
pub fn spawn_scan_dispatcher(
    context: ScanWorkerContext,
    config: &ScanConfig,
    shutdown: CancellationToken,
) -> ScanQueueHandle {
    let (wake_tx, mut wake_rx) = mpsc::unbounded_channel::<String>();
    let inner = Arc::new(QueueInner {
        slots: Mutex::new(HashMap::new()),
        wake_tx,
        context,
        semaphore: Arc::new(Semaphore::new(config.max_concurrent_scans.max(1))),
    });
    let handle = ScanQueueHandle {
        inner: inner.clone(),
    };

    tokio::spawn(async move {
        info!(
            concurrency = inner.semaphore.available_permits(),
            "Scan dispatcher started"
        );
        loop {
            let repo_id = tokio::select! {
                maybe = wake_rx.recv() => match maybe {
                    Some(repo_id) => repo_id,
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    info!("Scan dispatcher shutting down");
                    break;
                }
            };
            dispatch_repo(&inner, repo_id).await;
        }
    });

    handle
}

/// Start the pending scan for a repository if none is running
async fn dispatch_repo(inner: &Arc<QueueInner>, repo_id: String) {
    let (queued, supersede) = {
        let mut slots = inner.slots.lock().await;
        let Some(slot) = slots.get_mut(&repo_id) else {
            return;
        };
        if slot.running.is_some() {
            return;
        }
        let Some(queued) = slot.pending.take() else {
            return;
        };
        debug!(repo_id = %repo_id, scan_id = %queued.scan_id, "Claiming pending scan");
        let supersede = Arc::new(AtomicBool::new(false));
        slot.running = Some(RunningScan {
            supersede: supersede.clone(),
        });
        (queued, supersede)
    };

    let worker_inner = inner.clone();
    tokio::spawn(async move {
        let repo_id = queued.revision.repo_id.clone();

        // The wait for pool capacity happens here, not in the dispatcher
        // loop: a saturated pool must never stall dispatch for other
        // repositories. Newer submissions arriving during the wait raise
        // the supersede flag as usual.
        let permit = match worker_inner.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let result = worker_inner
            .context
            .run_scan
            .execute(queued.scan_id, queued.revision, supersede)
            .await;
        drop(permit);

        if let Err(e) = result {
            error!(repo_id = %repo_id, error = %e, "Scan worker failed to persist its record");
        }

        // Release the repo slot and re-wake if a newer revision queued up
        // while this scan ran.
        let has_pending = {
            let mut slots = worker_inner.slots.lock().await;
            match slots.get_mut(&repo_id) {
                Some(slot) => {
                    slot.running = None;
                    slot.pending.is_some()
                }
                None => false,
            }
        };
        if has_pending {
            let _ = worker_inner.wake_tx.send(repo_id);
        }
    });
}
