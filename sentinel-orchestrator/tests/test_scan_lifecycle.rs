//! End-to-end scan lifecycle tests with scripted backends

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use sentinel_core::config::{
    ConsensusConfig, ExtractionConfig, InferenceConfig, ScanConfig, ScoringConfig,
};
use sentinel_core::domain::{ScanStatus, SourceFile, SourceRevision, VulnerabilityType};
use sentinel_extract::ExtractEndpointsUseCase;
use sentinel_graph::InMemoryGraphStore;
use sentinel_llm::{ConsensusEngine, JudgmentPayload, ResilientAdapter, ScriptedAdapter};
use sentinel_orchestrator::{
    InMemoryScanRepository, InMemoryScoreLedger, RunScanUseCase, ScanRepository, ScanWorkerContext,
    ScoringEngine, spawn_scan_dispatcher,
};

const UNGUARDED_ORDERS: &str = r#"
@router.get("/orders/{order_id}")
async def get_order(order_id: int):
    return db.get_order(order_id)
"#;

const GUARDED_ORDERS: &str = r#"
@router.get("/orders/{order_id}")
async def get_order(order_id: int, user=Depends(verify_token)):
    return db.get_order_for(order_id, user)
"#;

fn revision(repo_id: &str, sha: &str, content: &str) -> SourceRevision {
    SourceRevision {
        repo_id: repo_id.into(),
        revision_sha: sha.into(),
        files: vec![SourceFile {
            path: "app/orders.py".into(),
            content: content.into(),
        }],
    }
}

fn resilient(adapter: ScriptedAdapter) -> Arc<ResilientAdapter> {
    let config = InferenceConfig {
        backends: Vec::new(),
        request_timeout_seconds: 2,
        max_retries: 1,
        initial_backoff_ms: 1,
    };
    Arc::new(ResilientAdapter::new(Arc::new(adapter), &config))
}

struct Stack {
    run_scan: Arc<RunScanUseCase>,
    scans: Arc<InMemoryScanRepository>,
    scoring: Arc<ScoringEngine>,
}

fn stack(adapters: Vec<Arc<ResilientAdapter>>) -> Stack {
    let scans = Arc::new(InMemoryScanRepository::new());
    let ledger = Arc::new(InMemoryScoreLedger::new());
    let scoring = Arc::new(ScoringEngine::new(ScoringConfig::default(), ledger));
    let graph = Arc::new(InMemoryGraphStore::new(ExtractionConfig::default()));
    let consensus = Arc::new(ConsensusEngine::new(adapters, ConsensusConfig::default()));

    let run_scan = Arc::new(RunScanUseCase::new(
        ExtractEndpointsUseCase::new(ExtractionConfig::default()),
        graph,
        consensus,
        scoring.clone(),
        scans.clone(),
        ScanConfig::default(),
    ));

    Stack {
        run_scan,
        scans,
        scoring,
    }
}

fn not_superseded() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[tokio::test]
async fn consensus_bola_blocks_the_scan_and_dents_the_score() {
    let stack = stack(vec![
        resilient(ScriptedAdapter::new("qwen").with_judgment(
            "GET",
            "/orders/{order_id}",
            JudgmentPayload::finding(VulnerabilityType::Bola, 90, "no ownership check"),
        )),
        resilient(ScriptedAdapter::new("llama").with_judgment(
            "GET",
            "/orders/{order_id}",
            JudgmentPayload::finding(VulnerabilityType::Bola, 85, "object id from client"),
        )),
    ]);

    let record = stack
        .run_scan
        .execute(
            Uuid::new_v4(),
            revision("acme/shop", "rev1", UNGUARDED_ORDERS),
            not_superseded(),
        )
        .await
        .unwrap();

    assert_eq!(record.status, ScanStatus::Blocked);
    assert_eq!(record.findings.len(), 1);
    assert_eq!(record.findings[0].confidence, 87.5);
    assert_eq!(record.score_delta, -20.0);
    assert_eq!(stack.scoring.current_score("acme/shop").await, 80.0);
}

#[tokio::test]
async fn guard_removal_drifts_and_readding_recovers() {
    // clean backends throughout; only the guard set changes
    let stack = stack(vec![
        resilient(ScriptedAdapter::new("qwen")),
        resilient(ScriptedAdapter::new("llama")),
    ]);

    for (sha, content) in [
        ("rev1", GUARDED_ORDERS),
        ("rev2", UNGUARDED_ORDERS),
        ("rev3", GUARDED_ORDERS),
    ] {
        stack
            .run_scan
            .execute(
                Uuid::new_v4(),
                revision("acme/shop", sha, content),
                not_superseded(),
            )
            .await
            .unwrap();
    }

    let records = stack.scans.list("acme/shop").await.unwrap();
    // newest first: rev3 recovered, rev2 drifted, rev1 baseline
    assert_eq!(records[0].score_delta, 4.0);
    assert_eq!(records[1].score_delta, -4.0);
    assert_eq!(records[1].drift.drift_count(), 1);
    assert_eq!(records[2].score_delta, 0.0);
    assert_eq!(stack.scoring.current_score("acme/shop").await, 100.0);
}

#[tokio::test]
async fn all_abstaining_backends_yield_indeterminate_with_zero_delta() {
    let stack = stack(vec![
        resilient(ScriptedAdapter::new("qwen").timing_out()),
        resilient(ScriptedAdapter::new("llama").timing_out()),
    ]);

    let record = stack
        .run_scan
        .execute(
            Uuid::new_v4(),
            revision("acme/shop", "rev1", UNGUARDED_ORDERS),
            not_superseded(),
        )
        .await
        .unwrap();

    assert_eq!(record.status, ScanStatus::Passed);
    assert!(record.findings.is_empty());
    assert_eq!(record.indeterminate.len(), 1);
    assert_eq!(record.score_delta, 0.0);
    assert_eq!(stack.scoring.current_score("acme/shop").await, 100.0);
}

#[tokio::test]
async fn indeterminate_retry_rescues_a_briefly_flaky_backend() {
    // first consensus round times out everywhere, the retry round answers
    let stack = stack(vec![resilient(
        ScriptedAdapter::new("qwen").timing_out_first(2),
    )]);

    let record = stack
        .run_scan
        .execute(
            Uuid::new_v4(),
            revision("acme/shop", "rev1", UNGUARDED_ORDERS),
            not_superseded(),
        )
        .await
        .unwrap();

    assert!(record.indeterminate.is_empty());
    assert_eq!(record.status, ScanStatus::Passed);
}

#[tokio::test]
async fn single_model_findings_never_block() {
    let stack = stack(vec![resilient(ScriptedAdapter::new("qwen").with_judgment(
        "GET",
        "/orders/{order_id}",
        JudgmentPayload::finding(VulnerabilityType::Bola, 95, "no ownership check"),
    ))]);

    let record = stack
        .run_scan
        .execute(
            Uuid::new_v4(),
            revision("acme/shop", "rev1", UNGUARDED_ORDERS),
            not_superseded(),
        )
        .await
        .unwrap();

    assert_eq!(record.status, ScanStatus::Passed);
    assert_eq!(record.findings.len(), 1);
    assert_eq!(record.findings[0].confidence, 69.0);
    // a capped single-model finding carries no penalty
    assert_eq!(record.score_delta, 0.0);
}

#[tokio::test]
async fn extraction_failure_errors_without_touching_the_score() {
    let stack = stack(vec![resilient(ScriptedAdapter::new("qwen"))]);

    let record = stack
        .run_scan
        .execute(
            Uuid::new_v4(),
            SourceRevision {
                repo_id: "acme/shop".into(),
                revision_sha: "rev1".into(),
                files: Vec::new(),
            },
            not_superseded(),
        )
        .await
        .unwrap();

    assert_eq!(record.status, ScanStatus::Errored);
    assert!(record.error.is_some());
    assert_eq!(stack.scoring.current_score("acme/shop").await, 100.0);
}

#[tokio::test]
async fn pre_superseded_scans_are_recorded_but_never_scored() {
    let stack = stack(vec![resilient(ScriptedAdapter::new("qwen").with_judgment(
        "GET",
        "/orders/{order_id}",
        JudgmentPayload::finding(VulnerabilityType::Bola, 95, "stale"),
    ))]);

    let record = stack
        .run_scan
        .execute(
            Uuid::new_v4(),
            revision("acme/shop", "rev1", UNGUARDED_ORDERS),
            Arc::new(AtomicBool::new(true)),
        )
        .await
        .unwrap();

    assert_eq!(record.status, ScanStatus::Superseded);
    assert!(!record.contributes_to_score());
    assert_eq!(record.score_delta, 0.0);
    assert_eq!(stack.scoring.current_score("acme/shop").await, 100.0);
}

#[tokio::test]
async fn saturated_worker_pool_still_serves_every_repository() {
    let stack = stack(vec![
        resilient(ScriptedAdapter::new("qwen")),
        resilient(ScriptedAdapter::new("llama")),
    ]);
    let shutdown = CancellationToken::new();
    let handle = spawn_scan_dispatcher(
        ScanWorkerContext {
            run_scan: stack.run_scan.clone(),
            scans: stack.scans.clone(),
        },
        &ScanConfig {
            max_concurrent_scans: 1,
            ..ScanConfig::default()
        },
        shutdown.clone(),
    );

    let repos = ["acme/shop", "acme/blog", "acme/wiki"];
    for repo in repos {
        handle
            .submit(revision(repo, "rev1", GUARDED_ORDERS))
            .await
            .unwrap();
    }

    // with a single permit the scans serialize, but dispatch must keep
    // claiming the other repositories instead of stalling behind the
    // running one
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let mut done = 0;
        for repo in repos {
            done += stack.scans.list(repo).await.unwrap().len();
        }
        if done >= repos.len() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "scans did not finish in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    for repo in repos {
        let records = stack.scans.list(repo).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ScanStatus::Passed);
    }

    shutdown.cancel();
}

#[tokio::test]
async fn queue_runs_submitted_scans_and_coalesces_bursts() {
    let stack = stack(vec![
        resilient(ScriptedAdapter::new("qwen")),
        resilient(ScriptedAdapter::new("llama")),
    ]);
    let shutdown = CancellationToken::new();
    let handle = spawn_scan_dispatcher(
        ScanWorkerContext {
            run_scan: stack.run_scan.clone(),
            scans: stack.scans.clone(),
        },
        &ScanConfig::default(),
        shutdown.clone(),
    );

    let mut submitted = Vec::new();
    for sha in ["rev1", "rev2", "rev3"] {
        submitted.push(
            handle
                .submit(revision("acme/shop", sha, GUARDED_ORDERS))
                .await
                .unwrap(),
        );
    }

    // wait until every submitted scan has a terminal record
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let records = stack.scans.list("acme/shop").await.unwrap();
        if records.len() >= submitted.len() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "scans did not finish in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let records = stack.scans.list("acme/shop").await.unwrap();
    assert_eq!(records.len(), 3);
    for scan_id in &submitted {
        assert!(records.iter().any(|r| r.scan_id == *scan_id));
    }
    // the burst resolves to exactly one contributing record per effective
    // revision; superseded ones are audit-only
    let contributing = records.iter().filter(|r| r.contributes_to_score()).count();
    let superseded = records
        .iter()
        .filter(|r| r.status == ScanStatus::Superseded)
        .count();
    assert_eq!(contributing + superseded, 3);
    assert!(contributing >= 1);

    shutdown.cancel();
}
