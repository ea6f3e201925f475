//! Application setup and wiring

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;

use sentinel_core::Config;
use sentinel_extract::ExtractEndpointsUseCase;
use sentinel_graph::{GraphStore, InMemoryGraphStore};
use sentinel_llm::{
    ConsensusEngine, InferenceAdapter, InferenceError, OpenAiCompatAdapter, ResilientAdapter,
    ScriptedAdapter,
};
use sentinel_orchestrator::{
    ApiState, GetDashboardUseCase, InMemoryScanRepository, InMemoryScoreLedger, RunRedTeamUseCase,
    RunScanUseCase, ScanRepository, ScanWorkerContext, ScoringEngine, create_router,
    spawn_scan_dispatcher,
};
use sentinel_redteam::{
    AttackResultRepository, InMemoryAttackResultRepository,
    application::simulator::AttackSimulationEngine,
};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Build every configured backend wrapped in its resilience layer
fn build_adapters(config: &Config) -> Result<Vec<Arc<ResilientAdapter>>, InferenceError> {
    let mut adapters = Vec::with_capacity(config.inference.backends.len());
    for backend in &config.inference.backends {
        let inner: Arc<dyn InferenceAdapter> = match backend.kind.as_str() {
            "openai_compatible" => Arc::new(OpenAiCompatAdapter::new(
                &backend.id,
                backend.base_url.clone().unwrap_or_default(),
                backend.api_key.clone(),
                backend.model.clone().unwrap_or_else(|| backend.id.clone()),
                config.inference.request_timeout(),
            )?),
            "scripted" => Arc::new(ScriptedAdapter::new(&backend.id)),
            other => {
                return Err(InferenceError::Configuration(format!(
                    "unknown backend kind '{}'",
                    other
                )));
            }
        };
        adapters.push(Arc::new(ResilientAdapter::new(inner, &config.inference)));
    }
    Ok(adapters)
}

/// Wire the full application and spawn its background dispatcher
pub async fn create_app(config: Config) -> Result<AppHandle, Box<dyn std::error::Error>> {
    let shutdown_token = CancellationToken::new();

    let adapters = build_adapters(&config)?;
    tracing::info!(backends = adapters.len(), "Inference backends configured");
    if adapters.len() < 2 {
        tracing::warn!("Fewer than two backends configured; findings cannot reach full consensus");
    }

    let graph_store: Arc<dyn GraphStore> =
        Arc::new(InMemoryGraphStore::new(config.extraction.clone()));
    let scans: Arc<dyn ScanRepository> = Arc::new(InMemoryScanRepository::new());
    let attack_results: Arc<dyn AttackResultRepository> =
        Arc::new(InMemoryAttackResultRepository::new());
    let scoring = Arc::new(ScoringEngine::new(
        config.scoring.clone(),
        Arc::new(InMemoryScoreLedger::new()),
    ));

    let consensus = Arc::new(ConsensusEngine::new(
        adapters.clone(),
        config.consensus.clone(),
    ));

    let run_scan = Arc::new(RunScanUseCase::new(
        ExtractEndpointsUseCase::new(config.extraction.clone()),
        graph_store.clone(),
        consensus,
        scoring.clone(),
        scans.clone(),
        config.scan.clone(),
    ));

    let queue = spawn_scan_dispatcher(
        ScanWorkerContext {
            run_scan,
            scans: scans.clone(),
        },
        &config.scan,
        shutdown_token.clone(),
    );

    let redteam_engine = Arc::new(AttackSimulationEngine::new(
        adapters,
        attack_results.clone(),
        &config.redteam,
    ));

    let state = ApiState {
        queue,
        scans: scans.clone(),
        graph_store: graph_store.clone(),
        scoring: scoring.clone(),
        attack_results: attack_results.clone(),
        dashboard: Arc::new(GetDashboardUseCase::new(
            scans.clone(),
            scoring,
            attack_results,
            &config.scan,
        )),
        redteam: Arc::new(RunRedTeamUseCase::new(scans, graph_store, redteam_engine)),
    };

    Ok(AppHandle {
        router: create_router(state),
        shutdown_token,
    })
}
