//! In-memory snapshot arena
//!
//! Keeps every committed snapshot indexed by `(repo_id, revision_sha)`.
//! The per-repository "current" pointer advances only after a commit fully
//! succeeds, so readers never observe a partial snapshot.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use sentinel_core::config::ExtractionConfig;
use sentinel_core::domain::{Endpoint, EndpointKey, GraphDelta};

use crate::domain::store::GraphStore;
use crate::domain::{AuthorizationSnapshot, GraphError, RouteNode, SnapshotId};

#[derive(Default)]
struct RepoLineage {
    by_sha: HashMap<String, Arc<AuthorizationSnapshot>>,
    /// Revision of the current (most recently committed) snapshot
    current: Option<String>,
}

/// Arena of immutable snapshots, one lineage per repository
pub struct InMemoryGraphStore {
    extraction: ExtractionConfig,
    repos: RwLock<HashMap<String, RepoLineage>>,
}

impl InMemoryGraphStore {
    pub fn new(extraction: ExtractionConfig) -> Self {
        Self {
            extraction,
            repos: RwLock::new(HashMap::new()),
        }
    }

    fn build_routes(
        &self,
        repo_id: &str,
        endpoints: &[Endpoint],
    ) -> Result<Vec<RouteNode>, GraphError> {
        let mut routes: BTreeMap<EndpointKey, RouteNode> = BTreeMap::new();
        for endpoint in endpoints {
            let node = RouteNode::from_endpoint(endpoint, &self.extraction);
            if routes.insert(node.key.clone(), node).is_some() {
                // The extractor already deduplicates identities; a
                // duplicate here means the committed set disagrees with
                // itself.
                return Err(GraphError::Consistency(format!(
                    "Duplicate route identity in endpoint set for {}",
                    repo_id
                )));
            }
        }
        let routes: Vec<RouteNode> = routes.into_values().collect();

        // Every Route node must correspond to exactly one endpoint from
        // this extraction.
        if routes.len() != endpoints.len() {
            return Err(GraphError::Consistency(format!(
                "Snapshot for {} has {} route nodes for {} endpoints",
                repo_id,
                routes.len(),
                endpoints.len()
            )));
        }
        for route in &routes {
            if !endpoints.iter().any(|e| e.key() == route.key) {
                return Err(GraphError::Consistency(format!(
                    "Route {} has no backing endpoint",
                    route.key
                )));
            }
        }
        Ok(routes)
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn commit_snapshot(
        &self,
        repo_id: &str,
        revision_sha: &str,
        endpoints: &[Endpoint],
    ) -> Result<SnapshotId, GraphError> {
        // Build and validate outside the write lock; nothing is published
        // unless the whole commit succeeds.
        let routes = self.build_routes(repo_id, endpoints)?;

        let mut repos = self.repos.write().await;
        let lineage = repos.entry(repo_id.to_string()).or_default();

        if let Some(existing) = lineage.by_sha.get(revision_sha) {
            debug!(
                repo_id,
                revision_sha,
                snapshot_id = %existing.snapshot_id,
                "Snapshot already committed; returning existing"
            );
            return Ok(existing.snapshot_id);
        }

        let snapshot = AuthorizationSnapshot {
            snapshot_id: SnapshotId(Uuid::new_v4()),
            repo_id: repo_id.to_string(),
            revision_sha: revision_sha.to_string(),
            parent_sha: lineage.current.clone(),
            routes,
            committed_at: Utc::now(),
        };
        let snapshot_id = snapshot.snapshot_id;
        let ungoverned = snapshot.routes.iter().filter(|r| r.is_ungoverned()).count();

        lineage
            .by_sha
            .insert(revision_sha.to_string(), Arc::new(snapshot));
        lineage.current = Some(revision_sha.to_string());

        info!(
            repo_id,
            revision_sha,
            %snapshot_id,
            routes = endpoints.len(),
            ungoverned,
            "Committed authorization graph snapshot"
        );
        Ok(snapshot_id)
    }

    async fn diff(
        &self,
        repo_id: &str,
        from_sha: Option<&str>,
        to_sha: &str,
    ) -> Result<GraphDelta, GraphError> {
        let repos = self.repos.read().await;
        let lineage = repos
            .get(repo_id)
            .ok_or_else(|| GraphError::SnapshotNotFound {
                repo_id: repo_id.to_string(),
                revision_sha: to_sha.to_string(),
            })?;
        let to = lineage
            .by_sha
            .get(to_sha)
            .ok_or_else(|| GraphError::SnapshotNotFound {
                repo_id: repo_id.to_string(),
                revision_sha: to_sha.to_string(),
            })?;

        let Some(from_sha) = from_sha else {
            // First scan: everything is new, nothing has drifted
            return Ok(GraphDelta {
                added_routes: to.routes.iter().map(|r| r.key.clone()).collect(),
                ..GraphDelta::default()
            });
        };

        let from = lineage
            .by_sha
            .get(from_sha)
            .ok_or_else(|| GraphError::SnapshotNotFound {
                repo_id: repo_id.to_string(),
                revision_sha: from_sha.to_string(),
            })?;

        let mut delta = GraphDelta::default();
        for route in &to.routes {
            match from.route(&route.key) {
                None => delta.added_routes.push(route.key.clone()),
                Some(prior) => {
                    // A guard set changed in both directions still counts
                    // as a guard change on one route, never as a separate
                    // add+remove of the route itself.
                    let removed = prior.guards.difference(&route.guards).count();
                    let added = route.guards.difference(&prior.guards).count();
                    if removed > 0 {
                        delta.routes_with_removed_guards.push(route.key.clone());
                    }
                    if added > 0 {
                        delta.routes_with_added_guards.push(route.key.clone());
                    }
                }
            }
        }
        for route in &from.routes {
            if to.route(&route.key).is_none() {
                delta.removed_routes.push(route.key.clone());
            }
        }
        Ok(delta)
    }

    async fn latest(&self, repo_id: &str) -> Option<String> {
        self.repos
            .read()
            .await
            .get(repo_id)
            .and_then(|lineage| lineage.current.clone())
    }

    async fn snapshot(
        &self,
        repo_id: &str,
        revision_sha: &str,
    ) -> Result<AuthorizationSnapshot, GraphError> {
        self.repos
            .read()
            .await
            .get(repo_id)
            .and_then(|lineage| lineage.by_sha.get(revision_sha))
            .map(|s| s.as_ref().clone())
            .ok_or_else(|| GraphError::SnapshotNotFound {
                repo_id: repo_id.to_string(),
                revision_sha: revision_sha.to_string(),
            })
    }

    async fn reset(&self, repo_id: &str) {
        if self.repos.write().await.remove(repo_id).is_some() {
            info!(repo_id, "Cleared authorization graph lineage");
        }
    }
}
