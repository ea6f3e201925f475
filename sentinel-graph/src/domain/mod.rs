//! Graph domain model

pub mod store;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sentinel_core::config::ExtractionConfig;
use sentinel_core::domain::{Endpoint, EndpointKey};

/// Opaque identifier of one committed snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub Uuid);

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One Route node with its incoming grants (guards) and outgoing exposes
/// (resources) edges.
///
/// A route with no incoming grants edge is "ungoverned".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNode {
    pub key: EndpointKey,
    pub handler_name: String,
    /// Guards granting access to this route (grants edges)
    pub guards: BTreeSet<String>,
    /// Resources this route exposes (exposes edges), derived from
    /// non-principal handler parameters
    pub resources: BTreeSet<String>,
    pub dynamic_path: bool,
}

impl RouteNode {
    /// Build a route node from an extracted endpoint. Resource edges come
    /// from handler parameters that do not denote the calling principal.
    pub fn from_endpoint(endpoint: &Endpoint, config: &ExtractionConfig) -> Self {
        let resources = endpoint
            .parameters
            .iter()
            .map(|p| p.name.clone())
            .filter(|name| !config.principal_params.iter().any(|p| p == name))
            .collect();
        Self {
            key: endpoint.key(),
            handler_name: endpoint.handler_name.clone(),
            guards: endpoint.declared_guards.clone(),
            resources,
            dynamic_path: endpoint.is_dynamic(),
        }
    }

    pub fn is_ungoverned(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Immutable authorization graph snapshot for one `(repo_id, revision_sha)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationSnapshot {
    pub snapshot_id: SnapshotId,
    pub repo_id: String,
    pub revision_sha: String,
    /// Revision of the predecessor snapshot in this repository's lineage
    pub parent_sha: Option<String>,
    pub routes: Vec<RouteNode>,
    pub committed_at: DateTime<Utc>,
}

impl AuthorizationSnapshot {
    pub fn route(&self, key: &EndpointKey) -> Option<&RouteNode> {
        self.routes.iter().find(|r| &r.key == key)
    }
}

/// Graph store failure
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("No snapshot for revision {revision_sha} of {repo_id}")]
    SnapshotNotFound {
        repo_id: String,
        revision_sha: String,
    },

    /// A snapshot referenced a route absent from its own endpoint list.
    /// Indicates an internal bug; the owning scan aborts and is flagged
    /// for operator review.
    #[error("Graph consistency violation: {0}")]
    Consistency(String),
}
