//! Graph store capability

use async_trait::async_trait;

use sentinel_core::domain::{Endpoint, GraphDelta};

use super::{AuthorizationSnapshot, GraphError, SnapshotId};

/// Persistence boundary for authorization graph snapshots.
///
/// Implementations must be append-only: snapshots are never mutated in
/// place, and `commit_snapshot` is idempotent on `(repo_id, revision_sha)`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Commit the extracted endpoints of one revision as a new snapshot.
    /// Committing the same revision twice returns the existing snapshot id
    /// without duplicating nodes or edges.
    async fn commit_snapshot(
        &self,
        repo_id: &str,
        revision_sha: &str,
        endpoints: &[Endpoint],
    ) -> Result<SnapshotId, GraphError>;

    /// Structural diff between two snapshots of the same repository.
    /// `from` of `None` (first scan) classifies every route as added and
    /// produces zero drift.
    async fn diff(
        &self,
        repo_id: &str,
        from_sha: Option<&str>,
        to_sha: &str,
    ) -> Result<GraphDelta, GraphError>;

    /// Revision of the most recently committed snapshot, if any
    async fn latest(&self, repo_id: &str) -> Option<String>;

    /// Fetch one committed snapshot
    async fn snapshot(
        &self,
        repo_id: &str,
        revision_sha: &str,
    ) -> Result<AuthorizationSnapshot, GraphError>;

    /// Destroy all snapshots for a repository. Destructive, irreversible.
    async fn reset(&self, repo_id: &str);
}
