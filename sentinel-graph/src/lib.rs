//! Sentinel Graph - versioned authorization graph store
//!
//! Maintains Role/Guard -> Route -> Resource snapshots per repository
//! revision and computes structural drift between consecutive snapshots.
//! Snapshots are immutable: a new revision appends a new snapshot linked to
//! its predecessor by repository, and the "current" pointer advances only
//! after a full commit succeeds.

pub mod domain;
pub mod infrastructure;

pub use domain::store::GraphStore;
pub use domain::{AuthorizationSnapshot, GraphError, RouteNode, SnapshotId};
pub use infrastructure::memory::InMemoryGraphStore;
