//! Structural drift between two authorization graph snapshots

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::endpoint::EndpointKey;

/// Computed difference between two consecutive snapshots of a repository's
/// authorization graph. Derived data, never primary truth.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GraphDelta {
    /// Routes present only in the newer snapshot
    pub added_routes: Vec<EndpointKey>,
    /// Routes present only in the older snapshot
    pub removed_routes: Vec<EndpointKey>,
    /// Routes whose guard set lost at least one guard (drift)
    pub routes_with_removed_guards: Vec<EndpointKey>,
    /// Routes whose guard set gained at least one guard
    pub routes_with_added_guards: Vec<EndpointKey>,
}

impl GraphDelta {
    pub fn is_empty(&self) -> bool {
        self.added_routes.is_empty()
            && self.removed_routes.is_empty()
            && self.routes_with_removed_guards.is_empty()
            && self.routes_with_added_guards.is_empty()
    }

    /// Number of routes whose guard set shrank. Drift is a leading
    /// indicator and is penalized even without a confirmed verdict.
    pub fn drift_count(&self) -> usize {
        self.routes_with_removed_guards.len()
    }

    /// True when the route must be re-evaluated by the consensus engine
    /// because of this delta (guard set shrank, or newly added)
    pub fn mandates_evaluation(&self, key: &EndpointKey) -> bool {
        self.routes_with_removed_guards.contains(key) || self.added_routes.contains(key)
    }
}
