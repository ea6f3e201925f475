//! Route descriptors produced by endpoint extraction

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Path template placeholder for routes whose path is built dynamically
/// and cannot be resolved statically. Such routes are always sent to
/// mandatory evaluation.
pub const DYNAMIC_PATH: &str = "<dynamic>";

/// Identity of a route, stable across revisions.
///
/// Two extractions of the same repository that describe the same method and
/// path template describe the same route, regardless of handler renames.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub struct EndpointKey {
    pub repo_id: String,
    pub method: String,
    pub path_template: String,
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.method, self.path_template, self.repo_id)
    }
}

/// A handler parameter, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParamDescriptor {
    pub name: String,
    /// Declared type annotation, when present in the source
    pub type_hint: Option<String>,
}

/// Normalized route descriptor for one revision of one repository.
///
/// Immutable once produced; the next scan's extraction supersedes it rather
/// than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Endpoint {
    pub repo_id: String,
    pub revision_sha: String,
    /// Uppercase HTTP method ("GET", "POST", ...)
    pub method: String,
    /// Route path template, or [`DYNAMIC_PATH`] when unresolvable
    pub path_template: String,
    pub handler_name: String,
    pub file_path: String,
    /// Authorization guards structurally attached to the handler.
    /// Empty when no recognized guard form is present.
    pub declared_guards: BTreeSet<String>,
    pub parameters: Vec<ParamDescriptor>,
    /// Handler source excerpt submitted to inference backends
    pub handler_source: String,
}

impl Endpoint {
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            repo_id: self.repo_id.clone(),
            method: self.method.clone(),
            path_template: self.path_template.clone(),
        }
    }

    /// True when the path template could not be resolved statically
    pub fn is_dynamic(&self) -> bool {
        self.path_template == DYNAMIC_PATH
    }

    /// True when no authorization guard protects the handler
    pub fn is_ungoverned(&self) -> bool {
        self.declared_guards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(path: &str, guards: &[&str]) -> Endpoint {
        Endpoint {
            repo_id: "acme/shop".into(),
            revision_sha: "abc123".into(),
            method: "GET".into(),
            path_template: path.into(),
            handler_name: "get_order".into(),
            file_path: "app/orders.py".into(),
            declared_guards: guards.iter().map(|g| g.to_string()).collect(),
            parameters: vec![],
            handler_source: String::new(),
        }
    }

    #[test]
    fn key_ignores_handler_identity() {
        let mut a = endpoint("/api/orders/{order_id}", &[]);
        let mut b = endpoint("/api/orders/{order_id}", &["verify_token"]);
        a.handler_name = "get_order".into();
        b.handler_name = "fetch_order".into();
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn dynamic_and_ungoverned_flags() {
        let ep = endpoint(DYNAMIC_PATH, &[]);
        assert!(ep.is_dynamic());
        assert!(ep.is_ungoverned());
        assert!(!endpoint("/x", &["verify_token"]).is_ungoverned());
    }
}
