//! Source revision input to a scan
//!
//! How source code reaches the engine (clone, archive, webhook payload) is a
//! collaborator concern; a scan only ever sees this normalized form.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One source file of a revision
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// A code revision submitted for scanning
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceRevision {
    pub repo_id: String,
    pub revision_sha: String,
    pub files: Vec<SourceFile>,
}

impl SourceRevision {
    pub fn new(
        repo_id: impl Into<String>,
        revision_sha: impl Into<String>,
        files: Vec<SourceFile>,
    ) -> Self {
        Self {
            repo_id: repo_id.into(),
            revision_sha: revision_sha.into(),
            files,
        }
    }
}
