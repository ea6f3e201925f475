//! Extraction domain types

/// Fatal extraction failure.
///
/// Per-route problems never surface here: a route whose guards or path
/// cannot be interpreted is reported with an empty guard set or a
/// `<dynamic>` path. This error fails the whole scan, and no partial graph
/// snapshot is committed.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Revision {revision_sha} of {repo_id} contains no files")]
    EmptyRevision {
        repo_id: String,
        revision_sha: String,
    },

    #[error("Revision {revision_sha} of {repo_id} contains no parseable source files")]
    NoParseableSource {
        repo_id: String,
        revision_sha: String,
    },
}
