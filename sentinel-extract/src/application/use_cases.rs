//! Endpoint extraction use case

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use sentinel_core::config::ExtractionConfig;
use sentinel_core::domain::{Endpoint, EndpointKey, SourceRevision};

use crate::domain::ExtractionError;
use crate::infrastructure::route_matcher;

/// Extracts the normalized endpoint set of one source revision.
///
/// Deterministic: the same revision always yields the same endpoints, in
/// the same order, with the same declared guards.
pub struct ExtractEndpointsUseCase {
    config: ExtractionConfig,
}

impl ExtractEndpointsUseCase {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, revision: &SourceRevision) -> Result<Vec<Endpoint>, ExtractionError> {
        if revision.files.is_empty() {
            return Err(ExtractionError::EmptyRevision {
                repo_id: revision.repo_id.clone(),
                revision_sha: revision.revision_sha.clone(),
            });
        }

        let mut files: Vec<_> = revision
            .files
            .iter()
            .filter(|f| self.is_source_file(&f.path))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        if files.is_empty() {
            return Err(ExtractionError::NoParseableSource {
                repo_id: revision.repo_id.clone(),
                revision_sha: revision.revision_sha.clone(),
            });
        }

        let mut endpoints = Vec::new();
        for file in files {
            let matches = route_matcher::match_routes(&file.content, &self.config);
            debug!(
                file = %file.path,
                routes = matches.len(),
                "Matched routes in source file"
            );
            endpoints.extend(route_matcher::into_endpoints(
                &revision.repo_id,
                &revision.revision_sha,
                &file.path,
                matches,
            ));
        }

        // Normalize ordering and drop duplicate identities (first wins,
        // in file-path order)
        endpoints.sort_by(|a, b| {
            (&a.file_path, &a.method, &a.path_template, &a.handler_name).cmp(&(
                &b.file_path,
                &b.method,
                &b.path_template,
                &b.handler_name,
            ))
        });
        let mut seen: BTreeSet<EndpointKey> = BTreeSet::new();
        endpoints.retain(|ep| seen.insert(ep.key()));

        let dynamic = endpoints.iter().filter(|e| e.is_dynamic()).count();
        if dynamic > 0 {
            warn!(
                repo_id = %revision.repo_id,
                dynamic,
                "Routes with unresolvable path templates flagged for mandatory evaluation"
            );
        }
        info!(
            repo_id = %revision.repo_id,
            revision = %revision.revision_sha,
            endpoints = endpoints.len(),
            "Endpoint extraction complete"
        );

        Ok(endpoints)
    }

    fn is_source_file(&self, path: &str) -> bool {
        path.rsplit('.')
            .next()
            .map(|ext| self.config.source_extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::domain::SourceFile;

    fn revision(files: Vec<SourceFile>) -> SourceRevision {
        SourceRevision::new("acme/shop", "abc123", files)
    }

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.into(),
            content: content.into(),
        }
    }

    #[test]
    fn empty_revision_fails_closed() {
        let use_case = ExtractEndpointsUseCase::new(ExtractionConfig::default());
        assert!(matches!(
            use_case.execute(&revision(vec![])),
            Err(ExtractionError::EmptyRevision { .. })
        ));
    }

    #[test]
    fn revision_without_source_files_fails_closed() {
        let use_case = ExtractEndpointsUseCase::new(ExtractionConfig::default());
        let rev = revision(vec![file("README.md", "# readme")]);
        assert!(matches!(
            use_case.execute(&rev),
            Err(ExtractionError::NoParseableSource { .. })
        ));
    }

    #[test]
    fn extraction_is_deterministic_across_file_order() {
        let a = file(
            "app/a.py",
            "@app.get(\"/a\")\ndef get_a():\n    return 1\n",
        );
        let b = file(
            "app/b.py",
            "@app.post(\"/b\")\ndef post_b(user=Depends(verify_token)):\n    return 2\n",
        );
        let use_case = ExtractEndpointsUseCase::new(ExtractionConfig::default());

        let forward = use_case
            .execute(&revision(vec![a.clone(), b.clone()]))
            .unwrap();
        let reversed = use_case.execute(&revision(vec![b, a])).unwrap();

        let keys = |eps: &[Endpoint]| eps.iter().map(|e| e.key()).collect::<Vec<_>>();
        assert_eq!(keys(&forward), keys(&reversed));
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn duplicate_route_identities_collapse_to_first() {
        let a = file(
            "app/a.py",
            "@app.get(\"/same\")\ndef first():\n    return 1\n",
        );
        let b = file(
            "app/b.py",
            "@app.get(\"/same\")\ndef second():\n    return 2\n",
        );
        let use_case = ExtractEndpointsUseCase::new(ExtractionConfig::default());
        let endpoints = use_case.execute(&revision(vec![a, b])).unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].handler_name, "first");
    }

    #[test]
    fn guards_survive_extraction() {
        let src = file(
            "app/orders.py",
            r#"
@router.get("/api/orders/{order_id}")
async def get_order(order_id: int, current_user=Depends(verify_token)):
    return fetch(order_id)
"#,
        );
        let use_case = ExtractEndpointsUseCase::new(ExtractionConfig::default());
        let endpoints = use_case.execute(&revision(vec![src])).unwrap();
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].declared_guards.contains("verify_token"));
        assert!(!endpoints[0].is_ungoverned());
    }
}
