use std::path::{Path, PathBuf};

use crate::errors::PipelineError;
use crate::target::TargetEnvironment;

/// Read-only store of grammar resources, one file per target environment.
///
/// Grammar text is opaque to this crate; enforcement is delegated entirely
/// to the generation service. Files are re-read per request — callers that
/// need caching add their own.
#[derive(Clone, Debug)]
pub struct GrammarStore {
    root: PathBuf,
}

impl GrammarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, environment: TargetEnvironment) -> PathBuf {
        self.root.join(environment.grammar_file())
    }

    /// Raw grammar definition text for `environment`. A missing or
    /// unreadable file surfaces as `GrammarNotFound`.
    pub async fn load(&self, environment: TargetEnvironment) -> Result<String, PipelineError> {
        let path = self.path_for(environment);
        tokio::fs::read_to_string(&path).await.map_err(|_| PipelineError::GrammarNotFound {
            environment: environment.identifier().to_string(),
            path,
        })
    }

    /// Presence probe used by readiness checks.
    pub async fn exists(&self, environment: TargetEnvironment) -> bool {
        tokio::fs::try_exists(self.path_for(environment)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::GrammarStore;
    use crate::errors::PipelineError;
    use crate::target::TargetEnvironment;

    #[tokio::test]
    async fn loads_grammar_text_for_registered_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("gam.lark"), "start: command\n").expect("write grammar");

        let store = GrammarStore::new(dir.path());
        let text = store.load(TargetEnvironment::Gam).await.expect("grammar should load");
        assert_eq!(text, "start: command\n");
        assert!(store.exists(TargetEnvironment::Gam).await);
    }

    #[tokio::test]
    async fn missing_grammar_is_resource_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GrammarStore::new(dir.path());

        let error = store.load(TargetEnvironment::M365).await.unwrap_err();
        match error {
            PipelineError::GrammarNotFound { environment, path } => {
                assert_eq!(environment, "m365");
                assert!(path.ends_with("m365.lark"));
            }
            other => panic!("expected GrammarNotFound, got {other:?}"),
        }
        assert!(!store.exists(TargetEnvironment::M365).await);
    }
}
