use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds of the generation/execution pipeline.
///
/// An extraction miss (no qualifying tool block in a response) is not an
/// error: it surfaces as an empty script with best-effort text, and callers
/// must handle it explicitly.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No grammar resource is registered for the environment. Fatal to
    /// request building; surfaced to the caller, never retried.
    #[error("no grammar registered for environment `{environment}` (looked in `{path}`)")]
    GrammarNotFound { environment: String, path: PathBuf },

    /// Malformed caller input, rejected before any external call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The generation call itself failed (network, auth, rate limit).
    /// Distinct from a parsing miss; retry policy belongs to the caller.
    #[error("generation service failure: {0}")]
    Service(String),

    /// Execution requested without the exact confirmation literal. No
    /// process is spawned.
    #[error("execution not confirmed: confirmation token does not match")]
    ConfirmationMismatch,

    /// The shell process could not be started. A script's own non-zero
    /// exit status is a normal result, never this variant.
    #[error("failed to spawn shell process: {0}")]
    Spawn(String),
}

impl PipelineError {
    /// Stable machine-readable kind tag, used in telemetry and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GrammarNotFound { .. } => "grammar_not_found",
            Self::Validation(_) => "validation",
            Self::Service(_) => "service",
            Self::ConfirmationMismatch => "confirmation_mismatch",
            Self::Spawn(_) => "spawn",
        }
    }

    /// Message safe to show an operator without leaking transport detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::GrammarNotFound { .. } => {
                "No grammar is available for that environment."
            }
            Self::Validation(_) => "The request could not be processed. Check inputs and try again.",
            Self::Service(_) => "The generation service is unavailable. Please retry shortly.",
            Self::ConfirmationMismatch => {
                "Execution requires the exact confirmation phrase. Nothing was run."
            }
            Self::Spawn(_) => "The script could not be started on this host.",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::PipelineError;

    #[test]
    fn kinds_are_stable_tags() {
        let error = PipelineError::GrammarNotFound {
            environment: "gam".to_string(),
            path: PathBuf::from("cfg/gam.lark"),
        };
        assert_eq!(error.kind(), "grammar_not_found");
        assert_eq!(PipelineError::ConfirmationMismatch.kind(), "confirmation_mismatch");
        assert_eq!(PipelineError::Service("timeout".to_string()).kind(), "service");
    }

    #[test]
    fn confirmation_mismatch_has_user_safe_message() {
        assert_eq!(
            PipelineError::ConfirmationMismatch.user_message(),
            "Execution requires the exact confirmation phrase. Nothing was run."
        );
    }

    #[test]
    fn spawn_message_names_the_host_not_the_script() {
        let error = PipelineError::Spawn("program not found".to_string());
        assert_eq!(error.user_message(), "The script could not be started on this host.");
        assert!(error.to_string().contains("program not found"));
    }
}
