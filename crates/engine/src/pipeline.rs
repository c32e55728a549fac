use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use opsgen_core::{PipelineError, PromptVariables, TargetEnvironment};

use crate::extract::extract;
use crate::request::RequestBuilder;
use crate::source::GenerationSource;

/// Result of one generation pass. An empty `script` with possibly
/// non-empty `text` is the extraction-miss outcome, not an error.
#[derive(Clone, Debug)]
pub struct GeneratedScript {
    pub script: String,
    pub text: String,
    pub raw: Value,
    pub variables: PromptVariables,
    pub tool_name: String,
}

impl GeneratedScript {
    pub fn is_miss(&self) -> bool {
        self.script.is_empty()
    }
}

/// End-to-end generation pipeline: build request → generation source →
/// extract script. Each call is independent, function-scoped state; the
/// generator itself holds only immutable configuration.
#[derive(Clone)]
pub struct ScriptGenerator {
    builder: RequestBuilder,
    source: Arc<dyn GenerationSource>,
}

impl ScriptGenerator {
    pub fn new(builder: RequestBuilder, source: Arc<dyn GenerationSource>) -> Self {
        Self { builder, source }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn generate(
        &self,
        environment: TargetEnvironment,
        task: &str,
    ) -> Result<GeneratedScript, PipelineError> {
        let built = self.builder.build(environment, task).await?;

        info!(
            event_name = "generate.request_built",
            environment = %environment,
            tool_name = %built.tool_name,
            source = self.source.name(),
            "generation request assembled"
        );

        let raw = self.source.generate(&built.request).await?;
        let extraction = extract(&raw, &built.tool_name);

        info!(
            event_name = "generate.extracted",
            environment = %environment,
            script_len = extraction.script.len(),
            text_len = extraction.text.len(),
            miss = extraction.script.is_empty(),
            "script extraction finished"
        );

        Ok(GeneratedScript {
            script: extraction.script,
            text: extraction.text,
            raw,
            variables: built.variables,
            tool_name: built.tool_name,
        })
    }
}
