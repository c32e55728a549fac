use serde::Serialize;

use opsgen_core::{
    GrammarStore, PipelineError, PromptRenderer, PromptVariables, ShellDialect, TargetEnvironment,
};

/// One role-tagged instruction message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequestMessage {
    pub role: &'static str,
    pub content: String,
}

/// Grammar constraint attached to the tool declaration. The definition is
/// opaque grammar text; `syntax` is the single dialect tag the service
/// recognizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GrammarFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub syntax: &'static str,
    pub definition: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolDeclaration {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub description: String,
    pub format: GrammarFormat,
}

/// Forced tool-choice reference. Must name exactly the declared tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
}

/// Immutable generation request, built once per task and consumed once.
/// Serializes into the OpenAI Responses wire shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub input: Vec<RequestMessage>,
    pub tools: Vec<ToolDeclaration>,
    pub tool_choice: ToolChoice,
}

/// Assembled request plus the substitution variables that produced its
/// instruction text, so callers can reproduce or audit the prompt.
#[derive(Clone, Debug)]
pub struct BuiltRequest {
    pub request: GenerationRequest,
    pub variables: PromptVariables,
    pub tool_name: String,
}

/// Builds grammar-constrained tool-call requests. Holds no mutable state;
/// each `build` reads the grammar fresh and renders the prompt templates in
/// one pass.
#[derive(Clone)]
pub struct RequestBuilder {
    model: String,
    grammars: GrammarStore,
    prompts: PromptRenderer,
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>, grammars: GrammarStore) -> Result<Self, PipelineError> {
        Ok(Self { model: model.into(), grammars, prompts: PromptRenderer::new()? })
    }

    /// Assemble the request for one task. The task utterance is assumed
    /// non-empty; emptiness is an interface-layer validation failure.
    pub async fn build(
        &self,
        environment: TargetEnvironment,
        task: &str,
    ) -> Result<BuiltRequest, PipelineError> {
        let shell = ShellDialect::for_host();
        let grammar_text = self.grammars.load(environment).await?;

        let variables = PromptVariables::for_request(environment, shell);
        let rendered = self.prompts.render(variables, task)?;

        let tool_name = environment.tool_name().to_string();
        let tool = ToolDeclaration {
            kind: "custom",
            name: tool_name.clone(),
            description: format!(
                "Execute a {} script for {}. The tool input MUST be exactly the full script to run.",
                shell.label(),
                environment.identifier()
            ),
            format: GrammarFormat { kind: "grammar", syntax: "lark", definition: grammar_text },
        };

        let request = GenerationRequest {
            model: self.model.clone(),
            input: vec![
                RequestMessage { role: "system", content: rendered.system },
                RequestMessage { role: "user", content: rendered.user },
            ],
            tools: vec![tool],
            // Forcing the declared tool: the model may not decline the call
            // or answer in free text.
            tool_choice: ToolChoice { kind: "custom", name: tool_name.clone() },
        };

        Ok(BuiltRequest { request, variables: rendered.variables, tool_name })
    }
}

#[cfg(test)]
mod tests {
    use opsgen_core::{GrammarStore, TargetEnvironment};

    use super::RequestBuilder;

    fn builder_with_grammars() -> (tempfile::TempDir, RequestBuilder) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("gam.lark"), "start: \"gam\" command\n")
            .expect("write gam grammar");
        std::fs::write(dir.path().join("m365.lark"), "start: \"m365\" command\n")
            .expect("write m365 grammar");
        let builder = RequestBuilder::new("gpt-5", GrammarStore::new(dir.path()))
            .expect("builder should construct");
        (dir, builder)
    }

    #[tokio::test]
    async fn tool_choice_names_the_declared_tool() {
        let (_dir, builder) = builder_with_grammars();

        for environment in TargetEnvironment::ALL {
            let built = builder.build(environment, "list users").await.expect("build");
            assert_eq!(built.request.tools.len(), 1);
            assert_eq!(built.request.tool_choice.name, built.request.tools[0].name);
            assert_eq!(built.tool_name, environment.tool_name());
        }
    }

    #[tokio::test]
    async fn grammar_text_is_embedded_in_the_declaration() {
        let (_dir, builder) = builder_with_grammars();

        let built = builder.build(TargetEnvironment::M365, "list users").await.expect("build");
        let format = &built.request.tools[0].format;
        assert_eq!(format.syntax, "lark");
        assert_eq!(format.definition, "start: \"m365\" command\n");
    }

    #[tokio::test]
    async fn request_serializes_to_responses_wire_shape() {
        let (_dir, builder) = builder_with_grammars();

        let built = builder.build(TargetEnvironment::Gam, "onboard neil").await.expect("build");
        let wire = serde_json::to_value(&built.request).expect("serialize");

        assert_eq!(wire["tools"][0]["type"], "custom");
        assert_eq!(wire["tools"][0]["name"], "execute_gam");
        assert_eq!(wire["tools"][0]["format"]["type"], "grammar");
        assert_eq!(wire["tools"][0]["format"]["syntax"], "lark");
        assert_eq!(wire["tool_choice"]["type"], "custom");
        assert_eq!(wire["tool_choice"]["name"], "execute_gam");
        assert_eq!(wire["input"][0]["role"], "system");
        assert_eq!(wire["input"][1]["role"], "user");
    }

    #[tokio::test]
    async fn missing_grammar_fails_the_build() {
        let dir = tempfile::tempdir().expect("tempdir");
        let builder = RequestBuilder::new("gpt-5", GrammarStore::new(dir.path()))
            .expect("builder should construct");

        let error = builder.build(TargetEnvironment::Gam, "list users").await.unwrap_err();
        assert_eq!(error.kind(), "grammar_not_found");
    }
}
