use serde::Serialize;
use tera::Tera;

use crate::errors::PipelineError;
use crate::target::{ShellDialect, TargetEnvironment};

const SYSTEM_TEMPLATE: &str = include_str!("../templates/system_prompt.txt");
const USER_TEMPLATE: &str = include_str!("../templates/user_message.txt");

const SYSTEM_TEMPLATE_NAME: &str = "system_prompt.txt";
const USER_TEMPLATE_NAME: &str = "user_message.txt";

/// Closed set of template variables. Every placeholder the prompt templates
/// may reference is a field here; a placeholder outside this set fails
/// rendering instead of passing through unreplaced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PromptVariables {
    pub shell_label: String,
    pub environment_id: String,
    pub environment_label: String,
    pub os_label: String,
}

impl PromptVariables {
    pub fn for_request(environment: TargetEnvironment, shell: ShellDialect) -> Self {
        Self {
            shell_label: shell.label().to_string(),
            environment_id: environment.identifier().to_string(),
            environment_label: environment.label().to_string(),
            os_label: shell.os_label().to_string(),
        }
    }
}

/// Rendered instruction pair plus the variables that produced it, so a
/// caller can reproduce or audit the substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
    pub variables: PromptVariables,
}

/// Renders the embedded prompt templates in a single deterministic pass.
#[derive(Clone)]
pub struct PromptRenderer {
    templates: Tera,
}

impl PromptRenderer {
    pub fn new() -> Result<Self, PipelineError> {
        let mut templates = Tera::default();
        templates
            .add_raw_templates([
                (SYSTEM_TEMPLATE_NAME, SYSTEM_TEMPLATE),
                (USER_TEMPLATE_NAME, USER_TEMPLATE),
            ])
            .map_err(|error| {
                PipelineError::Validation(format!("prompt template registration failed: {error}"))
            })?;
        Ok(Self { templates })
    }

    /// Render both instruction messages for one task. Assumes a non-empty
    /// task utterance; emptiness is rejected by the interface layer.
    pub fn render(
        &self,
        variables: PromptVariables,
        task: &str,
    ) -> Result<RenderedPrompt, PipelineError> {
        let mut context = tera::Context::from_serialize(&variables).map_err(|error| {
            PipelineError::Validation(format!("prompt variables not serializable: {error}"))
        })?;

        let system = self.render_one(SYSTEM_TEMPLATE_NAME, &context)?;

        context.insert("task", task);
        let user = self.render_one(USER_TEMPLATE_NAME, &context)?;

        Ok(RenderedPrompt { system, user, variables })
    }

    fn render_one(&self, name: &str, context: &tera::Context) -> Result<String, PipelineError> {
        self.templates.render(name, context).map_err(|error| {
            PipelineError::Validation(format!("prompt template `{name}` failed to render: {error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PromptRenderer, PromptVariables};
    use crate::target::{ShellDialect, TargetEnvironment};

    fn variables() -> PromptVariables {
        PromptVariables::for_request(TargetEnvironment::Gam, ShellDialect::Bash)
    }

    #[test]
    fn rendering_substitutes_all_placeholders() {
        let renderer = PromptRenderer::new().expect("renderer");
        let rendered = renderer.render(variables(), "onboard user neil").expect("render");

        assert!(rendered.system.contains("bash scripts for Google Workspace (GAM)"));
        assert!(rendered.user.contains("Task: onboard user neil"));
        assert!(rendered.user.contains("Environment: gam"));
        assert!(rendered.user.contains("OS: unix"));
    }

    #[test]
    fn rendered_text_contains_no_placeholder_delimiters() {
        let renderer = PromptRenderer::new().expect("renderer");
        let rendered = renderer.render(variables(), "list suspended users").expect("render");

        for text in [&rendered.system, &rendered.user] {
            assert!(!text.contains("{{"), "unreplaced placeholder in: {text}");
            assert!(!text.contains("}}"), "unreplaced placeholder in: {text}");
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = PromptRenderer::new().expect("renderer");
        let first = renderer.render(variables(), "reset password").expect("render");
        let second = renderer.render(variables(), "reset password").expect("render");
        assert_eq!(first, second);
    }

    #[test]
    fn variables_track_environment_and_shell() {
        let vars = PromptVariables::for_request(TargetEnvironment::M365, ShellDialect::PowerShell);
        assert_eq!(vars.environment_id, "m365");
        assert_eq!(vars.shell_label, "PowerShell");
        assert_eq!(vars.os_label, "windows");
    }
}
