use std::sync::Arc;

use opsgen_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use opsgen_core::{GrammarStore, TargetEnvironment};
use opsgen_engine::{
    FixtureSource, GeneratedScript, GenerationSource, OpenAiSource, RequestBuilder,
    ScriptGenerator,
};

use super::CommandResult;

pub fn run(env: &str, task: &str, fixture: bool) -> CommandResult {
    let environment: TargetEnvironment = match env.parse() {
        Ok(environment) => environment,
        Err(error) => return CommandResult::failure("generate", "validation", error.to_string(), 2),
    };

    if task.trim().is_empty() {
        return CommandResult::failure("generate", "validation", "task must not be empty", 2);
    }

    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides {
            use_fixture: fixture.then_some(true),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("generate", "config", error.to_string(), 2),
    };

    let generated = match run_pipeline(&config, environment, task.trim()) {
        Ok(generated) => generated,
        Err(result) => return result,
    };

    if generated.is_miss() {
        let message = if generated.text.is_empty() {
            "the service produced no tool call and no text; retry with a clearer task".to_string()
        } else {
            format!("no script was produced; service said: {}", generated.text)
        };
        return CommandResult::failure("generate", "extraction_miss", message, 1);
    }

    if !generated.text.is_empty() {
        eprintln!("{}", generated.text);
    }

    // Plain script on stdout so the output can be piped or redirected.
    CommandResult { exit_code: 0, output: generated.script }
}

fn run_pipeline(
    config: &AppConfig,
    environment: TargetEnvironment,
    task: &str,
) -> Result<GeneratedScript, CommandResult> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| {
            CommandResult::failure(
                "generate",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                2,
            )
        })?;

    runtime.block_on(async {
        let grammars = GrammarStore::new(config.grammars.dir.clone());
        let builder = RequestBuilder::new(config.generation.model.clone(), grammars)
            .map_err(|error| {
                CommandResult::failure("generate", error.kind(), error.to_string(), 2)
            })?;

        let source: Arc<dyn GenerationSource> = if config.generation.use_fixture {
            Arc::new(FixtureSource)
        } else {
            Arc::new(OpenAiSource::new(&config.generation).map_err(|error| {
                CommandResult::failure("generate", error.kind(), error.to_string(), 2)
            })?)
        };

        ScriptGenerator::new(builder, source)
            .generate(environment, task)
            .await
            .map_err(|error| {
                CommandResult::failure("generate", error.kind(), error.to_string(), 2)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn unknown_environment_fails_validation() {
        let result = run("azure", "do something", true);
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("validation"));
    }

    #[test]
    fn blank_task_fails_validation() {
        let result = run("gam", "   ", true);
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("task must not be empty"));
    }
}
