pub mod config;
pub mod errors;
pub mod grammar;
pub mod prompt;
pub mod target;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use errors::PipelineError;
pub use grammar::GrammarStore;
pub use prompt::{PromptRenderer, PromptVariables, RenderedPrompt};
pub use target::{ShellDialect, TargetEnvironment};
