mod api;
mod health;

use std::sync::Arc;

use anyhow::Result;
use opsgen_core::config::{AppConfig, LoadOptions};
use opsgen_core::GrammarStore;
use opsgen_engine::{
    ExecutionGate, FixtureSource, GenerationSource, OpenAiSource, RequestBuilder, ScriptGenerator,
};

fn init_logging(config: &AppConfig) {
    use opsgen_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub grammars: GrammarStore,
    pub generator: ScriptGenerator,
    pub gate: ExecutionGate,
}

fn build_state(config: AppConfig) -> Result<AppState> {
    let grammars = GrammarStore::new(config.grammars.dir.clone());
    let builder = RequestBuilder::new(config.generation.model.clone(), grammars.clone())?;

    let source: Arc<dyn GenerationSource> = if config.generation.use_fixture {
        Arc::new(FixtureSource)
    } else {
        Arc::new(OpenAiSource::new(&config.generation)?)
    };

    Ok(AppState {
        config: Arc::new(config),
        grammars,
        generator: ScriptGenerator::new(builder, source),
        gate: ExecutionGate::new(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let state = build_state(config)?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        generation_source = state.generator.source_name(),
        "opsgen server starting"
    );

    let router = api::router(state.clone()).merge(health::router(state));
    let listener = tokio::net::TcpListener::bind(&address).await?;

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "opsgen server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    shutdown_on_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves when the signal future does. Registration failure must not
/// resolve this future: it drives graceful shutdown, and completing early
/// would stop the server right after startup. Log and stay pending instead.
async fn shutdown_on_signal(signal: impl std::future::Future<Output = std::io::Result<()>>) {
    if let Err(error) = signal.await {
        tracing::error!(
            event_name = "system.server.signal_unavailable",
            correlation_id = "shutdown",
            error = %error,
            "ctrl-c handler could not be installed; shutdown signal will not be observed"
        );
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::shutdown_on_signal;

    #[tokio::test]
    async fn shutdown_resolves_when_signal_arrives() {
        shutdown_on_signal(async { Ok(()) }).await;
    }

    #[tokio::test]
    async fn failed_signal_registration_does_not_trigger_shutdown() {
        let trigger = shutdown_on_signal(async {
            Err(io::Error::new(io::ErrorKind::Unsupported, "no signal driver"))
        });

        let outcome = tokio::time::timeout(Duration::from_millis(50), trigger).await;
        assert!(outcome.is_err(), "shutdown trigger must stay pending on registration failure");
    }
}
