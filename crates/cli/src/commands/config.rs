use opsgen_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let api_key = config
        .generation
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());

    let lines = vec![
        "effective config (source precedence: overrides > env > file > default):".to_string(),
        render_line("generation.api_key", &api_key),
        render_line("generation.base_url", &config.generation.base_url),
        render_line("generation.model", &config.generation.model),
        render_line("generation.timeout_secs", &config.generation.timeout_secs.to_string()),
        render_line("generation.use_fixture", &config.generation.use_fixture.to_string()),
        render_line("grammars.dir", &config.grammars.dir.display().to_string()),
        render_line("scripts.dir", &config.scripts.dir.display().to_string()),
        render_line("server.bind_address", &config.server.bind_address),
        render_line("server.port", &config.server.port.to_string()),
        render_line(
            "server.graceful_shutdown_secs",
            &config.server.graceful_shutdown_secs.to_string(),
        ),
        render_line("logging.level", &config.logging.level),
        render_line("logging.format", &format!("{:?}", config.logging.format).to_lowercase()),
    ];

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("- {key} = {value}")
}

fn redact_secret(value: &str) -> String {
    if value.len() <= 6 {
        return "***".to_string();
    }
    format!("{}***", &value[..6])
}

#[cfg(test)]
mod tests {
    use super::redact_secret;

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(redact_secret("sk-1"), "***");
    }

    #[test]
    fn long_secrets_keep_only_a_prefix() {
        assert_eq!(redact_secret("sk-proj-abcdef123456"), "sk-pro***");
    }
}
