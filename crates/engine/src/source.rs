use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use opsgen_core::config::GenerationConfig;
use opsgen_core::PipelineError;

use crate::request::GenerationRequest;

/// Where generation responses come from. Two implementations: a live
/// Responses API call and a frozen fixture. Selecting the source is an
/// all-or-nothing switch — there is no partial substitution.
#[async_trait]
pub trait GenerationSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<Value, PipelineError>;
}

/// Live OpenAI Responses API client. Configuration is passed in at
/// construction; nothing is read from process-wide state at call time.
pub struct OpenAiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiSource {
    pub fn new(config: &GenerationConfig) -> Result<Self, PipelineError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PipelineError::Validation("generation.api_key is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| PipelineError::Service(format!("http client build failed: {error}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/responses", self.base_url)
    }
}

#[async_trait]
impl GenerationSource for OpenAiSource {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Value, PipelineError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|error| PipelineError::Service(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Service(format!(
                "generation service returned {status}: {detail}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| PipelineError::Service(format!("response body unreadable: {error}")))
    }
}

static FIXTURE_RESPONSE: OnceLock<Value> = OnceLock::new();

/// Frozen, version-pinned response captured from a real run. Returned
/// byte-identically on every call so the pipeline is deterministic without
/// live credentials. Read-only after first parse; callers must not mutate
/// the shared value.
pub struct FixtureSource;

impl FixtureSource {
    pub fn response() -> &'static Value {
        FIXTURE_RESPONSE.get_or_init(|| {
            serde_json::from_str(include_str!("fixtures/gam_onboard_response.json"))
                .expect("embedded fixture response is valid JSON")
        })
    }
}

#[async_trait]
impl GenerationSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<Value, PipelineError> {
        Ok(Self::response().clone())
    }
}
