//! JSON API for the generation/execution pipeline.
//!
//! - `POST /generate` — build a grammar-constrained request and return the
//!   extracted script (empty script = extraction miss, still 200).
//! - `POST /execute`  — run a reviewed script locally, gated behind the
//!   exact confirmation literal.
//! - `POST /save`     — persist script text under the configured scripts
//!   directory with a sanitized file name.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use opsgen_core::{PipelineError, PromptVariables, TargetEnvironment};
use opsgen_engine::ExecutionResult;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub env: String,
    pub task: String,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub script: String,
    pub text: String,
    pub environment: TargetEnvironment,
    pub tool_name: String,
    pub variables: PromptVariables,
    pub dry_run: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub shell_script: String,
    pub confirm_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub filename: String,
    pub contents: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    pub message: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/execute", post(execute))
        .route("/save", post(save))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    let correlation_id = Uuid::new_v4().to_string();

    let environment: TargetEnvironment =
        body.env.parse().map_err(|error| reject(error, &correlation_id))?;

    let task = body.task.trim();
    if task.is_empty() {
        return Err(reject(
            PipelineError::Validation("task must not be empty".to_string()),
            &correlation_id,
        ));
    }

    let generated = state
        .generator
        .generate(environment, task)
        .await
        .map_err(|error| reject(error, &correlation_id))?;

    info!(
        event_name = "api.generate.completed",
        correlation_id = %correlation_id,
        environment = %environment,
        miss = generated.is_miss(),
        "generate request served"
    );

    Ok(Json(GenerateResponse {
        script: generated.script,
        text: generated.text,
        environment,
        tool_name: generated.tool_name,
        variables: generated.variables,
        dry_run: body.dry_run,
    }))
}

pub async fn execute(
    State(state): State<AppState>,
    Json(body): Json<ExecuteRequest>,
) -> ApiResult<ExecutionResult> {
    let correlation_id = Uuid::new_v4().to_string();

    if body.shell_script.trim().is_empty() {
        return Err(reject(
            PipelineError::Validation("shell_script must not be empty".to_string()),
            &correlation_id,
        ));
    }

    let result = state
        .gate
        .execute(&body.shell_script, &body.confirm_token)
        .await
        .map_err(|error| reject(error, &correlation_id))?;

    info!(
        event_name = "api.execute.completed",
        correlation_id = %correlation_id,
        status = result.status,
        "execute request served"
    );

    Ok(Json(result))
}

pub async fn save(
    State(state): State<AppState>,
    Json(body): Json<SaveRequest>,
) -> ApiResult<SaveResponse> {
    let correlation_id = Uuid::new_v4().to_string();

    if body.filename.trim().is_empty() {
        return Err(reject(
            PipelineError::Validation("filename must not be empty".to_string()),
            &correlation_id,
        ));
    }

    // Collapse anything path-like into `_`; saved scripts always land
    // directly in the configured directory.
    let safe_name: String = body
        .filename
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') { ch } else { '_' })
        .collect();

    let dir = state.config.scripts.dir.clone();
    let path = dir.join(&safe_name);

    let write_result = async {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&path, &body.contents).await
    }
    .await;

    if let Err(io_error) = write_result {
        error!(
            event_name = "api.save.failed",
            correlation_id = %correlation_id,
            path = %path.display(),
            error = %io_error,
            "could not write script file"
        );
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: "io",
                message: "The script could not be saved.".to_string(),
                correlation_id,
            }),
        ));
    }

    info!(
        event_name = "api.save.completed",
        correlation_id = %correlation_id,
        path = %path.display(),
        "script saved"
    );

    Ok(Json(SaveResponse { path: path.display().to_string() }))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::GrammarNotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        PipelineError::Service(_) => StatusCode::BAD_GATEWAY,
        PipelineError::ConfirmationMismatch => StatusCode::PRECONDITION_FAILED,
        PipelineError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(pipeline_error: PipelineError, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&pipeline_error);

    error!(
        event_name = "api.request.rejected",
        correlation_id = %correlation_id,
        kind = pipeline_error.kind(),
        detail = %pipeline_error,
        "request rejected"
    );

    (
        status,
        Json(ApiError {
            error: pipeline_error.kind(),
            message: pipeline_error.user_message().to_string(),
            correlation_id: correlation_id.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use opsgen_core::config::AppConfig;

    use super::{execute, generate, save, ExecuteRequest, GenerateRequest, SaveRequest};
    use crate::{build_state, AppState};

    pub fn fixture_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("gam.lark"), "start: command\n").expect("write gam");
        std::fs::write(dir.path().join("m365.lark"), "start: command\n").expect("write m365");

        let mut config = AppConfig::default();
        config.generation.use_fixture = true;
        config.grammars.dir = dir.path().to_path_buf();
        config.scripts.dir = dir.path().join("scripts");

        let state = build_state(config).expect("state should build");
        (dir, state)
    }

    #[tokio::test]
    async fn generate_returns_fixture_script() {
        let (_dir, state) = fixture_state();

        let Json(payload) = generate(
            State(state),
            Json(GenerateRequest {
                env: "gam".to_string(),
                task: "onboard neil".to_string(),
                dry_run: true,
            }),
        )
        .await
        .expect("generate should succeed");

        assert!(payload.script.starts_with("gam create user"));
        assert_eq!(payload.tool_name, "execute_gam");
        assert_eq!(payload.variables.environment_id, "gam");
    }

    #[tokio::test]
    async fn generate_rejects_unknown_environment() {
        let (_dir, state) = fixture_state();

        let (status, Json(body)) = generate(
            State(state),
            Json(GenerateRequest {
                env: "azure".to_string(),
                task: "do things".to_string(),
                dry_run: true,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation");
    }

    #[tokio::test]
    async fn generate_rejects_blank_task() {
        let (_dir, state) = fixture_state();

        let (status, _) = generate(
            State(state),
            Json(GenerateRequest {
                env: "gam".to_string(),
                task: "   ".to_string(),
                dry_run: true,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn execute_without_exact_token_is_precondition_failed() {
        let (_dir, state) = fixture_state();

        let (status, Json(body)) = execute(
            State(state),
            Json(ExecuteRequest {
                shell_script: "echo hi".to_string(),
                confirm_token: "I confirm".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body.error, "confirmation_mismatch");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn execute_runs_confirmed_script() {
        let (_dir, state) = fixture_state();

        let Json(result) = execute(
            State(state),
            Json(ExecuteRequest {
                shell_script: "echo ran".to_string(),
                confirm_token: opsgen_engine::CONFIRMATION_LITERAL.to_string(),
            }),
        )
        .await
        .expect("execute should succeed");

        assert_eq!(result.status, 0);
        assert_eq!(result.stdout.concat(), "ran\n");
    }

    #[tokio::test]
    async fn save_sanitizes_path_traversal() {
        let (dir, state) = fixture_state();

        let Json(saved) = save(
            State(state),
            Json(SaveRequest {
                filename: "../../etc/passwd".to_string(),
                contents: "echo nope".to_string(),
            }),
        )
        .await
        .expect("save should succeed");

        assert!(saved.path.ends_with(".._.._etc_passwd"));
        let written = dir.path().join("scripts").join(".._.._etc_passwd");
        assert_eq!(std::fs::read_to_string(written).expect("read saved"), "echo nope");
    }

    #[tokio::test]
    async fn save_rejects_blank_filename() {
        let (_dir, state) = fixture_state();

        let (status, _) = save(
            State(state),
            Json(SaveRequest { filename: "  ".to_string(), contents: String::new() }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
