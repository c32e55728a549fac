use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use opsgen_core::{GrammarStore, TargetEnvironment};
use serde::Serialize;

use crate::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub grammars: HealthCheck,
    pub generation_source: &'static str,
    pub checked_at: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let grammars = grammar_check(&state.grammars).await;
    let ready = grammars.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "opsgen-server runtime initialized".to_string(),
        },
        grammars,
        generation_source: state.generator.source_name(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn grammar_check(store: &GrammarStore) -> HealthCheck {
    let mut missing = Vec::new();
    for environment in TargetEnvironment::ALL {
        if !store.exists(environment).await {
            missing.push(environment.identifier());
        }
    }

    if missing.is_empty() {
        HealthCheck {
            status: "ready",
            detail: format!("all grammars present under `{}`", store.root().display()),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: format!("missing grammar files for: {}", missing.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};

    use crate::api::tests::fixture_state;
    use crate::health::health;

    #[tokio::test]
    async fn health_is_ready_when_grammars_are_present() {
        let (_dir, state) = fixture_state();

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.grammars.status, "ready");
        assert_eq!(payload.generation_source, "fixture");
    }

    #[tokio::test]
    async fn health_degrades_when_a_grammar_is_missing() {
        let (dir, state) = fixture_state();
        std::fs::remove_file(dir.path().join("m365.lark")).expect("remove grammar");

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert!(payload.grammars.detail.contains("m365"));
    }
}
