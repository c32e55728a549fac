use opsgen_core::config::{AppConfig, LoadOptions};
use opsgen_core::{GrammarStore, TargetEnvironment};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_grammar_presence(&config));
            checks.push(check_generation_readiness(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "grammar_presence",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "generation_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_grammar_presence(config: &AppConfig) -> DoctorCheck {
    let store = GrammarStore::new(config.grammars.dir.clone());
    let missing: Vec<&str> = TargetEnvironment::ALL
        .iter()
        .filter(|environment| !store.path_for(**environment).is_file())
        .map(|environment| environment.identifier())
        .collect();

    if missing.is_empty() {
        DoctorCheck {
            name: "grammar_presence",
            status: CheckStatus::Pass,
            details: format!("all grammars present under `{}`", store.root().display()),
        }
    } else {
        DoctorCheck {
            name: "grammar_presence",
            status: CheckStatus::Fail,
            details: format!("missing grammar files for: {}", missing.join(", ")),
        }
    }
}

fn check_generation_readiness(config: &AppConfig) -> DoctorCheck {
    if config.generation.use_fixture {
        return DoctorCheck {
            name: "generation_readiness",
            status: CheckStatus::Pass,
            details: "fixture mode: no live credentials required".to_string(),
        };
    }

    let has_key = config
        .generation
        .api_key
        .as_ref()
        .map(|key| !key.expose_secret().trim().is_empty())
        .unwrap_or(false);

    if has_key {
        DoctorCheck {
            name: "generation_readiness",
            status: CheckStatus::Pass,
            details: format!("live mode against `{}`", config.generation.base_url),
        }
    } else {
        DoctorCheck {
            name: "generation_readiness",
            status: CheckStatus::Fail,
            details: "live mode without an api key; set OPSGEN_API_KEY or enable fixture mode"
                .to_string(),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
