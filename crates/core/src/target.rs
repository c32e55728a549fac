use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Admin tool a generated script targets. Each environment carries its own
/// tool name and grammar resource; the shell dialect is a property of the
/// host, not of the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetEnvironment {
    /// Google Workspace via the GAM command-line tool.
    Gam,
    /// Microsoft 365 via the m365 CLI.
    M365,
}

impl TargetEnvironment {
    pub const ALL: [TargetEnvironment; 2] = [TargetEnvironment::Gam, TargetEnvironment::M365];

    pub fn identifier(self) -> &'static str {
        match self {
            Self::Gam => "gam",
            Self::M365 => "m365",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Gam => "Google Workspace (GAM)",
            Self::M365 => "Microsoft 365 CLI",
        }
    }

    /// Tool name declared to the generation service. Unique per environment.
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::Gam => "execute_gam",
            Self::M365 => "execute_m365",
        }
    }

    /// File name of the grammar resource under the configured grammar dir.
    pub fn grammar_file(self) -> &'static str {
        match self {
            Self::Gam => "gam.lark",
            Self::M365 => "m365.lark",
        }
    }
}

impl std::str::FromStr for TargetEnvironment {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gam" => Ok(Self::Gam),
            "m365" => Ok(Self::M365),
            other => Err(PipelineError::Validation(format!(
                "unsupported target environment `{other}` (expected gam|m365)"
            ))),
        }
    }
}

impl std::fmt::Display for TargetEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Shell the generated script is written for and executed with. Selected by
/// host platform family only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellDialect {
    Bash,
    PowerShell,
}

impl ShellDialect {
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Bash
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::PowerShell => "PowerShell",
        }
    }

    pub fn os_label(self) -> &'static str {
        match self {
            Self::Bash => "unix",
            Self::PowerShell => "windows",
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::PowerShell => "powershell.exe",
        }
    }

    /// Argument vector that runs `script` as a single inline command.
    pub fn inline_args(self, script: &str) -> Vec<String> {
        match self {
            Self::Bash => vec!["-lc".to_string(), script.to_string()],
            Self::PowerShell => vec![
                "-NoProfile".to_string(),
                "-NonInteractive".to_string(),
                "-Command".to_string(),
                script.to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ShellDialect, TargetEnvironment};

    #[test]
    fn environment_parses_known_identifiers() {
        assert_eq!("gam".parse::<TargetEnvironment>().unwrap(), TargetEnvironment::Gam);
        assert_eq!(" M365 ".parse::<TargetEnvironment>().unwrap(), TargetEnvironment::M365);
    }

    #[test]
    fn environment_rejects_unknown_identifier() {
        let error = "azure".parse::<TargetEnvironment>().unwrap_err();
        assert!(error.to_string().contains("unsupported target environment"));
    }

    #[test]
    fn tool_names_are_unique_per_environment() {
        let mut names: Vec<&str> =
            TargetEnvironment::ALL.iter().map(|env| env.tool_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TargetEnvironment::ALL.len());
    }

    #[test]
    fn bash_runs_script_as_single_inline_command() {
        let args = ShellDialect::Bash.inline_args("echo ok");
        assert_eq!(args, vec!["-lc".to_string(), "echo ok".to_string()]);
    }

    #[test]
    fn powershell_runs_non_interactive() {
        let args = ShellDialect::PowerShell.inline_args("Write-Host ok");
        assert!(args.contains(&"-NonInteractive".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("Write-Host ok"));
    }
}
