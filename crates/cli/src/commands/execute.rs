use std::io::{self, BufRead, Write};

use opsgen_engine::{ExecutionGate, ExecutionResult, CONFIRMATION_LITERAL};

use super::CommandResult;

pub fn run(file: &str) -> CommandResult {
    let script = match std::fs::read_to_string(file) {
        Ok(script) => script,
        Err(error) => {
            return CommandResult::failure(
                "execute",
                "read_file",
                format!("could not read `{file}`: {error}"),
                2,
            );
        }
    };

    if script.trim().is_empty() {
        return CommandResult::failure("execute", "validation", "script file is empty", 2);
    }

    eprintln!("About to run the following script with YOUR privileges:");
    eprintln!("---\n{}\n---", script.trim_end());
    eprint!("Type `{CONFIRMATION_LITERAL}` to proceed: ");
    let _ = io::stderr().flush();

    let mut confirmation = String::new();
    if io::stdin().lock().read_line(&mut confirmation).is_err() {
        return CommandResult::failure("execute", "confirmation", "could not read confirmation", 2);
    }
    // Only the line terminator is stripped; the token itself must match
    // exactly, trailing spaces included.
    let confirmation = confirmation.trim_end_matches(['\r', '\n']);

    let result = match run_gate(&script, confirmation) {
        Ok(result) => result,
        Err(result) => return result,
    };

    for chunk in &result.stdout {
        print!("{chunk}");
    }
    for chunk in &result.stderr {
        eprint!("{chunk}");
    }

    let exit_code = u8::try_from(result.status).unwrap_or(1);
    CommandResult {
        exit_code,
        output: format!("script exited with status {}", result.status),
    }
}

fn run_gate(script: &str, confirmation: &str) -> Result<ExecutionResult, CommandResult> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| {
            CommandResult::failure(
                "execute",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                2,
            )
        })?;

    runtime.block_on(async {
        ExecutionGate::new().execute(script, confirmation).await.map_err(|error| {
            let exit_code = if error.kind() == "confirmation_mismatch" { 3 } else { 2 };
            CommandResult::failure("execute", error.kind(), error.to_string(), exit_code)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn missing_file_is_a_read_failure() {
        let result = run("does/not/exist.sh");
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("read_file"));
    }

    #[test]
    fn empty_script_file_fails_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.sh");
        std::fs::write(&path, "  \n").expect("write script");

        let result = run(path.to_str().expect("utf8 path"));
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("validation"));
    }
}
