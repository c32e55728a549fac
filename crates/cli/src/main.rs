use std::process::ExitCode;

fn main() -> ExitCode {
    opsgen_cli::run()
}
