use std::process::ExitCode;

fn main() -> ExitCode {
    varsub_cli::run()
}
