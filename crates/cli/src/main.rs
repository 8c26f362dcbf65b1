use std::process::ExitCode;

fn main() -> ExitCode {
    lightquote_cli::run()
}
