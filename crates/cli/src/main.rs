use std::process::ExitCode;

fn main() -> ExitCode {
    shopmetrics_cli::run()
}
