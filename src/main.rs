use std::process::ExitCode;

fn main() -> ExitCode {
    webfootprint_lib::run()
}
