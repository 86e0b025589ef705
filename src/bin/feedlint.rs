use std::process::ExitCode;

use feedlint::app::run_feedlint;

fn main() -> ExitCode {
    match run_feedlint(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("feedlint: {err}");
            ExitCode::FAILURE
        }
    }
}
