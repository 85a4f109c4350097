//! pkgorder - Install ordering for package transactions

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = pkgorder::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
