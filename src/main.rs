use std::process::ExitCode;

fn main() -> ExitCode {
    match satbench::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(satbench::error::AppError::Clap { source }) => {
            if source.print().is_err() {
                eprintln!("{}", source);
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
