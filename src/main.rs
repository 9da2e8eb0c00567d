use clap::Parser;
use dirsort::cli::{Args, run_cli};
use dirsort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = args.log_level.as_deref().unwrap_or("warn");
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if let Some(level) = &args.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    match run_cli(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
