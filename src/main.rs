use std::process::ExitCode;

use clap::Parser;
use db_backup_lib::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    env_logger.try_init().expect("env_logger should not fail");

    match db_backup_lib::run(&cli) {
        Ok(link) => {
            log::info!("Backup process completed successfully: {link}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Backup process failed: {e}");
            println!("Backup process failed: {e}");
            ExitCode::FAILURE
        }
    }
}
