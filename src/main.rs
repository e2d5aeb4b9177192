//! tc-image-migrate CLI entry point.

use clap::Parser;

use tc_image_migrate::cli::Cli;
use tc_image_migrate::infrastructure::config::ConfigLoader;
use tc_image_migrate::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = tc_image_migrate::cli::usage_exit_code(&err);
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    let logger = match LogConfig::from_settings(&config.logging).and_then(|c| LoggerImpl::init(&c)) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Error: failed to initialize logging: {err:#}");
            std::process::exit(1);
        }
    };

    let code = match tc_image_migrate::cli::execute(&cli, &config).await {
        Ok(outcome) => {
            tc_image_migrate::cli::report(&outcome, cli.json);
            0
        }
        Err(err) => tc_image_migrate::cli::handle_error(&err, cli.json),
    };

    // process::exit skips destructors; flush the file writer first
    drop(logger);
    std::process::exit(code);
}
