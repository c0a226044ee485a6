use clap::Parser;
use fmn_rules::cli::{Cli, handle_command};
use fmn_rules::config::load_config;
use fmn_rules::logger::setup_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load config first to get log level
    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(2);
        }
    };

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Keep the guard alive to ensure log messages are flushed
    let guard = match setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    tracing::debug!("Using pkgdb at {}", config.pkgdb.url);

    let result = handle_command(cli.command, &config).await;
    if let Err(e) = &result {
        tracing::error!("Rule evaluation failed: {}", e);
        eprintln!("Error: {}", e);
    }

    // exit() skips destructors, flush the file writer first
    drop(guard);
    if result.is_err() {
        std::process::exit(1);
    }
}
