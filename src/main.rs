//! Specforge CLI entry point.

use clap::Parser;

use specforge::cli::{commands, handle_error, Cli, Commands};
use specforge::infrastructure::config::ConfigLoader;
use specforge::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger_guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run {
            spec,
            target,
            max_iterations,
            package,
            offline,
        } => {
            commands::run::execute(
                commands::run::RunParams {
                    spec_path: spec,
                    target,
                    max_iterations,
                    package,
                    offline,
                },
                config,
                cli.json,
            )
            .await
        }
        Commands::Score {
            directory,
            framework,
        } => commands::score::execute(directory, framework, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
