mod cli;

use clap::Parser;
use cli::Cli;
use stdin_rotate::config::Config;
use stdin_rotate::shutdown::termination_signal;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout is left alone; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.clone(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    info!(
        output = %config.output.path.display(),
        max_size = %config.output.max_size,
        max_files = config.output.max_files,
        compress = config.output.compress,
        "stdin-rotate starting"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let code = match stdin_rotate::run(config, stdin, termination_signal()).await {
        Ok(_) => 0,
        Err(e) => {
            error!(error = %e, "stdin-rotate failed");
            1
        }
    };

    // A blocked stdin read would otherwise keep the runtime alive
    std::process::exit(code);
}
