use actbench::cli::{execute_command, get_log_level, Cli};
use actbench::config::ConfigLoader;
use clap::Parser;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Until the configured level is known, loader diagnostics go through a
    // subscriber scoped to this thread that honours RUST_LOG and -v only
    let provisional = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(get_log_level(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .finish();
    let loading = tracing::subscriber::set_default(provisional);
    let config = match ConfigLoader::load(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    drop(loading);

    // -v flags win over the configured level; RUST_LOG wins over both
    let log_level = if cli.verbose > 0 {
        get_log_level(cli.verbose).to_string()
    } else {
        config.log_level.clone()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2) // Show target module for -vv and above
        .with_thread_ids(cli.verbose >= 3) // Show thread IDs for -vvv
        .with_line_number(cli.verbose >= 3) // Show line numbers for -vvv
        .init();

    debug!("actbench started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = execute_command(cli, config).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
