mod cli;
mod commands;

use std::process::ExitCode;
use std::sync::Arc;

use pplx_client::{ChatService, FileStore, HttpTransport};
use pplx_common::ConfigError;
use pplx_config::schema::PplxConfig;
use pplx_config::validation;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn load_config(args: &cli::Args) -> (PplxConfig, Option<ConfigError>) {
    match pplx_config::load_config(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (PplxConfig::default(), Some(e)),
    }
}

fn init_tracing(args: &cli::Args, config: &PplxConfig) {
    let directive = args
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_directive());
    let filter = EnvFilter::from_default_env();
    let filter = match directive.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(e) => {
            eprintln!("ignoring invalid log level {directive:?}: {e}");
            filter.add_directive(LevelFilter::INFO.into())
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let (config, load_error) = load_config(&args);
    init_tracing(&args, &config);

    tracing::info!("pplx v{} starting", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) => tracing::warn!("config load failed, using defaults: {e}"),
        None => {
            if let Err(e) = validation::validate(&config) {
                tracing::warn!("config validation warning: {e}");
            }
        }
    }

    let Some(data_dir) = config.storage.resolve_data_dir() else {
        tracing::error!("no data directory available");
        eprintln!("error: no data directory available; set [storage].data_dir");
        return ExitCode::FAILURE;
    };
    tracing::debug!("data directory: {}", data_dir.display());

    let storage = Arc::new(FileStore::open(data_dir));
    let transport = Arc::new(HttpTransport::new(&config.service));
    let service = ChatService::from_config(&config, storage, transport);

    let result = commands::run(&service, args.command()).await;
    service.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
