//! # pi_server - Entry Point
//! src/main.rs
//!
//! Inicializa logging, configuración, store y manager, y arranca el servidor.

use pi_server::config::{Config, StoreKind};
use pi_server::jobs::{FileJobStore, JobManager, JobManagerConfig, JobStore, MemoryJobStore};
use pi_server::server::Server;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::new();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        process::exit(1);
    }
    config.log_summary();

    let store: Arc<dyn JobStore> = match config.store {
        StoreKind::Memory => Arc::new(MemoryJobStore::new()),
        StoreKind::File => match FileJobStore::open(&config.jobs_storage_path) {
            Ok(store) => {
                tracing::info!(path = %config.jobs_storage_path, jobs = store.len(), "Job store loaded");
                match store.fail_interrupted() {
                    Ok(0) => {}
                    Ok(n) => tracing::warn!(jobs = n, "Unfinished jobs from a previous run marked FAILED"),
                    Err(e) => tracing::warn!(error = %e, "Cannot mark interrupted jobs"),
                }
                Arc::new(store)
            }
            Err(e) => {
                tracing::error!(path = %config.jobs_storage_path, error = %e, "Cannot open job store");
                process::exit(1);
            }
        },
    };

    let manager = Arc::new(JobManager::new(JobManagerConfig::from_config(&config), store));

    let server = match Server::bind(&config, manager) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(address = %config.address(), error = %e, "Cannot bind");
            process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!(error = %e, "Fatal server error");
        process::exit(1);
    }
}
