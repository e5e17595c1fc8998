//! Job State Store - composition root.
//!
//! Loads partition configuration, sets up logging, opens a `Store` for one
//! partition directory, registers a logging `Notifier` callback, and exits.
//! Scheduling, worker pools, and RPC surfaces are out of scope here - they
//! belong to external collaborators this store hands control back to.

mod config;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobstate_core::metrics::AtomicMetricsSink;
use jobstate_infra_rocks::Store;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_logging(log_format: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("jobstate=info"))
        .expect("failed to build env filter");

    match log_format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cfg = config::PartitionConfig::load()?;
    init_logging(&cfg.log_format);

    info!(version = VERSION, "job state store starting");

    let partition_dir = cfg.resolved_dir();
    std::fs::create_dir_all(&partition_dir)?;
    info!(partition_dir = %partition_dir.display(), "opening partition");

    let metrics = Arc::new(AtomicMetricsSink::new());
    let store = Store::open(&partition_dir, cfg.memory_budget_bytes(), metrics.clone())?;

    store.notifier().set_callback(Some(Box::new(|job_type: &str| {
        info!(job_type, "job type has new activatable work");
    })));

    info!("partition ready");
    store.close()?;
    info!("partition closed, exiting");

    Ok(())
}
