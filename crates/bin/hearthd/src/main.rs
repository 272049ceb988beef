//! # hearthd — hearth daemon
//!
//! Composition root that wires the substrate together and runs it.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env var overrides)
//! - Initialize tracing
//! - Initialize the `SQLite` pool and run migrations
//! - Construct the module gateway and the keyval service
//! - Run module initialization (draining any queued cross-module calls)
//! - Wait for shutdown (SIGINT)
//!
//! Feature modules (devices, scenes, bots, casting, smart-home bridges) and
//! their transports register against the gateway here; none ship with the
//! substrate itself.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use hearth_adapter_storage_sqlite_sqlx::SqliteKeyValStore;
use hearth_app::gateway::ModuleGateway;
use hearth_app::keyval::KeyVal;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(
            &config.logging.filter,
        )?)
        .init();

    // Database
    let db = hearth_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let store = SqliteKeyValStore::new(db.pool().clone());

    // Substrate
    let gateway = Arc::new(ModuleGateway::new());
    let keyval = KeyVal::new(Arc::clone(&gateway), store, config.group_config()?);
    keyval.init(&config.aggregates).await?;

    tracing::info!(
        aggregates = config.aggregates.len(),
        groups = config.groups.len(),
        "hearthd substrate ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    Ok(())
}
