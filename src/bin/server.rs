//! hackrbac REST API Server
//!
//! Run with: cargo run --features server --bin hackrbac-server
//!
//! Environment: HACKRBAC_DB, PORT, HACKRBAC_SESSION_TTL, RUST_LOG

use std::sync::Arc;

use hackrbac::server::{router, AppState};
use hackrbac::{AccessControl, ServerConfig, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&config.log_filter)).init();

    // Role tables are validated here; a bad grant stops startup.
    let acl = Arc::new(AccessControl::hackathon()?);
    info!(roles = ?acl.roles().names().collect::<Vec<_>>(), "access control loaded");

    info!(path = %config.db_path.display(), "opening store");
    let store = Store::open(&config.db_path)?;
    if !store.is_bootstrapped()? {
        info!("store is empty; POST /bootstrap to create the first admin");
    }
    let purged = store.purge_expired()?;
    if purged > 0 {
        info!(purged, "removed expired sessions");
    }

    let app = router(AppState::new(acl, store, config.session_ttl));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "hackrbac server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
