//! Command implementations: wire infra adapters into the core controllers

pub mod apply;
pub mod learn;

use std::sync::Arc;

use anyhow::Context;
use statsampler_domain::Config;
use statsampler_infra::PostgresSession;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Open the single session a run owns.
async fn connect(config: &Config) -> anyhow::Result<Arc<PostgresSession>> {
    let session = PostgresSession::connect(&config.database).await.with_context(|| {
        format!(
            "connecting to {}:{}/{}",
            config.database.host, config.database.port, config.database.dbname
        )
    })?;
    Ok(Arc::new(session))
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current table");
            token.cancel();
        }
    })
}
