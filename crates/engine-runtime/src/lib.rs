pub mod error;
pub mod factory;
pub mod remote;
pub mod server;
pub mod sync;

#[cfg(test)]
mod tests;

use crate::{error::SyncError, factory::pull_settings};
use engine_config::settings::{Settings, file::SyncMode};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runs the configured mode until `cancel` fires or the push loop fails on
/// its first cycle.
pub async fn run(settings: &Settings, cancel: CancellationToken) -> Result<(), SyncError> {
    match settings.mode {
        SyncMode::Push => {
            info!(source = %settings.source.kind, "Starting push mode");
            factory::create_sync_loop(settings)?.run(cancel).await
        }
        SyncMode::Pull => {
            info!(source = %settings.source.kind, "Starting pull mode");
            let router = factory::create_router(settings)?;
            server::serve(&pull_settings(settings)?.bind_addr, router, cancel).await
        }
    }
}
