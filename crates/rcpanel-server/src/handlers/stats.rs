//! Stats page and live stats stream.

use super::SharedState;
use crate::config::ServerConfig;
use crate::context::Context;
use crate::error::PanelError;
use crate::views::{self, STATS_CONTENT_ID};
use rcpanel_core::{StatsSnapshot, VersionInfo};
use serde_json::json;
use tracing::{debug, warn};

/// Stats and version, each falling back to defaults when unavailable.
async fn snapshot(state: &SharedState) -> (StatsSnapshot, VersionInfo) {
    let stats = state.client.stats().await.unwrap_or_else(|e| {
        warn!("Failed to read stats: {}", e);
        StatsSnapshot::default()
    });
    let version = state.client.version().await.unwrap_or_else(|e| {
        warn!("Failed to read version: {}", e);
        VersionInfo::default()
    });
    (stats, version)
}

pub(super) async fn page(state: SharedState, _ctx: Context) -> Result<String, PanelError> {
    let (stats, version) = snapshot(&state).await;
    Ok(views::stats_page(&stats, &version))
}

pub(super) async fn refresh(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    let (stats, version) = snapshot(&state).await;
    updates
        .patch_by_id(STATS_CONTENT_ID, views::stats_content(&stats, &version))
        .await
}

/// Re-render stats every poll interval until the browser disconnects. Each
/// tick also publishes the raw numbers as the `stats` signal.
pub(super) async fn stream(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    updates.set_error_region(STATS_CONTENT_ID);
    let version = state.client.version().await.unwrap_or_default();

    let mut ticks = tokio::time::interval(ServerConfig::STATS_POLL_INTERVAL);
    loop {
        ticks.tick().await;
        if updates.is_closed() {
            debug!("stats stream: peer gone");
            return Ok(());
        }

        let stats = state.client.stats().await?;
        updates
            .patch_by_id(STATS_CONTENT_ID, views::stats_content(&stats, &version))
            .await?;
        updates.patch_signals(&json!({ "stats": stats })).await?;
    }
}
