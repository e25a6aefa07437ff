//! Route handlers for the panel, grouped by page.

mod jobs;
mod remotes;
mod stats;

use crate::context::Context;
use crate::error::PanelError;
use crate::router::PanelRouter;
use crate::server::AppState;
use rcpanel_core::{JobSummary, VersionInfo};
use serde_json::{json, Value};
use std::sync::Arc;

pub type SharedState = Arc<AppState>;

/// Every route the panel serves.
pub fn routes(state: SharedState) -> PanelRouter<SharedState> {
    PanelRouter::new(state)
        // Pages
        .page("/", remotes::page)
        .page("/jobs", jobs::page)
        .page("/stats", stats::page)
        // Remotes
        .get("/api/remotes/refresh", remotes::refresh)
        .get("/api/remotes/{name}/browse", remotes::browse)
        .delete("/api/remotes/{name}", remotes::delete)
        .post("/api/remotes/{name}/mkdir", remotes::mkdir)
        .delete("/api/remotes/{name}/entry", remotes::delete_entry)
        .post("/api/transfers", remotes::start_transfer)
        // Jobs
        .get("/api/jobs/refresh", jobs::refresh)
        .post("/api/jobs/{id}/stop", jobs::stop)
        // Stats
        .get("/api/stats/refresh", stats::refresh)
        .get("/api/stats/stream", stats::stream)
        // JSON
        .json("/health", health)
        .json("/api/version", version)
        .json("/api/jobs/summary", job_summary)
}

async fn health(_state: SharedState, _ctx: Context) -> Result<Value, PanelError> {
    Ok(json!({"status": "ok"}))
}

async fn version(state: SharedState, _ctx: Context) -> Result<VersionInfo, PanelError> {
    Ok(state.client.version().await?)
}

async fn job_summary(state: SharedState, _ctx: Context) -> Result<JobSummary, PanelError> {
    Ok(state.jobs.summary().await?)
}
