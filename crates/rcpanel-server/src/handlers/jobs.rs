//! Jobs page and job actions.

use super::SharedState;
use crate::context::Context;
use crate::error::PanelError;
use crate::views::{self, JOBS_LIST_ID};
use rcpanel_core::{JobConfig, JobSummary};
use tracing::{debug, info, warn};

pub(super) async fn page(state: SharedState, _ctx: Context) -> Result<String, PanelError> {
    let jobs = match state.client.list_jobs().await {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!("Failed to list jobs: {}", e);
            Vec::new()
        }
    };
    Ok(views::jobs_page(&jobs))
}

/// Patch the jobs list. With `?watch=true`, keep patching while any job is
/// still running and the browser is listening.
pub(super) async fn refresh(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    updates.set_error_region(JOBS_LIST_ID);
    let watch = ctx.query("watch") == "true";

    loop {
        if updates.is_closed() {
            debug!("jobs watcher: peer gone");
            return Ok(());
        }

        let jobs = state.client.list_jobs().await?;
        updates
            .patch_by_id(JOBS_LIST_ID, views::jobs_list(&jobs))
            .await?;

        if !watch || JobSummary::from_jobs(&jobs).pending == 0 {
            return Ok(());
        }
        tokio::time::sleep(JobConfig::DEFAULT_POLL_INTERVAL).await;
    }
}

pub(super) async fn stop(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    let raw = ctx.require_param("id")?;
    let id: i64 = raw
        .parse()
        .map_err(|_| PanelError::bad_request(format!("invalid job id: {}", raw)))?;
    updates.set_error_region(&format!("job-{}", id));

    state.client.stop_job(id).await?;
    info!("Stopped job {}", id);

    updates.set_error_region(JOBS_LIST_ID);
    let jobs = state.client.list_jobs().await?;
    updates
        .patch_by_id(JOBS_LIST_ID, views::jobs_list(&jobs))
        .await
}
