//! Remotes page, file browser, and transfer routes.

use super::SharedState;
use crate::context::Context;
use crate::error::PanelError;
use crate::views::{self, FILE_BROWSER_ID, REMOTES_LIST_ID, TRANSFER_STATUS_ID};
use serde::Deserialize;
use tracing::{info, warn};

/// Query value the browser sends for "up from the top level".
const PARENT_OF_ROOT: &str = "..";

pub(super) async fn page(state: SharedState, _ctx: Context) -> Result<String, PanelError> {
    let remotes = match state.client.remote_summaries().await {
        Ok(remotes) => remotes,
        Err(e) => {
            warn!("Failed to list remotes: {}", e);
            Vec::new()
        }
    };
    Ok(views::remotes_page(&remotes))
}

pub(super) async fn refresh(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    updates.set_error_region(REMOTES_LIST_ID);

    let remotes = state.client.remote_summaries().await?;
    updates
        .patch_by_id(REMOTES_LIST_ID, views::remotes_list(&remotes))
        .await
}

fn browse_path(ctx: &Context) -> &str {
    match ctx.query("path") {
        PARENT_OF_ROOT => "",
        path => path,
    }
}

async fn patch_browser(state: &SharedState, ctx: &Context, name: &str, path: &str) -> Result<(), PanelError> {
    let entries = state.client.list(name, path).await?;
    ctx.updates()?
        .patch_by_id(FILE_BROWSER_ID, views::file_browser(name, path, &entries))
        .await
}

pub(super) async fn browse(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    ctx.updates()?.set_error_region(FILE_BROWSER_ID);
    let name = ctx.require_param("name")?;
    let path = browse_path(&ctx);
    patch_browser(&state, &ctx, name, path).await
}

pub(super) async fn delete(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    updates.set_error_region(REMOTES_LIST_ID);
    let name = ctx.require_param("name")?;

    state.client.delete_remote(name).await?;
    info!("Deleted remote {}", name);
    updates.remove_by_id(&views::dom_id("remote", name)).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MkdirSignals {
    /// Directory currently shown in the browser.
    path: String,
    /// Name of the directory to create inside it.
    dir: String,
}

pub(super) async fn mkdir(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    ctx.updates()?.set_error_region(FILE_BROWSER_ID);
    let name = ctx.require_param("name")?;
    let signals: MkdirSignals = ctx.read_signals()?;

    let dir = signals.dir.trim().trim_matches('/');
    if dir.is_empty() {
        return Err(PanelError::bad_request("directory name is empty"));
    }
    let target = if signals.path.is_empty() {
        dir.to_string()
    } else {
        format!("{}/{}", signals.path.trim_end_matches('/'), dir)
    };

    state.client.mkdir(name, &target).await?;
    patch_browser(&state, &ctx, name, &signals.path).await
}

pub(super) async fn delete_entry(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    updates.set_error_region(FILE_BROWSER_ID);
    let name = ctx.require_param("name")?;
    let path = ctx.query("path");
    if path.is_empty() {
        return Err(PanelError::bad_request("refusing to delete the remote root"));
    }

    if ctx.query("dir") == "true" {
        state.client.purge(name, path).await?;
    } else {
        state.client.delete_file(name, path).await?;
    }
    info!("Deleted {}:{}", name, path);
    updates.remove_by_id(&views::dom_id("entry", path)).await
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TransferMode {
    #[default]
    Copy,
    Move,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TransferSignals {
    src_remote: String,
    src_path: String,
    dst_remote: String,
    dst_path: String,
    mode: TransferMode,
}

pub(super) async fn start_transfer(state: SharedState, ctx: Context) -> Result<(), PanelError> {
    let updates = ctx.updates()?;
    updates.set_error_region(TRANSFER_STATUS_ID);
    let t: TransferSignals = ctx.read_signals()?;
    if t.src_remote.is_empty() || t.dst_remote.is_empty() {
        return Err(PanelError::bad_request("source and destination remotes are required"));
    }

    let (verb, result) = match t.mode {
        TransferMode::Copy => (
            "copy",
            state.client.copy(&t.src_remote, &t.src_path, &t.dst_remote, &t.dst_path).await,
        ),
        TransferMode::Move => (
            "move",
            state.client.move_files(&t.src_remote, &t.src_path, &t.dst_remote, &t.dst_path).await,
        ),
    };
    result?;

    let notice = format!(
        "{} started: {}:{} -> {}:{}",
        verb, t.src_remote, t.src_path, t.dst_remote, t.dst_path
    );
    info!("{}", notice);
    let quoted = serde_json::to_string(&notice).unwrap_or_default();
    updates.execute_script(format!("console.info({})", quoted)).await?;
    updates.navigate("/jobs").await
}
