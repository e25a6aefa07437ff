//! Typed client for the rclone RC API.
//!
//! Translates domain operations into `(method, params)` pairs and decodes the
//! JSON results. The client owns no transport logic and caches nothing; every
//! call is a fresh round-trip.

use crate::config::RcConfig;
use crate::models::{fs_address, null_as_default, Job, ListEntry, RemoteConfig, StatsSnapshot, VersionInfo};
use crate::transport::Transport;
use crate::{RcError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RemotesResponse {
    #[serde(deserialize_with = "null_as_default")]
    remotes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(deserialize_with = "null_as_default")]
    list: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
struct JobListResponse {
    #[serde(rename = "jobids", deserialize_with = "null_as_default")]
    job_ids: Vec<i64>,
}

/// rclone RC client over any [`Transport`].
#[derive(Clone)]
pub struct RcClient {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RcClient").finish_non_exhaustive()
    }
}

impl RcClient {
    /// Client over an already-built transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Release transport resources (finalizes an embedded engine).
    pub async fn close(&self) {
        self.transport.shutdown().await;
    }

    /// Make one RC call and return the raw body of a 200 response.
    async fn call(&self, method: &str, params: Option<Value>) -> Result<String> {
        let params = params
            .map(|p| p.to_string())
            .unwrap_or_else(|| RcConfig::EMPTY_PARAMS.to_string());
        debug!("RC call: {}({})", method, params);

        let reply = self.transport.call(method, &params).await;
        if !reply.is_success() {
            debug!("RC call {} failed with status {}", method, reply.status);
            return Err(RcError::protocol(method, reply.status, reply.body));
        }
        Ok(reply.body)
    }

    async fn call_decode<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        let body = self.call(method, params).await?;
        serde_json::from_str(&body).map_err(|e| RcError::decode(method, e))
    }

    // ========================================================================
    // Config
    // ========================================================================

    /// Names of all configured remotes, in engine order.
    pub async fn list_remotes(&self) -> Result<Vec<String>> {
        let response: RemotesResponse = self.call_decode("config/listremotes", None).await?;
        Ok(response.remotes)
    }

    /// Raw configuration of one remote.
    pub async fn get_remote(&self, name: &str) -> Result<BTreeMap<String, String>> {
        self.call_decode("config/get", Some(json!({ "name": name })))
            .await
    }

    /// Typed configuration of one remote.
    pub async fn remote_config(&self, name: &str) -> Result<RemoteConfig> {
        let options = self.get_remote(name).await?;
        Ok(RemoteConfig::from_options(name, options))
    }

    /// Every remote with its type. A remote whose config cannot be read is
    /// reported with type `"unknown"` instead of failing the listing.
    pub async fn remote_summaries(&self) -> Result<Vec<RemoteConfig>> {
        let names = self.list_remotes().await?;
        let mut remotes = Vec::with_capacity(names.len());
        for name in names {
            match self.remote_config(&name).await {
                Ok(remote) => remotes.push(remote),
                Err(e) => {
                    debug!("config for remote {} unavailable: {}", name, e);
                    remotes.push(RemoteConfig::unknown(&name));
                }
            }
        }
        Ok(remotes)
    }

    /// Delete a remote. Deleting an absent remote is an engine error.
    pub async fn delete_remote(&self, name: &str) -> Result<()> {
        self.call("config/delete", Some(json!({ "name": name })))
            .await
            .map(drop)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// List a directory. An empty `path` lists the remote's root.
    pub async fn list(&self, remote: &str, path: &str) -> Result<Vec<ListEntry>> {
        let response: ListResponse = self
            .call_decode(
                "operations/list",
                Some(json!({
                    "fs": fs_address(remote, path),
                    "remote": "",
                })),
            )
            .await?;
        Ok(response.list)
    }

    /// Create a directory, including missing parents.
    pub async fn mkdir(&self, remote: &str, path: &str) -> Result<()> {
        self.remote_op("operations/mkdir", remote, path).await
    }

    /// Delete a single file.
    pub async fn delete_file(&self, remote: &str, path: &str) -> Result<()> {
        self.remote_op("operations/deletefile", remote, path).await
    }

    /// Remove a directory and everything in it.
    pub async fn purge(&self, remote: &str, path: &str) -> Result<()> {
        self.remote_op("operations/purge", remote, path).await
    }

    async fn remote_op(&self, method: &str, remote: &str, path: &str) -> Result<()> {
        self.call(
            method,
            Some(json!({
                "fs": fs_address(remote, ""),
                "remote": path,
            })),
        )
        .await
        .map(drop)
    }

    // ========================================================================
    // Sync
    // ========================================================================

    /// Start copying `src` to `dst` as an engine job. Poll [`RcClient::list_jobs`]
    /// for progress.
    pub async fn copy(&self, src_remote: &str, src_path: &str, dst_remote: &str, dst_path: &str) -> Result<()> {
        self.transfer("sync/copy", src_remote, src_path, dst_remote, dst_path)
            .await
    }

    /// Start moving `src` to `dst` as an engine job.
    pub async fn move_files(&self, src_remote: &str, src_path: &str, dst_remote: &str, dst_path: &str) -> Result<()> {
        self.transfer("sync/move", src_remote, src_path, dst_remote, dst_path)
            .await
    }

    async fn transfer(
        &self,
        method: &str,
        src_remote: &str,
        src_path: &str,
        dst_remote: &str,
        dst_path: &str,
    ) -> Result<()> {
        self.call(
            method,
            Some(json!({
                "srcFs": fs_address(src_remote, src_path),
                "dstFs": fs_address(dst_remote, dst_path),
                "_async": true,
            })),
        )
        .await
        .map(drop)
    }

    // ========================================================================
    // Core
    // ========================================================================

    /// Engine build information.
    pub async fn version(&self) -> Result<VersionInfo> {
        self.call_decode("core/version", None).await
    }

    /// Current transfer statistics.
    pub async fn stats(&self) -> Result<StatsSnapshot> {
        self.call_decode("core/stats", None).await
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    /// All jobs the engine still remembers.
    ///
    /// Jobs whose status cannot be fetched (typically garbage-collected between
    /// `job/list` and `job/status`) are left out rather than failing the listing.
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let response: JobListResponse = self.call_decode("job/list", None).await?;

        let mut jobs = Vec::with_capacity(response.job_ids.len());
        for id in response.job_ids {
            match self.get_job(id).await {
                Ok(job) => jobs.push(job),
                Err(e) => debug!("dropping job {} from listing: {}", id, e),
            }
        }
        Ok(jobs)
    }

    /// Status of one job.
    pub async fn get_job(&self, id: i64) -> Result<Job> {
        let job: Job = self
            .call_decode("job/status", Some(json!({ "jobid": id })))
            .await?;
        Ok(job.normalized(id))
    }

    /// Ask the engine to stop a running job.
    pub async fn stop_job(&self, id: i64) -> Result<()> {
        self.call("job/stop", Some(json!({ "jobid": id })))
            .await
            .map(drop)
    }
}
