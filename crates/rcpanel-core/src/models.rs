//! Value types decoded from RC responses.
//!
//! Field names follow the rclone wire format through serde renames; the Rust
//! names describe what the value means.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Engine filesystem address: `"<remote>:<path>"`, empty path meaning the root.
pub fn fs_address(remote: &str, path: &str) -> String {
    format!("{}:{}", remote, path)
}

/// Decode `null` as the type's default. Missing fields still fail unless the
/// field or container also carries `#[serde(default)]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A configured remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub remote_type: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl RemoteConfig {
    pub const UNKNOWN_TYPE: &'static str = "unknown";

    /// Build from a `config/get` result. The `type` key moves out of the options.
    pub fn from_options(name: &str, mut options: BTreeMap<String, String>) -> Self {
        let remote_type = options
            .remove("type")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Self::UNKNOWN_TYPE.to_string());
        Self {
            name: name.to_string(),
            remote_type,
            options,
        }
    }

    /// Placeholder for a remote whose configuration could not be read.
    pub fn unknown(name: &str) -> Self {
        Self::from_options(name, BTreeMap::new())
    }
}

/// One entry from `operations/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Size", default)]
    pub size_bytes: i64,
    #[serde(rename = "ModTime", default)]
    pub mod_time: String,
    #[serde(rename = "IsDir", default)]
    pub is_dir: bool,
}

/// Lifecycle of a job as observed by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Pending)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobState::Pending => "running",
            JobState::Succeeded => "finished",
            JobState::Failed => "error",
        }
    }
}

/// An engine-tracked asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub group: String,
    #[serde(rename = "startTime", default)]
    pub start_time: String,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub finished: bool,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    pub fn state(&self) -> JobState {
        match (self.finished, self.success) {
            (false, _) => JobState::Pending,
            (true, true) => JobState::Succeeded,
            (true, false) => JobState::Failed,
        }
    }

    /// Enforce the lifecycle invariants on a freshly decoded job.
    ///
    /// Unfinished jobs carry neither success nor an error; a failed job always
    /// carries an error string, possibly empty. rclone reports an unfinished
    /// job's end time as the zero time, which is dropped.
    pub(crate) fn normalized(mut self, id: i64) -> Self {
        self.id = id;
        if !self.finished {
            self.success = false;
            self.error = None;
            self.end_time = None;
        } else if !self.success && self.error.is_none() {
            self.error = Some(String::new());
        } else if self.success && self.error.as_deref() == Some("") {
            self.error = None;
        }
        if self
            .end_time
            .as_deref()
            .is_some_and(|t| t.is_empty() || t.starts_with("0001-01-01"))
        {
            self.end_time = None;
        }
        self
    }

    pub fn started_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.start_time).ok()
    }

    pub fn ended_at(&self) -> Option<DateTime<FixedOffset>> {
        self.end_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    }

    /// Run time of a finished job, when both timestamps parse.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.ended_at()? - self.started_at()?)
    }
}

/// Transfer statistics from `core/stats`.
///
/// The engine omits fields that are not currently meaningful (and reports
/// `eta` as `null` when idle); every such field reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSnapshot {
    #[serde(rename = "bytes", deserialize_with = "null_as_default")]
    pub bytes_transferred: u64,
    #[serde(rename = "speed", deserialize_with = "null_as_default")]
    pub speed_bytes_per_sec: f64,
    #[serde(rename = "eta", deserialize_with = "null_as_default")]
    pub eta_seconds: f64,
    #[serde(rename = "elapsedTime", deserialize_with = "null_as_default")]
    pub elapsed_seconds: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub transfers: u64,
    #[serde(rename = "totalTransfers", deserialize_with = "null_as_default")]
    pub total_transfers: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub checks: u64,
    #[serde(rename = "totalChecks", deserialize_with = "null_as_default")]
    pub total_checks: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub deletes: u64,
}

/// Engine build information from `core/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    #[serde(deserialize_with = "string_or_unknown")]
    pub version: String,
    #[serde(rename = "goVersion", deserialize_with = "string_or_unknown")]
    pub runtime_version: String,
    #[serde(deserialize_with = "string_or_unknown")]
    pub os: String,
    #[serde(deserialize_with = "string_or_unknown")]
    pub arch: String,
}

impl VersionInfo {
    pub const UNKNOWN: &'static str = "unknown";
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: Self::UNKNOWN.to_string(),
            runtime_version: Self::UNKNOWN.to_string(),
            os: Self::UNKNOWN.to_string(),
            arch: Self::UNKNOWN.to_string(),
        }
    }
}

fn string_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| VersionInfo::UNKNOWN.to_string()))
}
