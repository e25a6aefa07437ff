//! Job tracking over the RC client.
//!
//! The engine never pushes job updates, so tracking is polling: re-fetch by id
//! and classify with [`Job::state`]. Nothing here holds job state between calls.

use crate::cancel::CancellationToken;
use crate::client::RcClient;
use crate::models::{Job, JobState};
use crate::Result;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Counts of jobs by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl JobSummary {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        jobs.iter().fold(Self::default(), |mut summary, job| {
            match job.state() {
                JobState::Pending => summary.pending += 1,
                JobState::Succeeded => summary.succeeded += 1,
                JobState::Failed => summary.failed += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.pending + self.succeeded + self.failed
    }
}

/// Polling helpers for engine jobs.
#[derive(Debug, Clone)]
pub struct JobTracker {
    client: RcClient,
}

impl JobTracker {
    pub fn new(client: RcClient) -> Self {
        Self { client }
    }

    pub async fn summary(&self) -> Result<JobSummary> {
        let jobs = self.client.list_jobs().await?;
        Ok(JobSummary::from_jobs(&jobs))
    }

    /// Jobs that have not finished yet.
    pub async fn pending(&self) -> Result<Vec<Job>> {
        let jobs = self.client.list_jobs().await?;
        Ok(jobs
            .into_iter()
            .filter(|job| job.state() == JobState::Pending)
            .collect())
    }

    /// Poll `id` every `interval` until it reaches a terminal state.
    ///
    /// Fetch errors end the wait, including "not found" once the engine has
    /// garbage-collected the job.
    pub async fn wait(&self, id: i64, interval: Duration, cancel: &CancellationToken) -> Result<Job> {
        loop {
            cancel.check()?;
            let job = self.client.get_job(id).await?;
            if job.state().is_terminal() {
                debug!("job {} finished: {}", id, job.state().label());
                return Ok(job);
            }
            tokio::time::sleep(interval).await;
        }
    }
}
