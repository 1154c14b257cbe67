//! Job queue operations and waiting for jobs to settle.

use crate::models::{decode, Job, JobId, JobLink};
use crate::Result;
use async_trait::async_trait;
use ganeti_core::{poll_until, ApiClient, Clock, Error, PollOutcome, PollPolicy};
use tracing::{debug, info, warn};

const ENDPOINT: &str = "jobs";

/// Anything that can report the current state of a job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch the job's current state.
    async fn job(&self, job_id: JobId) -> Result<Job>;
}

/// Operations under `jobs`.
#[derive(Clone, Copy)]
pub struct JobService<'a> {
    api: &'a ApiClient,
    clock: &'a dyn Clock,
}

impl<'a> JobService<'a> {
    pub(crate) const fn new(api: &'a ApiClient, clock: &'a dyn Clock) -> Self {
        Self { api, clock }
    }

    /// Ids of all jobs in the queue.
    pub async fn job_ids(&self) -> Result<Vec<JobId>> {
        let links: Vec<JobLink> = decode(self.api.get(ENDPOINT, &[]).await?, "job list")?;
        Ok(links.into_iter().map(|link| link.id).collect())
    }

    /// Current state of a job.
    pub async fn get_job(&self, job_id: JobId) -> Result<Job> {
        let raw = self.api.get(&format!("{ENDPOINT}/{job_id}"), &[]).await?;
        decode(raw, "job")
    }

    /// Request cancellation of a job.
    pub async fn cancel_job(&self, job_id: JobId) -> Result<()> {
        self.api.delete(&format!("{ENDPOINT}/{job_id}")).await?;
        info!(%job_id, "job cancellation requested");
        Ok(())
    }

    /// Wait for a job to finalize, re-fetching every `policy.interval`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the job is still unsettled after `policy.timeout`, or
    /// the first error raised while fetching it.
    pub async fn wait_for_job(&self, job_id: JobId, policy: &PollPolicy) -> Result<Job> {
        wait_for_job(self, self.clock, job_id, policy).await
    }
}

#[async_trait]
impl JobSource for JobService<'_> {
    async fn job(&self, job_id: JobId) -> Result<Job> {
        self.get_job(job_id).await
    }
}

/// Poll `source` until the job finalizes.
///
/// The job is always fetched at least once, so a job that is already finished returns
/// without sleeping. A job that is still running after `policy.timeout` ends the wait with
/// [`Error::Timeout`]. The job itself is left alone.
///
/// # Errors
///
/// See [`JobService::wait_for_job`].
pub async fn wait_for_job(
    source: &(dyn JobSource + '_),
    clock: &dyn Clock,
    job_id: JobId,
    policy: &PollPolicy,
) -> Result<Job> {
    debug!(%job_id, timeout = ?policy.timeout, "waiting for job");

    match poll_until(clock, policy, || source.job(job_id), Job::is_finalized).await? {
        PollOutcome::Ready(job) => {
            debug!(%job_id, status = %job.status, "job finalized");
            Ok(job)
        }
        PollOutcome::TimedOut { last, elapsed } => {
            warn!(%job_id, status = %last.status, ?elapsed, "gave up waiting for job");
            Err(Error::Timeout {
                job_id: job_id.get(),
                timeout: policy.timeout,
            })
        }
    }
}
