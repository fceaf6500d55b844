use std::future::Future;

use anyhow::Result;

use crate::models::{Application, Job};

/// Where dashboard records come from: the REST backend or a local snapshot.
pub trait JobBoardSource: Send + Sync {
    /// Jobs posted by the signed-in employer.
    fn employer_jobs(&self) -> impl Future<Output = Result<Vec<Job>>> + Send;

    /// Applications received for one job.
    fn job_applications(&self, job_id: &str)
        -> impl Future<Output = Result<Vec<Application>>> + Send;

    /// Applications submitted by the signed-in job seeker.
    fn user_applications(&self) -> impl Future<Output = Result<Vec<Application>>> + Send;
}
