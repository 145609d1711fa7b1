use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::pkg::internal::adaptors::applicants::spec::LinkedInData;
use crate::pkg::internal::poller::{self, ExternalJobStatus, JobCheck, JobStart, PollConfig, PollOutcome};
use crate::prelude::{Error, Result};

/// LinkedIn scrapes run as long-lived jobs on the scraping service; this is
/// the start/check pair the job poller drives.
#[async_trait]
pub trait LinkedInJobs: Send + Sync {
    async fn start_job(&self, url: &str) -> Result<JobStart>;
    async fn check_job(&self, job_id: &str, existing_only: bool) -> Result<JobCheck>;
}

/// Runs one scrape to a terminal outcome. Timeout surfaces as
/// `Error::Timeout` so the orchestrator can terminate the source as
/// `not_provided` instead of `error`.
pub async fn scrape_profile(
    jobs: Arc<dyn LinkedInJobs>,
    url: &str,
    config: &PollConfig,
) -> Result<LinkedInData> {
    let starter = jobs.clone();
    let url = url.to_string();
    let outcome = poller::run_to_completion(
        move || async move { starter.start_job(&url).await },
        move |job_id, existing_only| {
            let jobs = jobs.clone();
            async move { jobs.check_job(&job_id, existing_only).await }
        },
        config,
    )
    .await?;
    match outcome {
        PollOutcome::Completed(data) => Ok(serde_json::from_value(data)?),
        PollOutcome::EmptySnapshot => {
            Err(Error::NotAccessible("existing snapshot has no data".into()))
        }
        PollOutcome::NotAccessible => {
            Err(Error::NotAccessible("profile is not accessible".into()))
        }
        PollOutcome::TimedOut => Err(Error::Timeout),
    }
}

pub struct HttpLinkedInJobs {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLinkedInJobs {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        HttpLinkedInJobs {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct StartResponse {
    job_id: String,
    #[serde(default)]
    is_existing: bool,
}

#[derive(Deserialize)]
struct CheckResponse {
    status: String,
    data: Option<Value>,
}

#[async_trait]
impl LinkedInJobs for HttpLinkedInJobs {
    async fn start_job(&self, url: &str) -> Result<JobStart> {
        tracing::debug!(url, "starting linkedin scrape job");
        let response = self
            .client
            .post(format!("{}/jobs", self.endpoint))
            .json(&json!({ "url": url }))
            .send()
            .await?
            .error_for_status()?
            .json::<StartResponse>()
            .await?;
        Ok(JobStart {
            job_id: response.job_id,
            is_existing: response.is_existing,
        })
    }

    async fn check_job(&self, job_id: &str, existing_only: bool) -> Result<JobCheck> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.endpoint, job_id))
            .query(&[("existing_only", existing_only)])
            .send()
            .await?
            .error_for_status()?
            .json::<CheckResponse>()
            .await?;
        let status = match response.status.as_str() {
            "completed" => ExternalJobStatus::Completed,
            "failed" => ExternalJobStatus::Failed,
            _ => ExternalJobStatus::Running,
        };
        Ok(JobCheck {
            status,
            data: response.data,
        })
    }
}
