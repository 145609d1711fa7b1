use async_trait::async_trait;
use serde_json::json;

use crate::pkg::internal::adaptors::applicants::spec::GithubData;
use crate::prelude::Result;

#[derive(Debug, Clone, Default)]
pub struct GithubScanOptions {
    pub include_forks: bool,
}

/// GitHub account scanner. External collaborator.
#[async_trait]
pub trait GithubProcessor: Send + Sync {
    async fn process(&self, url: &str, options: &GithubScanOptions) -> Result<GithubData>;
}

pub struct HttpGithubProcessor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGithubProcessor {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        HttpGithubProcessor {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl GithubProcessor for HttpGithubProcessor {
    async fn process(&self, url: &str, options: &GithubScanOptions) -> Result<GithubData> {
        tracing::debug!(url, "scanning github account");
        let data = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "url": url, "include_forks": options.include_forks }))
            .send()
            .await?
            .error_for_status()?
            .json::<GithubData>()
            .await?;
        Ok(data)
    }
}
