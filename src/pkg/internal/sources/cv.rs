use async_trait::async_trait;
use serde_json::json;

use crate::pkg::internal::adaptors::applicants::spec::CvData;
use crate::prelude::Result;

/// PDF-to-structured-data extractor. External collaborator; only the
/// interface matters here.
#[async_trait]
pub trait CvProcessor: Send + Sync {
    async fn process(&self, file_path: &str) -> Result<CvData>;
}

pub struct HttpCvProcessor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCvProcessor {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        HttpCvProcessor {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl CvProcessor for HttpCvProcessor {
    async fn process(&self, file_path: &str) -> Result<CvData> {
        tracing::debug!(file_path, "extracting cv");
        let data = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "file_path": file_path }))
            .send()
            .await?
            .error_for_status()?
            .json::<CvData>()
            .await?;
        Ok(data)
    }
}
