use async_trait::async_trait;

use crate::pkg::internal::adaptors::applicants::spec::{AnalysisData, ApplicantEntry};
use crate::prelude::Result;

/// AI credibility analysis over the merged applicant record. External
/// collaborator.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, applicant: &ApplicantEntry) -> Result<AnalysisData>;
}

/// Neutral verdict substituted when the analyzer fails; an applicant is
/// never blocked on analysis.
pub fn fallback_analysis(reason: &str) -> AnalysisData {
    AnalysisData {
        score: 50.0,
        summary: Some(format!("analysis unavailable: {}", reason)),
        strengths: Vec::new(),
        concerns: Vec::new(),
        degraded: true,
    }
}

pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalyzer {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        HttpAnalyzer {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, applicant: &ApplicantEntry) -> Result<AnalysisData> {
        tracing::debug!(applicant = %applicant.id, "requesting credibility analysis");
        let data = self
            .client
            .post(&self.endpoint)
            .json(applicant)
            .send()
            .await?
            .error_for_status()?
            .json::<AnalysisData>()
            .await?;
        Ok(data)
    }
}
