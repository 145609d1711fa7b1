use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::prelude::Error;

/// Per-source lifecycle. `not_provided` and `skipped` are reached without
/// entering `processing`; `ready` and `error` only from `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "processing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Ready,
    Error,
    NotProvided,
    Skipped,
}

/// Overall applicant state. Owned by the store: in Postgres this is a
/// generated column, `derive_overall_status` is the same rule in Rust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "applicant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Pending,
    Processing,
    Analyzing,
    Completed,
    Failed,
}

pub fn derive_overall_status(cv: ProcessingStatus, ai: ProcessingStatus) -> ApplicantStatus {
    match (cv, ai) {
        (ProcessingStatus::Error, _) => ApplicantStatus::Failed,
        (_, ProcessingStatus::Ready) => ApplicantStatus::Completed,
        (ProcessingStatus::Ready, _) => ApplicantStatus::Analyzing,
        (ProcessingStatus::Processing, _) => ApplicantStatus::Processing,
        _ => ApplicantStatus::Pending,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cv,
    Linkedin,
    Github,
    Analysis,
}

impl Source {
    pub fn status_column(&self) -> &'static str {
        match self {
            Source::Cv => "cv_status",
            Source::Linkedin => "li_status",
            Source::Github => "gh_status",
            Source::Analysis => "ai_status",
        }
    }

    pub fn data_column(&self) -> &'static str {
        match self {
            Source::Cv => "cv_data",
            Source::Linkedin => "li_data",
            Source::Github => "gh_data",
            Source::Analysis => "ai_data",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cv => "cv",
            Source::Linkedin => "linkedin",
            Source::Github => "github",
            Source::Analysis => "analysis",
        }
    }
}

impl std::str::FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cv" => Ok(Source::Cv),
            "linkedin" => Ok(Source::Linkedin),
            "github" => Ok(Source::Github),
            "analysis" => Ok(Source::Analysis),
            other => Err(Error::Precondition(format!("unknown source: {}", other))),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored outcome of one source, tagged so a reader never has to guess
/// whether the column holds data or an error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceData {
    Ready {
        data: serde_json::Value,
    },
    Failed {
        error: String,
        processed_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedInData {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub positions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubData {
    pub username: Option<String>,
    pub public_repos: Option<i64>,
    pub followers: Option<i64>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisData {
    pub score: f64,
    pub summary: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub created_by: String,
    pub cv_file_path: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantEntry {
    pub id: Uuid,
    pub created_by: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub priority: i32,
    pub cv_file_path: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub cv_status: ProcessingStatus,
    pub li_status: ProcessingStatus,
    pub gh_status: ProcessingStatus,
    pub ai_status: ProcessingStatus,
    pub cv_data: Option<Json<SourceData>>,
    pub li_data: Option<Json<SourceData>>,
    pub gh_data: Option<Json<SourceData>>,
    pub ai_data: Option<Json<SourceData>>,
    pub status: ApplicantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicantEntry {
    pub fn source_status(&self, source: Source) -> ProcessingStatus {
        match source {
            Source::Cv => self.cv_status,
            Source::Linkedin => self.li_status,
            Source::Github => self.gh_status,
            Source::Analysis => self.ai_status,
        }
    }

    pub fn source_data(&self, source: Source) -> Option<&SourceData> {
        let data = match source {
            Source::Cv => &self.cv_data,
            Source::Linkedin => &self.li_data,
            Source::Github => &self.gh_data,
            Source::Analysis => &self.ai_data,
        };
        data.as_ref().map(|json| &json.0)
    }

    /// 0-100 credibility score: the analysis verdict when available,
    /// otherwise a completeness heuristic over the evidence sources.
    pub fn score(&self) -> f64 {
        if let Some(SourceData::Ready { data }) = self.source_data(Source::Analysis) {
            if let Ok(analysis) = serde_json::from_value::<AnalysisData>(data.clone()) {
                return analysis.score.clamp(0.0, 100.0);
            }
        }
        let mut score = 0.0;
        if self.cv_status == ProcessingStatus::Ready {
            score += 40.0;
        }
        if self.li_status == ProcessingStatus::Ready {
            score += 15.0;
        }
        if self.gh_status == ProcessingStatus::Ready {
            score += 15.0;
        }
        score
    }
}
