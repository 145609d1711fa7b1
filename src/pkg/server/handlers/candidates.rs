use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::pkg::internal::adaptors::applicants::spec::NewApplicant;
use crate::pkg::internal::adaptors::candidates::spec::CandidateCacheEntry;
use crate::pkg::internal::directory::{SyncMode, SyncReport};
use crate::pkg::internal::store::{CandidateCache, RecordStore};
use crate::pkg::server::handlers::applicants::{ApplicantResponse, save_upload};
use crate::pkg::server::state::AppState;
use crate::prelude::{Error, Result};

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<CandidateCacheEntry>>> {
    state.sync.ensure_fresh(&query.user_id).await?;
    let candidates = state.store.list_candidates(&query.user_id).await?;
    Ok(Json(candidates))
}

#[derive(Deserialize)]
pub struct SyncInput {
    pub user_id: String,
    #[serde(default)]
    pub mode: SyncMode,
}

pub async fn sync(
    State(state): State<AppState>,
    Json(input): Json<SyncInput>,
) -> Result<Json<SyncReport>> {
    let report = state.sync.sync(&input.user_id, input.mode).await?;
    Ok(Json(report))
}

#[derive(Deserialize)]
pub struct ImportInput {
    pub user_id: String,
    pub priority: Option<i32>,
}

/// Pulls a directory candidate into the intake pipeline: downloads the
/// resume, creates the applicant, links the cache row and queues ingestion.
/// Importing an already-imported candidate returns the existing applicant.
pub async fn import(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    Json(input): Json<ImportInput>,
) -> Result<Json<ApplicantResponse>> {
    let candidate = state
        .store
        .get_candidate(&input.user_id, &external_id)
        .await?
        .ok_or(Error::NotFound)?;

    if let Some(applicant_id) = candidate.applicant_id {
        if let Some(existing) = state.store.get_applicant(applicant_id).await? {
            tracing::info!(
                external_id,
                applicant = %applicant_id,
                "candidate already imported"
            );
            return Ok(Json(existing.into()));
        }
    }

    let resume_url = candidate.resume_url.clone().ok_or_else(|| {
        Error::Precondition("candidate has no downloadable resume".into())
    })?;
    let bytes = state
        .http
        .get(&resume_url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let cv_file_path = save_upload(&state, resume_extension(&candidate), &bytes).await?;

    let applicant = state
        .store
        .create_applicant(NewApplicant {
            created_by: input.user_id.clone(),
            cv_file_path,
            linkedin_url: candidate.linkedin_url.clone(),
            github_url: candidate.github_url.clone(),
            priority: input.priority.unwrap_or(50),
        })
        .await?;
    state
        .store
        .link_applicant(&input.user_id, &external_id, applicant.id)
        .await?;
    state.ingest.enqueue(applicant.id).await?;
    tracing::info!(external_id, applicant = %applicant.id, "candidate imported");
    Ok(Json(applicant.into()))
}

/// Preserves doc/docx resumes under their real extension; everything else
/// lands as pdf.
fn resume_extension(candidate: &CandidateCacheEntry) -> &'static str {
    let name = candidate
        .resume_handle
        .as_deref()
        .or(candidate.resume_url.as_deref())
        .unwrap_or_default();
    let name = name.split('?').next().unwrap_or(name);
    match name.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("doc") => "doc",
        Some("docx") => "docx",
        _ => "pdf",
    }
}
