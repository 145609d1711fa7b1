use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pkg::internal::adaptors::applicants::spec::{ApplicantEntry, NewApplicant, Source};
use crate::pkg::internal::ingest::SourceReport;
use crate::pkg::internal::store::RecordStore;
use crate::pkg::server::state::AppState;
use crate::prelude::{Error, Result};

const MAX_CV_BYTES: usize = 10 * 1024 * 1024;
const CV_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];
const DEFAULT_PRIORITY: i32 = 50;

#[derive(Serialize)]
pub struct ApplicantResponse {
    #[serde(flatten)]
    pub applicant: ApplicantEntry,
    pub score: f64,
}

impl From<ApplicantEntry> for ApplicantResponse {
    fn from(applicant: ApplicantEntry) -> Self {
        let score = applicant.score();
        ApplicantResponse { applicant, score }
    }
}

pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApplicantResponse>> {
    let mut created_by: Option<String> = None;
    let mut linkedin_url: Option<String> = None;
    let mut github_url: Option<String> = None;
    let mut priority = DEFAULT_PRIORITY;
    let mut cv_file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Precondition(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "created_by" => created_by = Some(read_text(field).await?),
            "linkedin_url" => linkedin_url = non_empty(read_text(field).await?),
            "github_url" => github_url = non_empty(read_text(field).await?),
            "priority" => {
                priority = read_text(field)
                    .await?
                    .parse()
                    .map_err(|_| Error::Precondition("priority must be an integer".into()))?;
            }
            "cv_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let extension = filename
                    .rsplit('.')
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                if !CV_EXTENSIONS.contains(&extension.as_str()) {
                    return Err(Error::Precondition(
                        "cv must be a pdf, doc or docx file".into(),
                    ));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Precondition(e.to_string()))?;
                if bytes.len() > MAX_CV_BYTES {
                    return Err(Error::Precondition("cv file exceeds the 10MB limit".into()));
                }
                cv_file = Some((extension, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let created_by =
        created_by.ok_or_else(|| Error::Precondition("created_by is required".into()))?;
    let (extension, bytes) =
        cv_file.ok_or_else(|| Error::Precondition("cv_file is required".into()))?;
    let cv_file_path = save_upload(&state, &extension, &bytes).await?;

    let applicant = state
        .store
        .create_applicant(NewApplicant {
            created_by,
            cv_file_path,
            linkedin_url,
            github_url,
            priority,
        })
        .await?;
    state.ingest.enqueue(applicant.id).await?;
    tracing::info!(applicant = %applicant.id, "applicant accepted for processing");
    Ok(Json(applicant.into()))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub created_by: String,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ApplicantResponse>>> {
    let applicants = state.store.list_applicants(&query.created_by).await?;
    Ok(Json(applicants.into_iter().map(Into::into).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicantResponse>> {
    let applicant = state.store.get_applicant(id).await?.ok_or(Error::NotFound)?;
    Ok(Json(applicant.into()))
}

pub async fn retry_source(
    State(state): State<AppState>,
    Path((id, source)): Path<(Uuid, String)>,
) -> Result<Json<SourceReport>> {
    let source: Source = source.parse()?;
    let report = state.coordinator.process_source(id, source).await?;
    Ok(Json(report))
}

pub async fn save_upload(state: &AppState, extension: &str, bytes: &[u8]) -> Result<String> {
    tokio::fs::create_dir_all(&state.settings.upload_dir).await?;
    let path = format!(
        "{}/{}.{}",
        state.settings.upload_dir,
        Uuid::new_v4(),
        extension
    );
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::Precondition(e.to_string()))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
