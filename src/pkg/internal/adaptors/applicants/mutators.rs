use sqlx::PgConnection;
use sqlx::types::Json;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applicants::spec::{
    ApplicantEntry, NewApplicant, ProcessingStatus, ProfileFields, Source, SourceData,
};
use crate::prelude::Result;

const APPLICANT_COLUMNS: &str = "id, created_by, name, email, role, priority, cv_file_path, \
     linkedin_url, github_url, cv_status, li_status, gh_status, ai_status, \
     cv_data, li_data, gh_data, ai_data, status, created_at, updated_at";

pub struct ApplicantMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicantMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicantMutator { pool }
    }

    pub async fn create(&mut self, applicant: NewApplicant) -> Result<ApplicantEntry> {
        let query = format!(
            r#"
            INSERT INTO applicants (created_by, cv_file_path, linkedin_url, github_url, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {APPLICANT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ApplicantEntry>(&query)
            .bind(&applicant.created_by)
            .bind(&applicant.cv_file_path)
            .bind(&applicant.linkedin_url)
            .bind(&applicant.github_url)
            .bind(applicant.priority)
            .fetch_one(&mut *self.pool)
            .await?;
        Ok(row)
    }

    /// The claim: one conditional update, never a read-then-write. Zero rows
    /// affected means the claim was lost and the caller must re-read.
    pub async fn claim_source(&mut self, id: Uuid, source: Source) -> Result<bool> {
        let query = format!(
            "UPDATE applicants SET {col} = 'processing', updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 AND {col} <> 'processing' AND {col} <> 'ready'",
            col = source.status_column()
        );
        let result = sqlx::query(&query).bind(id).execute(&mut *self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal write for a claimed unit of work: status and data in one update.
    pub async fn complete_source(
        &mut self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
        data: Option<SourceData>,
    ) -> Result<()> {
        let query = format!(
            "UPDATE applicants SET {status_col} = $2, {data_col} = $3, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1",
            status_col = source.status_column(),
            data_col = source.data_column()
        );
        sqlx::query(&query)
            .bind(id)
            .bind(status)
            .bind(data.map(Json))
            .execute(&mut *self.pool)
            .await?;
        Ok(())
    }

    /// Marks an absorbing state (`not_provided`/`skipped`) without a claim.
    /// Only moves sources still at `pending`, so transitions stay monotonic.
    pub async fn set_source_status(
        &mut self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
    ) -> Result<()> {
        let query = format!(
            "UPDATE applicants SET {col} = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 AND {col} = 'pending'",
            col = source.status_column()
        );
        sqlx::query(&query)
            .bind(id)
            .bind(status)
            .execute(&mut *self.pool)
            .await?;
        Ok(())
    }

    /// First non-empty wins: fields already present on the record are kept.
    pub async fn update_profile(&mut self, id: Uuid, profile: ProfileFields) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE applicants
            SET name = COALESCE(name, $2),
                email = COALESCE(email, $3),
                role = COALESCE(role, $4),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.role)
        .execute(&mut *self.pool)
        .await?;
        Ok(())
    }
}
