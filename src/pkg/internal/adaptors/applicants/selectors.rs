use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applicants::spec::ApplicantEntry;
use crate::prelude::Result;

pub struct ApplicantSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicantSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicantSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<ApplicantEntry>> {
        let row = sqlx::query_as::<_, ApplicantEntry>(
            "SELECT id, created_by, name, email, role, priority, cv_file_path,
                    linkedin_url, github_url, cv_status, li_status, gh_status, ai_status,
                    cv_data, li_data, gh_data, ai_data, status, created_at, updated_at
             FROM applicants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_for_user(&mut self, created_by: &str) -> Result<Vec<ApplicantEntry>> {
        let rows = sqlx::query_as::<_, ApplicantEntry>(
            "SELECT id, created_by, name, email, role, priority, cv_file_path,
                    linkedin_url, github_url, cv_status, li_status, gh_status, ai_status,
                    cv_data, li_data, gh_data, ai_data, status, created_at, updated_at
             FROM applicants WHERE created_by = $1 ORDER BY created_at DESC",
        )
        .bind(created_by)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}
