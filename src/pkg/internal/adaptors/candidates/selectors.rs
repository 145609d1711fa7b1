use sqlx::PgConnection;

use crate::pkg::internal::adaptors::candidates::spec::CandidateCacheEntry;
use crate::prelude::Result;

pub struct CandidateSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        CandidateSelector { pool }
    }

    pub async fn get_for_user(&mut self, user_id: &str) -> Result<Vec<CandidateCacheEntry>> {
        let rows = sqlx::query_as::<_, CandidateCacheEntry>(
            "SELECT id, user_id, external_id, name, email, linkedin_url, github_url,
                    resume_handle, resume_url, applicant_id, last_synced_at, created_at
             FROM candidate_cache WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_external_id(
        &mut self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Option<CandidateCacheEntry>> {
        let row = sqlx::query_as::<_, CandidateCacheEntry>(
            "SELECT id, user_id, external_id, name, email, linkedin_url, github_url,
                    resume_handle, resume_url, applicant_id, last_synced_at, created_at
             FROM candidate_cache WHERE user_id = $1 AND external_id = $2",
        )
        .bind(user_id)
        .bind(external_id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }
}
