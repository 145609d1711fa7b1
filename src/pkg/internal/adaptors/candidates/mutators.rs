use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::candidates::spec::NewCacheEntry;
use crate::prelude::Result;

pub struct CandidateMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> CandidateMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        CandidateMutator { pool }
    }

    /// Upsert keyed on (user_id, external_id); latest fetched values win and
    /// last_synced_at is refreshed on conflict.
    pub async fn upsert(&mut self, user_id: &str, entries: Vec<NewCacheEntry>) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }
        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO candidate_cache (user_id, external_id, name, email, linkedin_url, github_url, resume_handle, resume_url, last_synced_at) ",
        );
        query_builder.push_values(entries, |mut b, entry| {
            b.push_bind(user_id.to_string())
                .push_bind(entry.external_id)
                .push_bind(entry.name)
                .push_bind(entry.email)
                .push_bind(entry.linkedin_url)
                .push_bind(entry.github_url)
                .push_bind(entry.resume_handle)
                .push_bind(entry.resume_url)
                .push("CURRENT_TIMESTAMP");
        });
        query_builder.push(
            " ON CONFLICT (user_id, external_id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                linkedin_url = EXCLUDED.linkedin_url,
                github_url = EXCLUDED.github_url,
                resume_handle = EXCLUDED.resume_handle,
                resume_url = EXCLUDED.resume_url,
                last_synced_at = EXCLUDED.last_synced_at",
        );
        let result = query_builder.build().execute(&mut *self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_for_user(&mut self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM candidate_cache WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn link_applicant(
        &mut self,
        user_id: &str,
        external_id: &str,
        applicant_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE candidate_cache SET applicant_id = $3 WHERE user_id = $1 AND external_id = $2",
        )
        .bind(user_id)
        .bind(external_id)
        .bind(applicant_id)
        .execute(&mut *self.pool)
        .await?;
        Ok(())
    }

    /// Per-user full-sync guard, same conditional-update shape as the
    /// per-source claim: zero rows affected means another sync holds it.
    pub async fn claim_sync(&mut self, user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO directory_sync_state (user_id, status, started_at)
            VALUES ($1, 'syncing', CURRENT_TIMESTAMP)
            ON CONFLICT (user_id) DO UPDATE
            SET status = 'syncing', started_at = CURRENT_TIMESTAMP
            WHERE directory_sync_state.status <> 'syncing'
            "#,
        )
        .bind(user_id)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn release_sync(&mut self, user_id: &str) -> Result<()> {
        sqlx::query("UPDATE directory_sync_state SET status = 'idle' WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.pool)
            .await?;
        Ok(())
    }
}
