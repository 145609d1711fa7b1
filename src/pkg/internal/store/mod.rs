use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applicants::mutators::ApplicantMutator;
use crate::pkg::internal::adaptors::applicants::selectors::ApplicantSelector;
use crate::pkg::internal::adaptors::applicants::spec::{
    ApplicantEntry, NewApplicant, ProcessingStatus, ProfileFields, Source, SourceData,
};
use crate::pkg::internal::adaptors::candidates::mutators::CandidateMutator;
use crate::pkg::internal::adaptors::candidates::selectors::CandidateSelector;
use crate::pkg::internal::adaptors::candidates::spec::{CandidateCacheEntry, NewCacheEntry};
use crate::prelude::Result;

#[cfg(test)]
pub mod memory;

/// Durable keyed storage for applicant records. `claim_source` is the only
/// concurrency primitive the orchestrator relies on: it must be a single
/// conditional write, never a read-then-write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_applicant(&self, applicant: NewApplicant) -> Result<ApplicantEntry>;
    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantEntry>>;
    async fn list_applicants(&self, created_by: &str) -> Result<Vec<ApplicantEntry>>;
    /// Returns true when this caller won exclusive ownership of the
    /// (applicant, source) unit of work.
    async fn claim_source(&self, id: Uuid, source: Source) -> Result<bool>;
    async fn complete_source(
        &self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
        data: Option<SourceData>,
    ) -> Result<()>;
    async fn set_source_status(
        &self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
    ) -> Result<()>;
    async fn update_profile(&self, id: Uuid, profile: ProfileFields) -> Result<()>;
}

/// Mirror of the external candidate directory.
#[async_trait]
pub trait CandidateCache: Send + Sync {
    async fn list_candidates(&self, user_id: &str) -> Result<Vec<CandidateCacheEntry>>;
    async fn get_candidate(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Option<CandidateCacheEntry>>;
    async fn upsert_candidates(&self, user_id: &str, entries: Vec<NewCacheEntry>) -> Result<u64>;
    async fn delete_candidates(&self, user_id: &str) -> Result<u64>;
    /// Serializes full syncs per user; same conditional-update shape as
    /// `RecordStore::claim_source`.
    async fn claim_full_sync(&self, user_id: &str) -> Result<bool>;
    async fn release_full_sync(&self, user_id: &str) -> Result<()>;
    async fn link_applicant(
        &self,
        user_id: &str,
        external_id: &str,
        applicant_id: Uuid,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn create_applicant(&self, applicant: NewApplicant) -> Result<ApplicantEntry> {
        let mut tx = self.pool.begin().await?;
        let row = ApplicantMutator::new(&mut tx).create(applicant).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantEntry>> {
        let mut conn = self.pool.acquire().await?;
        ApplicantSelector::new(&mut conn).get_by_id(id).await
    }

    async fn list_applicants(&self, created_by: &str) -> Result<Vec<ApplicantEntry>> {
        let mut conn = self.pool.acquire().await?;
        ApplicantSelector::new(&mut conn).get_for_user(created_by).await
    }

    async fn claim_source(&self, id: Uuid, source: Source) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        ApplicantMutator::new(&mut conn).claim_source(id, source).await
    }

    async fn complete_source(
        &self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
        data: Option<SourceData>,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ApplicantMutator::new(&mut conn)
            .complete_source(id, source, status, data)
            .await
    }

    async fn set_source_status(
        &self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ApplicantMutator::new(&mut conn)
            .set_source_status(id, source, status)
            .await
    }

    async fn update_profile(&self, id: Uuid, profile: ProfileFields) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ApplicantMutator::new(&mut conn).update_profile(id, profile).await
    }
}

#[async_trait]
impl CandidateCache for PgStore {
    async fn list_candidates(&self, user_id: &str) -> Result<Vec<CandidateCacheEntry>> {
        let mut conn = self.pool.acquire().await?;
        CandidateSelector::new(&mut conn).get_for_user(user_id).await
    }

    async fn get_candidate(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Option<CandidateCacheEntry>> {
        let mut conn = self.pool.acquire().await?;
        CandidateSelector::new(&mut conn)
            .get_by_external_id(user_id, external_id)
            .await
    }

    async fn upsert_candidates(&self, user_id: &str, entries: Vec<NewCacheEntry>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let count = CandidateMutator::new(&mut tx).upsert(user_id, entries).await?;
        tx.commit().await?;
        Ok(count)
    }

    async fn delete_candidates(&self, user_id: &str) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        CandidateMutator::new(&mut conn).delete_for_user(user_id).await
    }

    async fn claim_full_sync(&self, user_id: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        CandidateMutator::new(&mut conn).claim_sync(user_id).await
    }

    async fn release_full_sync(&self, user_id: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        CandidateMutator::new(&mut conn).release_sync(user_id).await
    }

    async fn link_applicant(
        &self,
        user_id: &str,
        external_id: &str,
        applicant_id: Uuid,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        CandidateMutator::new(&mut conn)
            .link_applicant(user_id, external_id, applicant_id)
            .await
    }
}
