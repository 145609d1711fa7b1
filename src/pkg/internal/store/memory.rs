use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applicants::spec::{
    ApplicantEntry, NewApplicant, ProcessingStatus, ProfileFields, Source, SourceData,
    derive_overall_status,
};
use crate::pkg::internal::adaptors::candidates::spec::{CandidateCacheEntry, NewCacheEntry};
use crate::pkg::internal::store::{CandidateCache, RecordStore};
use crate::prelude::{Error, Result};

/// Test double for the Postgres store. The mutex gives the same atomicity
/// the conditional UPDATE gives in production, so the claim races behave
/// identically.
#[derive(Default)]
pub struct MemoryStore {
    applicants: Mutex<HashMap<Uuid, ApplicantEntry>>,
    candidates: Mutex<BTreeMap<(String, String), CandidateCacheEntry>>,
    syncing: Mutex<HashSet<String>>,
    next_cache_id: AtomicI32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdates every cached row, for freshness-window tests.
    pub fn age_cache(&self, last_synced_at: DateTime<Utc>) {
        let mut candidates = self.candidates.lock().unwrap();
        for entry in candidates.values_mut() {
            entry.last_synced_at = last_synced_at;
        }
    }

    fn recompute(entry: &mut ApplicantEntry) {
        entry.status = derive_overall_status(entry.cv_status, entry.ai_status);
        entry.updated_at = Utc::now();
    }

    fn set_status(entry: &mut ApplicantEntry, source: Source, status: ProcessingStatus) {
        match source {
            Source::Cv => entry.cv_status = status,
            Source::Linkedin => entry.li_status = status,
            Source::Github => entry.gh_status = status,
            Source::Analysis => entry.ai_status = status,
        }
    }

    fn set_data(entry: &mut ApplicantEntry, source: Source, data: Option<SourceData>) {
        let slot = match source {
            Source::Cv => &mut entry.cv_data,
            Source::Linkedin => &mut entry.li_data,
            Source::Github => &mut entry.gh_data,
            Source::Analysis => &mut entry.ai_data,
        };
        *slot = data.map(Json);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_applicant(&self, applicant: NewApplicant) -> Result<ApplicantEntry> {
        let now = Utc::now();
        let entry = ApplicantEntry {
            id: Uuid::new_v4(),
            created_by: applicant.created_by,
            name: None,
            email: None,
            role: None,
            priority: applicant.priority,
            cv_file_path: applicant.cv_file_path,
            linkedin_url: applicant.linkedin_url,
            github_url: applicant.github_url,
            cv_status: ProcessingStatus::Pending,
            li_status: ProcessingStatus::Pending,
            gh_status: ProcessingStatus::Pending,
            ai_status: ProcessingStatus::Pending,
            cv_data: None,
            li_data: None,
            gh_data: None,
            ai_data: None,
            status: derive_overall_status(ProcessingStatus::Pending, ProcessingStatus::Pending),
            created_at: now,
            updated_at: now,
        };
        self.applicants.lock().unwrap().insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantEntry>> {
        Ok(self.applicants.lock().unwrap().get(&id).cloned())
    }

    async fn list_applicants(&self, created_by: &str) -> Result<Vec<ApplicantEntry>> {
        Ok(self
            .applicants
            .lock()
            .unwrap()
            .values()
            .filter(|entry| entry.created_by == created_by)
            .cloned()
            .collect())
    }

    async fn claim_source(&self, id: Uuid, source: Source) -> Result<bool> {
        let mut applicants = self.applicants.lock().unwrap();
        let entry = applicants.get_mut(&id).ok_or(Error::NotFound)?;
        match entry.source_status(source) {
            ProcessingStatus::Processing | ProcessingStatus::Ready => Ok(false),
            _ => {
                Self::set_status(entry, source, ProcessingStatus::Processing);
                Self::recompute(entry);
                Ok(true)
            }
        }
    }

    async fn complete_source(
        &self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
        data: Option<SourceData>,
    ) -> Result<()> {
        let mut applicants = self.applicants.lock().unwrap();
        let entry = applicants.get_mut(&id).ok_or(Error::NotFound)?;
        Self::set_status(entry, source, status);
        Self::set_data(entry, source, data);
        Self::recompute(entry);
        Ok(())
    }

    async fn set_source_status(
        &self,
        id: Uuid,
        source: Source,
        status: ProcessingStatus,
    ) -> Result<()> {
        let mut applicants = self.applicants.lock().unwrap();
        let entry = applicants.get_mut(&id).ok_or(Error::NotFound)?;
        if entry.source_status(source) == ProcessingStatus::Pending {
            Self::set_status(entry, source, status);
            Self::recompute(entry);
        }
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, profile: ProfileFields) -> Result<()> {
        let mut applicants = self.applicants.lock().unwrap();
        let entry = applicants.get_mut(&id).ok_or(Error::NotFound)?;
        if entry.name.is_none() {
            entry.name = profile.name;
        }
        if entry.email.is_none() {
            entry.email = profile.email;
        }
        if entry.role.is_none() {
            entry.role = profile.role;
        }
        entry.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl CandidateCache for MemoryStore {
    async fn list_candidates(&self, user_id: &str) -> Result<Vec<CandidateCacheEntry>> {
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .values()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_candidate(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Option<CandidateCacheEntry>> {
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), external_id.to_string()))
            .cloned())
    }

    async fn upsert_candidates(&self, user_id: &str, entries: Vec<NewCacheEntry>) -> Result<u64> {
        let mut candidates = self.candidates.lock().unwrap();
        let count = entries.len() as u64;
        for new in entries {
            let key = (user_id.to_string(), new.external_id.clone());
            match candidates.get_mut(&key) {
                Some(existing) => {
                    existing.name = new.name;
                    existing.email = new.email;
                    existing.linkedin_url = new.linkedin_url;
                    existing.github_url = new.github_url;
                    existing.resume_handle = new.resume_handle;
                    existing.resume_url = new.resume_url;
                    existing.last_synced_at = Utc::now();
                }
                None => {
                    let now = Utc::now();
                    candidates.insert(
                        key,
                        CandidateCacheEntry {
                            id: self.next_cache_id.fetch_add(1, Ordering::SeqCst),
                            user_id: user_id.to_string(),
                            external_id: new.external_id,
                            name: new.name,
                            email: new.email,
                            linkedin_url: new.linkedin_url,
                            github_url: new.github_url,
                            resume_handle: new.resume_handle,
                            resume_url: new.resume_url,
                            applicant_id: None,
                            last_synced_at: now,
                            created_at: now,
                        },
                    );
                }
            }
        }
        Ok(count)
    }

    async fn delete_candidates(&self, user_id: &str) -> Result<u64> {
        let mut candidates = self.candidates.lock().unwrap();
        let before = candidates.len();
        candidates.retain(|(owner, _), _| owner != user_id);
        Ok((before - candidates.len()) as u64)
    }

    async fn claim_full_sync(&self, user_id: &str) -> Result<bool> {
        Ok(self.syncing.lock().unwrap().insert(user_id.to_string()))
    }

    async fn release_full_sync(&self, user_id: &str) -> Result<()> {
        self.syncing.lock().unwrap().remove(user_id);
        Ok(())
    }

    async fn link_applicant(
        &self,
        user_id: &str,
        external_id: &str,
        applicant_id: Uuid,
    ) -> Result<()> {
        let mut candidates = self.candidates.lock().unwrap();
        if let Some(entry) =
            candidates.get_mut(&(user_id.to_string(), external_id.to_string()))
        {
            entry.applicant_id = Some(applicant_id);
        }
        Ok(())
    }
}
