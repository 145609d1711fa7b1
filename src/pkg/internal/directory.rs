use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::conf::Settings;
use crate::pkg::internal::adaptors::candidates::spec::NewCacheEntry;
use crate::pkg::internal::store::CandidateCache;
use crate::prelude::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct CandidateQuery {
    pub limit: u32,
    pub cursor: Option<String>,
    pub include_archived: bool,
}

/// One candidate as the external directory reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryCandidate {
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub resume_handle: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePage {
    pub results: Vec<DirectoryCandidate>,
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub more_data_available: bool,
}

/// Cursor-paginated candidate directory. External collaborator.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_candidates(&self, query: &CandidateQuery) -> Result<CandidatePage>;
    /// Resolves a short-lived download link for a stored resume.
    async fn resume_url(&self, handle: &str) -> Result<String>;
}

pub struct HttpDirectoryClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpDirectoryClient {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: &str) -> Self {
        HttpDirectoryClient {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ResumeUrlResponse {
    url: String,
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn list_candidates(&self, query: &CandidateQuery) -> Result<CandidatePage> {
        let mut request = self
            .client
            .get(format!("{}/candidates", self.endpoint))
            .bearer_auth(&self.api_key)
            .query(&[("limit", query.limit.to_string())])
            .query(&[("include_archived", query.include_archived.to_string())]);
        if let Some(cursor) = &query.cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        let page = request
            .send()
            .await?
            .error_for_status()?
            .json::<CandidatePage>()
            .await?;
        Ok(page)
    }

    async fn resume_url(&self, handle: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/files/{}/url", self.endpoint, handle))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json::<ResumeUrlResponse>()
            .await?;
        Ok(response.url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// First page only, insert candidates the cache has never seen.
    #[default]
    Incremental,
    /// Paginate the whole directory and rebuild the user's mirror.
    Full,
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub page_limit: u32,
    pub full_sync_cap: u32,
    pub freshness: Duration,
}

impl From<&Settings> for SyncSettings {
    fn from(settings: &Settings) -> Self {
        SyncSettings {
            page_limit: settings.directory_page_limit,
            full_sync_cap: settings.directory_full_sync_cap,
            freshness: Duration::seconds(settings.cache_freshness_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub fetched: usize,
    pub inserted: u64,
    pub deleted: u64,
}

/// Mirrors the external directory into the local candidate cache.
pub struct DirectorySync {
    cache: Arc<dyn CandidateCache>,
    client: Arc<dyn DirectoryClient>,
    settings: SyncSettings,
}

impl DirectorySync {
    pub fn new(
        cache: Arc<dyn CandidateCache>,
        client: Arc<dyn DirectoryClient>,
        settings: SyncSettings,
    ) -> Self {
        DirectorySync {
            cache,
            client,
            settings,
        }
    }

    pub async fn sync(&self, user_id: &str, mode: SyncMode) -> Result<SyncReport> {
        match mode {
            SyncMode::Incremental => self.incremental(user_id).await,
            SyncMode::Full => {
                // one full rebuild per user at a time
                if !self.cache.claim_full_sync(user_id).await? {
                    return Err(Error::Conflict);
                }
                let result = self.full(user_id).await;
                // a failed release must not mask the sync outcome
                if let Err(err) = self.cache.release_full_sync(user_id).await {
                    tracing::error!(user = user_id, error = %err, "could not release sync claim");
                }
                result
            }
        }
    }

    /// Refreshes the cache when it is empty or any row has aged past the
    /// freshness window. Returns `None` when the mirror is already current.
    pub async fn ensure_fresh(&self, user_id: &str) -> Result<Option<SyncReport>> {
        let cached = self.cache.list_candidates(user_id).await?;
        let horizon = Utc::now() - self.settings.freshness;
        let stale = cached.is_empty() || cached.iter().any(|entry| entry.last_synced_at < horizon);
        if !stale {
            return Ok(None);
        }
        Ok(Some(self.sync(user_id, SyncMode::Incremental).await?))
    }

    async fn incremental(&self, user_id: &str) -> Result<SyncReport> {
        let page = self
            .client
            .list_candidates(&CandidateQuery {
                limit: self.settings.page_limit,
                cursor: None,
                include_archived: false,
            })
            .await?;
        let fetched = page.results.len();

        let known: Vec<String> = self
            .cache
            .list_candidates(user_id)
            .await?
            .into_iter()
            .map(|entry| entry.external_id)
            .collect();
        let fresh: Vec<DirectoryCandidate> = page
            .results
            .into_iter()
            .filter(|candidate| !known.contains(&candidate.external_id))
            .collect();

        let entries = self.resolve_entries(fresh).await;
        let inserted = self.cache.upsert_candidates(user_id, entries).await?;
        tracing::info!(user = user_id, fetched, inserted, "incremental directory sync");
        Ok(SyncReport {
            mode: SyncMode::Incremental,
            fetched,
            inserted,
            deleted: 0,
        })
    }

    async fn full(&self, user_id: &str) -> Result<SyncReport> {
        let cap = self.settings.full_sync_cap as usize;
        let mut candidates: Vec<DirectoryCandidate> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .client
                .list_candidates(&CandidateQuery {
                    limit: self.settings.page_limit,
                    cursor: cursor.clone(),
                    include_archived: false,
                })
                .await?;
            candidates.extend(page.results);
            if candidates.len() >= cap {
                if candidates.len() > cap || page.more_data_available {
                    tracing::warn!(user = user_id, cap, "directory sync hit the safety cap");
                }
                candidates.truncate(cap);
                break;
            }
            if !page.more_data_available {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                // directory claims more data but gave no cursor to follow
                None => break,
            }
        }
        let fetched = candidates.len();

        let entries = self.resolve_entries(candidates).await;
        let deleted = self.cache.delete_candidates(user_id).await?;
        let inserted = self.cache.upsert_candidates(user_id, entries).await?;
        tracing::info!(user = user_id, fetched, inserted, deleted, "full directory sync");
        Ok(SyncReport {
            mode: SyncMode::Full,
            fetched,
            inserted,
            deleted,
        })
    }

    /// A resume link that cannot be resolved stays unset; the import flow
    /// rejects such candidates instead of the sync failing outright.
    async fn resolve_entries(&self, candidates: Vec<DirectoryCandidate>) -> Vec<NewCacheEntry> {
        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let resume_url = match &candidate.resume_handle {
                Some(handle) => match self.client.resume_url(handle).await {
                    Ok(url) => Some(url),
                    Err(err) => {
                        tracing::warn!(
                            external_id = %candidate.external_id,
                            error = %err,
                            "could not resolve resume link"
                        );
                        None
                    }
                },
                None => None,
            };
            entries.push(NewCacheEntry {
                external_id: candidate.external_id,
                name: candidate.name,
                email: candidate.email,
                linkedin_url: candidate.linkedin_url,
                github_url: candidate.github_url,
                resume_handle: candidate.resume_handle,
                resume_url,
            });
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::pkg::internal::adaptors::candidates::spec::CandidateCacheEntry;
    use crate::pkg::internal::store::memory::MemoryStore;

    struct MockDirectory {
        candidates: Mutex<Vec<DirectoryCandidate>>,
        page_size: usize,
        failing_handles: HashSet<String>,
    }

    impl MockDirectory {
        fn with(count: usize, page_size: usize) -> Self {
            let candidates = (0..count).map(|n| candidate(n, true)).collect();
            MockDirectory {
                candidates: Mutex::new(candidates),
                page_size,
                failing_handles: HashSet::new(),
            }
        }

        fn push(&self, entry: DirectoryCandidate) {
            self.candidates.lock().unwrap().push(entry);
        }
    }

    fn candidate(n: usize, with_resume: bool) -> DirectoryCandidate {
        DirectoryCandidate {
            external_id: format!("ext-{}", n),
            name: format!("Candidate {}", n),
            email: Some(format!("c{}@example.com", n)),
            linkedin_url: None,
            github_url: None,
            resume_handle: with_resume.then(|| format!("handle-{}", n)),
        }
    }

    #[async_trait]
    impl DirectoryClient for MockDirectory {
        async fn list_candidates(&self, query: &CandidateQuery) -> Result<CandidatePage> {
            let candidates = self.candidates.lock().unwrap();
            let offset: usize = query
                .cursor
                .as_deref()
                .map(|c| c.parse().unwrap())
                .unwrap_or(0);
            let end = (offset + self.page_size).min(candidates.len());
            let more = end < candidates.len();
            Ok(CandidatePage {
                results: candidates[offset..end].to_vec(),
                next_cursor: more.then(|| end.to_string()),
                more_data_available: more,
            })
        }

        async fn resume_url(&self, handle: &str) -> Result<String> {
            if self.failing_handles.contains(handle) {
                return Err(Error::Processor("file service refused".into()));
            }
            Ok(format!("https://files.example.com/{}", handle))
        }
    }

    fn engine(
        store: Arc<MemoryStore>,
        directory: Arc<MockDirectory>,
        cap: u32,
    ) -> DirectorySync {
        DirectorySync::new(
            store as Arc<dyn CandidateCache>,
            directory as Arc<dyn DirectoryClient>,
            SyncSettings {
                page_limit: 3,
                full_sync_cap: cap,
                freshness: Duration::seconds(3600),
            },
        )
    }

    #[tokio::test]
    async fn full_sync_mirrors_the_whole_directory() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MockDirectory::with(7, 3));
        let sync = engine(store.clone(), directory, 100);

        let report = sync.sync("user-1", SyncMode::Full).await.unwrap();
        assert_eq!(report.fetched, 7);
        assert_eq!(report.inserted, 7);

        let before = store.list_candidates("user-1").await.unwrap();
        assert_eq!(before.len(), 7);
        assert!(before.iter().all(|entry| entry.resume_url.is_some()));

        // running it again rebuilds to the same mirror, field for field
        let report = sync.sync("user-1", SyncMode::Full).await.unwrap();
        assert_eq!(report.deleted, 7);
        let after = store.list_candidates("user-1").await.unwrap();
        assert_eq!(after.len(), before.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.external_id, a.external_id);
            assert_eq!(b.name, a.name);
            assert_eq!(b.email, a.email);
            assert_eq!(b.linkedin_url, a.linkedin_url);
            assert_eq!(b.github_url, a.github_url);
            assert_eq!(b.resume_handle, a.resume_handle);
            assert_eq!(b.resume_url, a.resume_url);
        }
    }

    #[tokio::test]
    async fn incremental_sync_inserts_only_unknown_candidates() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MockDirectory::with(2, 10));
        let sync = engine(store.clone(), directory.clone(), 100);

        sync.sync("user-1", SyncMode::Incremental).await.unwrap();
        assert_eq!(store.list_candidates("user-1").await.unwrap().len(), 2);

        directory.push(candidate(9, false));
        let report = sync.sync("user-1", SyncMode::Incremental).await.unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.inserted, 1);
        assert_eq!(store.list_candidates("user-1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unresolvable_resume_link_stays_unset() {
        let store = Arc::new(MemoryStore::new());
        let mut directory = MockDirectory::with(2, 10);
        directory.failing_handles.insert("handle-0".into());
        let sync = engine(store.clone(), Arc::new(directory), 100);

        sync.sync("user-1", SyncMode::Incremental).await.unwrap();

        let cached = store.list_candidates("user-1").await.unwrap();
        let broken = cached.iter().find(|e| e.external_id == "ext-0").unwrap();
        let intact = cached.iter().find(|e| e.external_id == "ext-1").unwrap();
        assert!(broken.resume_url.is_none());
        assert_eq!(
            intact.resume_url.as_deref(),
            Some("https://files.example.com/handle-1")
        );
    }

    #[tokio::test]
    async fn concurrent_full_sync_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MockDirectory::with(2, 10));
        let sync = engine(store.clone(), directory, 100);

        assert!(store.claim_full_sync("user-1").await.unwrap());
        let result = sync.sync("user-1", SyncMode::Full).await;
        assert!(matches!(result, Err(Error::Conflict)));

        store.release_full_sync("user-1").await.unwrap();
        sync.sync("user-1", SyncMode::Full).await.unwrap();
    }

    #[tokio::test]
    async fn full_sync_stops_at_the_safety_cap() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MockDirectory::with(20, 3));
        let sync = engine(store.clone(), directory, 5);

        let report = sync.sync("user-1", SyncMode::Full).await.unwrap();
        assert_eq!(report.fetched, 5);
        assert_eq!(store.list_candidates("user-1").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn full_sync_of_exactly_cap_candidates_is_complete() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MockDirectory::with(5, 3));
        let sync = engine(store.clone(), directory, 5);

        let report = sync.sync("user-1", SyncMode::Full).await.unwrap();

        assert_eq!(report.fetched, 5);
        assert_eq!(report.inserted, 5);
        assert_eq!(store.list_candidates("user-1").await.unwrap().len(), 5);
    }

    struct FailingRelease {
        inner: Arc<MemoryStore>,
    }

    #[async_trait]
    impl CandidateCache for FailingRelease {
        async fn list_candidates(&self, user_id: &str) -> Result<Vec<CandidateCacheEntry>> {
            self.inner.list_candidates(user_id).await
        }

        async fn get_candidate(
            &self,
            user_id: &str,
            external_id: &str,
        ) -> Result<Option<CandidateCacheEntry>> {
            self.inner.get_candidate(user_id, external_id).await
        }

        async fn upsert_candidates(
            &self,
            user_id: &str,
            entries: Vec<NewCacheEntry>,
        ) -> Result<u64> {
            self.inner.upsert_candidates(user_id, entries).await
        }

        async fn delete_candidates(&self, user_id: &str) -> Result<u64> {
            self.inner.delete_candidates(user_id).await
        }

        async fn claim_full_sync(&self, user_id: &str) -> Result<bool> {
            self.inner.claim_full_sync(user_id).await
        }

        async fn release_full_sync(&self, user_id: &str) -> Result<()> {
            self.inner.release_full_sync(user_id).await?;
            Err(Error::Processor("sync state write failed".into()))
        }

        async fn link_applicant(
            &self,
            user_id: &str,
            external_id: &str,
            applicant_id: uuid::Uuid,
        ) -> Result<()> {
            self.inner.link_applicant(user_id, external_id, applicant_id).await
        }
    }

    #[tokio::test]
    async fn release_failure_does_not_mask_the_sync_outcome() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MockDirectory::with(2, 10));
        let sync = DirectorySync::new(
            Arc::new(FailingRelease {
                inner: store.clone(),
            }),
            directory as Arc<dyn DirectoryClient>,
            SyncSettings {
                page_limit: 3,
                full_sync_cap: 100,
                freshness: Duration::seconds(3600),
            },
        );

        let report = sync.sync("user-1", SyncMode::Full).await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(store.list_candidates("user-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ensure_fresh_refreshes_empty_and_stale_caches_only() {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MockDirectory::with(2, 10));
        let sync = engine(store.clone(), directory, 100);

        // empty cache triggers a refresh
        assert!(sync.ensure_fresh("user-1").await.unwrap().is_some());
        // freshly synced cache does not
        assert!(sync.ensure_fresh("user-1").await.unwrap().is_none());
        // aged rows do again
        store.age_cache(Utc::now() - Duration::seconds(7200));
        assert!(sync.ensure_fresh("user-1").await.unwrap().is_some());
    }
}
